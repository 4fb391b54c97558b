use std::time::Duration;
use tracing::info;

use taleo_watch::core::config::load_watch_config;
use taleo_watch::watch;

fn parse_interval_from_args() -> Option<u64> {
    let mut args = std::env::args();
    while let Some(a) = args.next() {
        if a == "--interval" {
            if let Some(v) = args.next() {
                if let Ok(s) = v.parse::<u64>() {
                    return Some(s);
                }
            }
        } else if let Some(rest) = a.strip_prefix("--interval=") {
            if let Ok(s) = rest.parse::<u64>() {
                return Some(s);
            }
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,chromiumoxide=warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cfg = load_watch_config().resolve();

    // Handle setup-only mode
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--setup") {
        let report = taleo_watch::setup::check_all(&cfg);
        println!("{}", report);
        if report.has_failures() {
            std::process::exit(2);
        }
        return Ok(());
    }

    let interval = parse_interval_from_args()
        .filter(|&s| s > 0)
        .map(Duration::from_secs)
        .or(cfg.scan_interval);

    match interval {
        Some(every) => watch::run_forever(&cfg, every, shutdown_signal()).await,
        None => {
            info!("Checking {}", cfg.search_url);
            let outcome = watch::run_once(&cfg).await?;
            println!("{}", outcome.status_line());
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).ok();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = async {
                if let Some(ref mut s) = sigterm {
                    s.recv().await;
                } else {
                    futures::future::pending::<()>().await;
                }
            } => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
