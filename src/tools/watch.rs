//! One check of the career section, and the periodic loop around it.
//!
//! A check is strictly sequential: launch → navigate → filter → scrape →
//! diff → report → close. The browser is closed on every exit path.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::core::types::{Job, RunOutcome};
use crate::core::WatchConfig;
use crate::features::alert;
use crate::features::SeenSet;
use crate::scraping::browser_manager::{self, BrowserSession, PageSession};
use crate::scraping::{filter_nav, results, PageDriver};

/// Diff `jobs` against `seen`; on news, write the alert and persist the grown set.
///
/// With nothing new neither file is touched.
pub fn record_run(cfg: &WatchConfig, seen: &mut SeenSet, jobs: Vec<Job>) -> Result<RunOutcome> {
    let new_jobs = seen.unseen(&jobs);
    let mut alert_written = false;

    if !new_jobs.is_empty() {
        alert::write_alert_md(&cfg.alert_file, &cfg.alert_heading, &new_jobs)
            .context("writing alert report")?;
        alert_written = true;
        seen.merge(&new_jobs);
        seen.save(&cfg.seen_file).context("persisting seen-set")?;
    }

    Ok(RunOutcome {
        scraped: jobs.len(),
        new_jobs,
        alert_written,
        checked_at: Utc::now(),
    })
}

/// Filter the already-loaded search page to today's postings and scrape them.
pub async fn filter_and_scrape<D>(driver: &D, cfg: &WatchConfig) -> Result<Vec<Job>>
where
    D: PageDriver + ?Sized,
{
    filter_nav::set_posting_date_today(driver, cfg.settle).await;
    results::scrape_results(driver, &cfg.search_url).await
}

/// Everything after navigation: filter, scrape, diff, report.
pub async fn process_page<D>(driver: &D, cfg: &WatchConfig, seen: &mut SeenSet) -> Result<RunOutcome>
where
    D: PageDriver + ?Sized,
{
    let jobs = filter_and_scrape(driver, cfg).await?;
    record_run(cfg, seen, jobs)
}

/// Navigate `session` to the search page and process it, then close it.
///
/// Navigation is bounded by `cfg.page_load_timeout`. The session is closed
/// exactly once whether the check succeeds or fails.
pub async fn check_session<S>(
    session: &mut S,
    cfg: &WatchConfig,
    seen: &mut SeenSet,
) -> Result<RunOutcome>
where
    S: PageSession + ?Sized,
{
    let outcome: Result<RunOutcome> = async {
        match tokio::time::timeout(cfg.page_load_timeout, session.open(&cfg.search_url)).await {
            Ok(opened) => opened?,
            Err(_) => bail!(
                "Page load timed out after {}s: {}",
                cfg.page_load_timeout.as_secs(),
                cfg.search_url
            ),
        }
        process_page(session.driver(), cfg, seen).await
    }
    .await;

    session.close().await;
    outcome
}

/// Run a single check end to end.
///
/// Browser discovery, launch and navigation failures are returned; the
/// browser is released before any error propagates.
pub async fn run_once(cfg: &WatchConfig) -> Result<RunOutcome> {
    let mut seen = SeenSet::load(&cfg.seen_file);

    let exe = browser_manager::find_chrome_executable().ok_or_else(|| {
        anyhow!("No browser found. Install Chrome or Chromium, or set CHROME_PATH / CHROME_BIN.")
    })?;
    let mut session = BrowserSession::launch(&exe, cfg.page_load_timeout).await?;

    let outcome = check_session(&mut session, cfg, &mut seen).await?;
    info!(
        "check finished: {} scraped, {} new",
        outcome.scraped,
        outcome.new_jobs.len()
    );
    Ok(outcome)
}

/// Check immediately, then every `interval`, until `shutdown` resolves.
///
/// A failed check is logged and the loop keeps going. A check in progress is
/// never interrupted, so its browser is always closed.
pub async fn run_forever<F>(cfg: &WatchConfig, interval: Duration, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    info!("watch mode: checking every {}s", interval.as_secs());
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("watch mode: shutdown requested");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        match run_once(cfg).await {
            Ok(outcome) => println!("{}", outcome.status_line()),
            Err(e) => error!("check failed: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::locator::testing::{Behavior, FakePage};
    use async_trait::async_trait;
    use tempfile::TempDir;

    enum Navigation {
        Loads,
        Fails,
        Hangs,
    }

    struct FakeSession {
        page: FakePage,
        navigation: Navigation,
        closed: usize,
    }

    impl FakeSession {
        fn new(page: FakePage, navigation: Navigation) -> Self {
            Self {
                page,
                navigation,
                closed: 0,
            }
        }
    }

    #[async_trait]
    impl PageSession for FakeSession {
        fn driver(&self) -> &dyn PageDriver {
            &self.page
        }

        async fn open(&self, url: &str) -> Result<()> {
            match self.navigation {
                Navigation::Loads => Ok(()),
                Navigation::Fails => Err(anyhow!(
                    "Failed to navigate to {}: net::ERR_NAME_NOT_RESOLVED",
                    url
                )),
                Navigation::Hangs => futures::future::pending().await,
            }
        }

        async fn close(&mut self) {
            self.closed += 1;
        }
    }

    fn config_in(dir: &TempDir) -> WatchConfig {
        WatchConfig {
            seen_file: dir.path().join("seen_jobs.json"),
            alert_file: dir.path().join("alert.md"),
            settle: Duration::ZERO,
            ..WatchConfig::default()
        }
    }

    fn results_page() -> FakePage {
        let mut page = FakePage::new()
            .on("@value='TODAY'", Behavior::Hit)
            .on("button[type='submit']", Behavior::Hit);
        page.html = r#"
            <ul>
              <li><a href="jobdetail.ftl?job=250101&lang=en">Senior Engineer</a></li>
              <li><a href="jobdetail.ftl?job=250102&lang=en">Budget Analyst</a></li>
            </ul>
        "#
        .to_string();
        page
    }

    #[test]
    fn nothing_new_leaves_files_alone() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        std::fs::write(&cfg.alert_file, "previous run").unwrap();

        let mut seen: SeenSet = ["1"].into_iter().collect();
        let outcome = record_run(&cfg, &mut seen, vec![Job::new("1", "Old", "u/1")]).unwrap();

        assert!(outcome.new_jobs.is_empty());
        assert!(!outcome.alert_written);
        assert_eq!(std::fs::read_to_string(&cfg.alert_file).unwrap(), "previous run");
        assert!(!cfg.seen_file.exists());
    }

    #[test]
    fn new_jobs_are_reported_and_persisted() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);

        let mut seen: SeenSet = ["1"].into_iter().collect();
        let jobs = vec![
            Job::new("2", "Engineer", "http://x/2"),
            Job::new("1", "Old", "http://x/1"),
        ];
        let outcome = record_run(&cfg, &mut seen, jobs).unwrap();

        assert_eq!(outcome.scraped, 2);
        assert_eq!(outcome.new_jobs, vec![Job::new("2", "Engineer", "http://x/2")]);
        let alert = std::fs::read_to_string(&cfg.alert_file).unwrap();
        assert!(alert.contains("- [Engineer](http://x/2) — `2`"));
        assert!(!alert.contains("Old"));

        let reloaded = SeenSet::load(&cfg.seen_file);
        assert_eq!(reloaded.iter().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_pass_over_same_page_reports_nothing() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        let page = results_page();

        let mut seen = SeenSet::load(&cfg.seen_file);
        let first = process_page(&page, &cfg, &mut seen).await.unwrap();
        assert_eq!(first.new_jobs.len(), 2);
        assert_eq!(first.status_line(), "Yeni 2 ilan bulundu. alert.md üretildi.");
        let alert_after_first = std::fs::read_to_string(&cfg.alert_file).unwrap();

        let mut seen = SeenSet::load(&cfg.seen_file);
        let second = process_page(&page, &cfg, &mut seen).await.unwrap();
        assert!(second.new_jobs.is_empty());
        assert_eq!(second.status_line(), "Yeni ilan yok.");
        assert_eq!(
            std::fs::read_to_string(&cfg.alert_file).unwrap(),
            alert_after_first
        );
    }

    #[tokio::test(start_paused = true)]
    async fn watch_loop_stops_on_shutdown() {
        let cfg = WatchConfig::default();
        // Shutdown wins over the immediate first tick, so no browser is launched.
        let res = tokio::time::timeout(
            Duration::from_secs(1),
            run_forever(&cfg, Duration::from_secs(3600), async {}),
        )
        .await;
        assert!(res.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn session_closed_after_a_successful_check() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        let mut session = FakeSession::new(results_page(), Navigation::Loads);

        let mut seen = SeenSet::new();
        let outcome = check_session(&mut session, &cfg, &mut seen).await.unwrap();
        assert_eq!(outcome.new_jobs.len(), 2);
        assert_eq!(session.closed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_navigation_closes_session_and_propagates() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        let mut session = FakeSession::new(results_page(), Navigation::Fails);

        let err = check_session(&mut session, &cfg, &mut SeenSet::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"));
        assert_eq!(session.closed, 1);
        assert!(!cfg.alert_file.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_navigation_is_cut_off_at_the_page_load_timeout() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        let mut session = FakeSession::new(results_page(), Navigation::Hangs);

        let started = tokio::time::Instant::now();
        let err = check_session(&mut session, &cfg, &mut SeenSet::new())
            .await
            .unwrap_err();
        assert!(started.elapsed() >= cfg.page_load_timeout);
        assert!(started.elapsed() < cfg.page_load_timeout + Duration::from_secs(1));
        assert!(err.to_string().contains("timed out after 90s"));
        assert_eq!(session.closed, 1);
        // The filter never ran against the unloaded page.
        assert_eq!(session.page.polls_matching(""), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_capture_closes_session_and_propagates() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        let mut page = results_page();
        page.html_fails = true;
        let mut session = FakeSession::new(page, Navigation::Loads);

        let err = check_session(&mut session, &cfg, &mut SeenSet::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("target crashed"));
        assert_eq!(session.closed, 1);
        assert!(!cfg.seen_file.exists());
    }
}
