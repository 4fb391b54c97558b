use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// WatchFileConfig — file-based config loader (taleo-watch.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const DEFAULT_SEARCH_URL: &str = "https://nato.taleo.net/careersection/2/moresearch.ftl";
pub const DEFAULT_SEEN_FILE: &str = "seen_jobs.json";
pub const DEFAULT_ALERT_FILE: &str = "alert.md";
pub const DEFAULT_ALERT_HEADING: &str = "Yeni NATO Taleo ilanları (Posting Date: Today)";
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_SETTLE_SECS: u64 = 3;

pub const ENV_CONFIG_PATH: &str = "TALEO_WATCH_CONFIG";
pub const ENV_SEARCH_URL: &str = "TALEO_SEARCH_URL";
pub const ENV_SEEN_FILE: &str = "TALEO_SEEN_FILE";
pub const ENV_ALERT_FILE: &str = "TALEO_ALERT_FILE";
pub const ENV_ALERT_HEADING: &str = "TALEO_ALERT_HEADING";
pub const ENV_PAGE_LOAD_TIMEOUT_SECS: &str = "TALEO_PAGE_LOAD_TIMEOUT_SECS";
pub const ENV_SETTLE_SECS: &str = "TALEO_SETTLE_SECS";
pub const ENV_SCAN_INTERVAL_SECS: &str = "TALEO_SCAN_INTERVAL_SECS";

/// Browser override variables, checked in this order.
pub const ENV_CHROME_PATH: &str = "CHROME_PATH";
pub const ENV_CHROME_BIN: &str = "CHROME_BIN";

/// Mirrors the keys of `taleo-watch.json`. Every key is optional.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct WatchFileConfig {
    /// Advanced-search page loaded once per run.
    pub search_url: Option<String>,
    /// JSON array of ids already reported.
    pub seen_file: Option<String>,
    /// Markdown report, overwritten only when something new shows up.
    pub alert_file: Option<String>,
    pub alert_heading: Option<String>,
    pub page_load_timeout_secs: Option<u64>,
    /// Fixed sleep after the filter steps, before the page is captured.
    pub settle_secs: Option<u64>,
    /// When set, the binary keeps running and re-checks every N seconds.
    pub scan_interval_secs: Option<u64>,
}

/// Fully-resolved runtime settings.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    pub search_url: String,
    pub seen_file: PathBuf,
    pub alert_file: PathBuf,
    pub alert_heading: String,
    pub page_load_timeout: Duration,
    pub settle: Duration,
    pub scan_interval: Option<Duration>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchFileConfig::default().resolve_with(|_| None)
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl WatchFileConfig {
    /// Resolve every field: JSON field → env var → built-in default.
    pub fn resolve(&self) -> WatchConfig {
        self.resolve_with(|k| std::env::var(k).ok())
    }

    /// Same as [`resolve`](Self::resolve) with an injectable env lookup.
    pub fn resolve_with<F>(&self, env: F) -> WatchConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |field: &Option<String>, key: &str, default: &str| -> String {
            non_empty(field.clone())
                .or_else(|| non_empty(env(key)))
                .unwrap_or_else(|| default.to_string())
        };
        let number = |field: Option<u64>, key: &str| -> Option<u64> {
            field.or_else(|| non_empty(env(key)).and_then(|v| v.parse().ok()))
        };

        WatchConfig {
            search_url: string(&self.search_url, ENV_SEARCH_URL, DEFAULT_SEARCH_URL),
            seen_file: PathBuf::from(string(&self.seen_file, ENV_SEEN_FILE, DEFAULT_SEEN_FILE)),
            alert_file: PathBuf::from(string(
                &self.alert_file,
                ENV_ALERT_FILE,
                DEFAULT_ALERT_FILE,
            )),
            alert_heading: string(
                &self.alert_heading,
                ENV_ALERT_HEADING,
                DEFAULT_ALERT_HEADING,
            ),
            page_load_timeout: Duration::from_secs(
                number(self.page_load_timeout_secs, ENV_PAGE_LOAD_TIMEOUT_SECS)
                    .unwrap_or(DEFAULT_PAGE_LOAD_TIMEOUT_SECS),
            ),
            settle: Duration::from_secs(
                number(self.settle_secs, ENV_SETTLE_SECS).unwrap_or(DEFAULT_SETTLE_SECS),
            ),
            scan_interval: number(self.scan_interval_secs, ENV_SCAN_INTERVAL_SECS)
                .filter(|&s| s > 0)
                .map(Duration::from_secs),
        }
    }
}

/// Load `taleo-watch.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `TALEO_WATCH_CONFIG` env var path
/// 2. `./taleo-watch.json`
/// 3. `~/.taleo-watch/taleo-watch.json`
///
/// Missing file → `WatchFileConfig::default()` (silent, all env-var fallbacks apply).
/// Parse error → log a warning, return `WatchFileConfig::default()`.
pub fn load_watch_config() -> WatchFileConfig {
    let mut candidates = vec![PathBuf::from("taleo-watch.json")];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".taleo-watch").join("taleo-watch.json"));
    }
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        candidates.insert(0, PathBuf::from(env_path));
    }

    for path in &candidates {
        let Ok(contents) = std::fs::read_to_string(path) else {
            continue;
        };
        match serde_json::from_str::<WatchFileConfig>(&contents) {
            Ok(cfg) => {
                tracing::info!("taleo-watch.json loaded from {}", path.display());
                return cfg;
            }
            Err(e) => {
                tracing::warn!(
                    "taleo-watch.json parse error at {}: {} — using defaults",
                    path.display(),
                    e
                );
                return WatchFileConfig::default();
            }
        }
    }

    WatchFileConfig::default()
}

/// Browser executable override: `CHROME_PATH`, then `CHROME_BIN`.
///
/// The first variable holding a non-empty value wins. The path is not checked
/// here; a bad override surfaces as a launch failure.
pub fn browser_override() -> Option<String> {
    browser_override_with(|k| std::env::var(k).ok())
}

pub fn browser_override_with<F>(env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    [ENV_CHROME_PATH, ENV_CHROME_BIN]
        .into_iter()
        .find_map(|k| non_empty(env(k)))
}
