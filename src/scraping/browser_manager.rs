//! Native browser management using `chromiumoxide`.
//!
//! This module owns:
//! * Finding a usable browser executable (`CHROME_PATH` / `CHROME_BIN` override,
//!   then PATH, then well-known install locations).
//! * Building the fixed headless launch config.
//! * `PageSession` and its Chromium implementation `BrowserSession`: one
//!   browser and one tab for the duration of a run, with an explicit `close()`.
//!
//! Drivers are not provisioned: a Chromium-family browser must already be
//! installed. Chromium is driven directly over CDP.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::locator::PageDriver;
use crate::core::config;

pub const WINDOW_WIDTH: u32 = 1400;
pub const WINDOW_HEIGHT: u32 = 1000;

// ── Browser executable discovery ─────────────────────────────────────────────

const PATH_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
    "brave-browser",
    "brave",
];

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `CHROME_PATH`, then `CHROME_BIN` (first non-empty wins, taken as-is)
/// 2. PATH scan
/// 3. OS-specific well-known install paths
pub fn find_chrome_executable() -> Option<String> {
    if let Some(p) = config::browser_override() {
        return Some(p);
    }

    for exe in PATH_CANDIDATES {
        if let Ok(path) = which::which(exe) {
            return Some(path.to_string_lossy().to_string());
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/local/bin/chromium",
            "/snap/bin/chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}

// ── Headless browser config builder ──────────────────────────────────────────

/// Build the fixed headless `BrowserConfig`.
///
/// `--no-sandbox` and `--disable-dev-shm-usage` keep Chromium alive in
/// containers and CI runners.
pub fn build_headless_config(exe: &str, page_load_timeout: Duration) -> Result<BrowserConfig> {
    BrowserConfig::builder()
        .chrome_executable(exe)
        .viewport(Viewport {
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
        .request_timeout(page_load_timeout)
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-gpu")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .build()
        .map_err(|e| anyhow!("Failed to build browser config: {}", e))
}

// ── Session ──────────────────────────────────────────────────────────────────

/// One browser tab for the duration of a check.
///
/// `close` must run on every exit path and never fails.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// The tab, for lookups and capture.
    fn driver(&self) -> &dyn PageDriver;

    /// Navigate the tab to `url`. Callers bound the wait.
    async fn open(&self, url: &str) -> Result<()>;

    /// Release the browser. Errors are logged, not returned.
    async fn close(&mut self);
}

/// A launched Chromium with a single working tab.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch `exe` headless and open a blank tab.
    ///
    /// Launch errors are fatal for the run and are returned as-is.
    pub async fn launch(exe: &str, page_load_timeout: Duration) -> Result<Self> {
        info!("🚀 Launching headless browser ({})", exe);
        let config = build_headless_config(exe, page_load_timeout)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow!("Failed to launch browser ({}): {}", exe, e))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("CDP handler error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(p) => p,
            Err(e) => {
                browser.close().await.ok();
                handler.abort();
                return Err(anyhow!("Failed to open tab: {}", e));
            }
        };

        Ok(Self {
            browser,
            page,
            handler,
        })
    }
}

#[async_trait]
impl PageSession for BrowserSession {
    fn driver(&self) -> &dyn PageDriver {
        &self.page
    }

    async fn open(&self, url: &str) -> Result<()> {
        info!("🌐 Navigating to: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| anyhow!("Failed to navigate to {}: {}", url, e))?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser close error (non-fatal): {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Browser wait error (non-fatal): {}", e);
        }
        self.handler.abort();
        info!("🛑 Browser session closed");
    }
}
