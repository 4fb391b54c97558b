//! Pre-flight checklist (`taleo-watch --setup`).

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::WatchConfig;
use crate::scraping::browser_manager;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skip,
}

impl CheckStatus {
    pub fn is_fail(self) -> bool {
        matches!(self, CheckStatus::Fail)
    }

    fn label(self) -> &'static str {
        match self {
            CheckStatus::Pass => "OK",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skip => "SKIP",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetupCheck {
    pub id: String,
    pub title: String,
    pub status: CheckStatus,
    pub details: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
}

impl SetupCheck {
    fn new(id: &str, title: &str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            status,
            details: details.into(),
            actions: vec![],
        }
    }

    fn with_actions(mut self, actions: &[&str]) -> Self {
        self.actions = actions.iter().map(|a| a.to_string()).collect();
        self
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SetupReport {
    pub checks: Vec<SetupCheck>,
}

impl SetupReport {
    pub fn has_failures(&self) -> bool {
        self.checks.iter().any(|c| c.status.is_fail())
    }

    pub fn check(&self, id: &str) -> Option<&SetupCheck> {
        self.checks.iter().find(|c| c.id == id)
    }
}

impl fmt::Display for SetupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "taleo-watch Pre-flight Checklist")?;
        writeln!(f, "{}", "=".repeat(32))?;
        for c in &self.checks {
            writeln!(
                f,
                "[{:<4}] {}\n  {}",
                c.status.label(),
                c.title,
                c.details.replace('\n', "\n  ")
            )?;
            for action in &c.actions {
                writeln!(f, "    - {}", action)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub fn check_all(cfg: &WatchConfig) -> SetupReport {
    let report = SetupReport {
        checks: vec![
            check_browser(browser_manager::find_chrome_executable()),
            check_state_files(cfg),
            check_seen_file(&cfg.seen_file),
        ],
    };
    for c in report.checks.iter().filter(|c| c.status.is_fail()) {
        warn!("setup: {} failed: {}", c.id, c.details);
    }
    report
}

fn check_browser(found: Option<String>) -> SetupCheck {
    const TITLE: &str = "Browser (Chrome/Chromium)";
    match found {
        Some(exe) => SetupCheck::new("browser", TITLE, CheckStatus::Pass, format!("Using {}", exe)),
        None => SetupCheck::new(
            "browser",
            TITLE,
            CheckStatus::Fail,
            "No Chrome/Chromium executable found on PATH or in common install locations.",
        )
        .with_actions(&[
            "Ubuntu/Debian: `sudo apt-get install -y chromium`",
            "Fedora: `sudo dnf install -y chromium`",
            "macOS / Windows: install Google Chrome from https://www.google.com/chrome/",
            "Or point CHROME_PATH (or CHROME_BIN) at an installed binary.",
        ]),
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn check_state_files(cfg: &WatchConfig) -> SetupCheck {
    const TITLE: &str = "State files writable";
    let mut problems = Vec::new();
    let mut dirs: Vec<&Path> = vec![parent_dir(&cfg.seen_file), parent_dir(&cfg.alert_file)];
    dirs.dedup();

    for dir in dirs {
        if !dir.is_dir() {
            problems.push(format!("{}: directory does not exist", dir.display()));
            continue;
        }
        let probe = dir.join(".taleo-watch-write-test");
        match std::fs::write(&probe, b"ok") {
            Ok(()) => {
                let _ = std::fs::remove_file(&probe);
            }
            Err(e) => problems.push(format!("{}: {}", dir.display(), e)),
        }
    }

    if problems.is_empty() {
        SetupCheck::new(
            "state_files",
            TITLE,
            CheckStatus::Pass,
            format!(
                "seen-set: {}\nalert: {}",
                cfg.seen_file.display(),
                cfg.alert_file.display()
            ),
        )
    } else {
        SetupCheck::new("state_files", TITLE, CheckStatus::Fail, problems.join("\n"))
            .with_actions(&[
                "Create the directory or fix its permissions.",
                "Or point TALEO_SEEN_FILE / TALEO_ALERT_FILE somewhere writable.",
            ])
    }
}

fn check_seen_file(path: &Path) -> SetupCheck {
    const TITLE: &str = "Seen-set";
    let Ok(content) = std::fs::read_to_string(path) else {
        return SetupCheck::new(
            "seen_file",
            TITLE,
            CheckStatus::Skip,
            format!("{} does not exist yet; the first run starts empty.", path.display()),
        );
    };
    match serde_json::from_str::<Vec<String>>(&content) {
        Ok(ids) => SetupCheck::new(
            "seen_file",
            TITLE,
            CheckStatus::Pass,
            format!("{} ids in {}", ids.len(), path.display()),
        ),
        Err(e) => SetupCheck::new(
            "seen_file",
            TITLE,
            CheckStatus::Warn,
            format!(
                "{} is not a JSON array of strings ({}); it will be treated as empty and rewritten.",
                path.display(),
                e
            ),
        ),
    }
}
