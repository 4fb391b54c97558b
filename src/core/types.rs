use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single posting scraped from the results page.
///
/// Transient: only `id` outlives the run (it enters the seen-set).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub url: String,
}

impl Job {
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Summary of one check.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunOutcome {
    /// Unique postings found on the page (after dedup).
    pub scraped: usize,
    /// Postings not present in the seen-set before this run, in page order.
    pub new_jobs: Vec<Job>,
    /// `true` when the alert file was (over)written during this run.
    pub alert_written: bool,
    pub checked_at: DateTime<Utc>,
}

impl RunOutcome {
    /// Human-readable status line printed after each run.
    pub fn status_line(&self) -> String {
        if self.new_jobs.is_empty() {
            "Yeni ilan yok.".to_string()
        } else {
            format!(
                "Yeni {} ilan bulundu. alert.md üretildi.",
                self.new_jobs.len()
            )
        }
    }
}
