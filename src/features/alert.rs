//! Markdown alert listing the postings that are new in this run.

use std::path::Path;
use tracing::info;

use super::seen_store::StoreError;
use crate::core::types::Job;

/// Render the alert document.
///
/// ```text
/// ## <heading>
///
/// Toplam: **<count>**
///
/// - [<title>](<url>) — `<id>`
/// ```
pub fn render_alert(heading: &str, jobs: &[Job]) -> String {
    let mut lines = vec![
        format!("## {}\n", heading),
        format!("Toplam: **{}**\n", jobs.len()),
    ];
    lines.extend(
        jobs.iter()
            .map(|j| format!("- [{}]({}) — `{}`", j.title, j.url, j.id)),
    );
    lines.join("\n") + "\n"
}

/// Overwrite `path` with the alert for `jobs`.
pub fn write_alert_md(path: &Path, heading: &str, jobs: &[Job]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::write(parent, e))?;
    }
    std::fs::write(path, render_alert(heading, jobs)).map_err(|e| StoreError::write(path, e))?;
    info!("alert: wrote {} jobs to {}", jobs.len(), path.display());
    Ok(())
}
