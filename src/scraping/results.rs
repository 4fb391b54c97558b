//! Job anchors → `Job` records.

use anyhow::Result;
use scraper::{Html, Selector};
use std::collections::HashMap;
use tracing::{debug, info};
use url::Url;

use super::locator::PageDriver;
use crate::core::types::Job;

/// Path segment every job-detail link carries.
pub const JOB_DETAIL_MARKER: &str = "jobdetail.ftl";

/// Query keys holding the job id, checked in this order.
pub const JOB_ID_KEYS: [&str; 2] = ["job=", "Job="];

/// `true` for links to a job-detail page that carry a job id parameter.
pub fn is_job_link(href: &str) -> bool {
    href.contains(JOB_DETAIL_MARKER) && JOB_ID_KEYS.iter().any(|k| href.contains(k))
}

/// Stable identifier for a job URL.
///
/// Text after the first `job=` (or `Job=`) up to the next `&`; when that is
/// missing or empty, the text after the last `/`.
pub fn job_id_from_url(url: &str) -> String {
    let from_query = JOB_ID_KEYS
        .iter()
        .find_map(|key| url.split_once(key))
        .map(|(_, rest)| rest.split('&').next().unwrap_or_default());

    match from_query {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => url.rsplit('/').next().unwrap_or_default().to_string(),
    }
}

/// Collapse runs of whitespace the way rendered anchor text reads.
fn anchor_title<'a>(text: impl Iterator<Item = &'a str>) -> String {
    let joined: String = text.collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `true` when relative links can be resolved against `url`
/// (rules out `about:blank`, `data:` and unparsable values).
fn usable_base(url: &str) -> bool {
    Url::parse(url).is_ok_and(|u| !u.cannot_be_a_base())
}

fn absolutize(href: &str, base: Option<&Url>) -> String {
    match base.and_then(|b| b.join(href).ok()) {
        Some(u) => u.to_string(),
        None => href.to_string(),
    }
}

/// Keep one job per id: the last one seen wins, at the position where the id
/// first appeared.
pub fn dedupe_by_id(jobs: Vec<Job>) -> Vec<Job> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Job> = Vec::with_capacity(jobs.len());
    for job in jobs {
        match index.get(&job.id) {
            Some(&i) => unique[i] = job,
            None => {
                index.insert(job.id.clone(), unique.len());
                unique.push(job);
            }
        }
    }
    unique
}

/// Extract unique jobs from a results page.
///
/// Anchors are matched on their `href` attribute as written; only the
/// reported URL is resolved against `page_url`. Anchors with no visible
/// text are dropped.
pub fn extract_jobs(html: &str, page_url: &str) -> Vec<Job> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut jobs = Vec::new();
    for element in document.select(&selector) {
        let Some(raw_href) = element.value().attr("href") else {
            continue;
        };
        let raw_href = raw_href.trim();
        if !is_job_link(raw_href) {
            continue;
        }
        let href = absolutize(raw_href, base.as_ref());
        let title = anchor_title(element.text());
        if title.is_empty() {
            debug!("skipping untitled job link {}", href);
            continue;
        }
        jobs.push(Job {
            id: job_id_from_url(&href),
            title,
            url: href,
        });
    }

    dedupe_by_id(jobs)
}

/// Capture the current page and extract its jobs.
///
/// Links resolve against the live page URL, or `fallback_url` when the
/// browser reports none or one that cannot serve as a base.
pub async fn scrape_results<D>(driver: &D, fallback_url: &str) -> Result<Vec<Job>>
where
    D: PageDriver + ?Sized,
{
    let page_url = driver
        .current_url()
        .await
        .ok()
        .flatten()
        .filter(|u| usable_base(u))
        .unwrap_or_else(|| fallback_url.to_string());
    let html = driver.html().await?;
    let jobs = extract_jobs(&html, &page_url);
    info!(
        "scrape: {} unique job links ({} chars of HTML)",
        jobs.len(),
        html.len()
    );
    Ok(jobs)
}
