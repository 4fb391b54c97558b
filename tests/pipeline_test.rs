/// Scrape → diff → report → persist, driven through the public API against a
/// saved results page. No browser involved.
use std::time::Duration;

use taleo_watch::results::extract_jobs;
use taleo_watch::watch::record_run;
use taleo_watch::{SeenSet, WatchConfig};
use tempfile::TempDir;

const PAGE_URL: &str = "https://nato.taleo.net/careersection/2/moresearch.ftl";
const FIXTURE: &str = include_str!("fixtures/taleo_results.html");

fn config_in(dir: &TempDir) -> WatchConfig {
    WatchConfig {
        seen_file: dir.path().join("seen_jobs.json"),
        alert_file: dir.path().join("alert.md"),
        settle: Duration::ZERO,
        ..WatchConfig::default()
    }
}

#[test]
fn fixture_yields_unique_titled_jobs() {
    let jobs = extract_jobs(FIXTURE, PAGE_URL);
    let ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["250123", "250124", "250125"]);

    // Last anchor for 250123 wins, but keeps the first row's position.
    assert_eq!(jobs[0].title, "Senior Cyber Security Engineer (B-2)");
    assert_eq!(
        jobs[0].url,
        "https://nato.taleo.net/careersection/2/jobdetail.ftl?job=250123&lang=en"
    );
    assert_eq!(jobs[2].title, "Legal Adviser");
    assert_eq!(
        jobs[2].url,
        "https://nato.taleo.net/careersection/2/jobdetail.ftl?Job=250125&lang=en"
    );
}

#[test]
fn scraping_twice_is_stable() {
    let once = extract_jobs(FIXTURE, PAGE_URL);
    let twice = extract_jobs(FIXTURE, PAGE_URL);
    assert_eq!(once, twice);
}

#[test]
fn seen_set_grows_to_union_and_reports_only_the_difference() {
    let dir = TempDir::new().unwrap();
    let cfg = config_in(&dir);

    let prior: SeenSet = ["250124", "100000"].into_iter().collect();
    prior.save(&cfg.seen_file).unwrap();

    let jobs = extract_jobs(FIXTURE, PAGE_URL);
    let mut seen = SeenSet::load(&cfg.seen_file);
    let outcome = record_run(&cfg, &mut seen, jobs).unwrap();

    let new_ids: Vec<&str> = outcome.new_jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(new_ids, vec!["250123", "250125"]);

    let persisted = SeenSet::load(&cfg.seen_file);
    let all: Vec<&str> = persisted.iter().collect();
    assert_eq!(all, vec!["100000", "250123", "250124", "250125"]);

    let alert = std::fs::read_to_string(&cfg.alert_file).unwrap();
    assert!(alert.starts_with("## Yeni NATO Taleo ilanları (Posting Date: Today)\n\n"));
    assert!(alert.contains("Toplam: **2**"));
    assert!(alert.contains(
        "- [Legal Adviser](https://nato.taleo.net/careersection/2/jobdetail.ftl?Job=250125&lang=en) — `250125`"
    ));
    assert!(!alert.contains("Financial Analyst"));
}

#[test]
fn quiet_run_keeps_missing_alert_missing() {
    let dir = TempDir::new().unwrap();
    let cfg = config_in(&dir);

    let everything: SeenSet = ["250123", "250124", "250125"].into_iter().collect();
    let mut seen = everything.clone();
    let outcome = record_run(&cfg, &mut seen, extract_jobs(FIXTURE, PAGE_URL)).unwrap();

    assert!(outcome.new_jobs.is_empty());
    assert_eq!(seen, everything);
    assert!(!cfg.alert_file.exists());
    assert!(!cfg.seen_file.exists());
}
