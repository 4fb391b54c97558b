//! Best-effort "Posting Date: Today" filter on the Taleo advanced-search page.
//!
//! Each step lists alternative locators for the same control. Nothing here
//! can fail: a step whose locators all miss is skipped and the next one runs.

use std::time::Duration;
use tracing::info;

use super::locator::{try_interact, Interaction, Locator, PageDriver};

#[derive(Clone, Debug)]
pub struct FilterStep {
    pub name: &'static str,
    pub locators: Vec<Locator>,
    /// Per-locator timeout.
    pub wait: Duration,
    pub interaction: Interaction,
    /// Try every locator instead of stopping at the first hit.
    pub try_all: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    pub name: &'static str,
    /// Locators that matched, in the order they were tried.
    pub matched: Vec<Locator>,
}

impl StepOutcome {
    pub fn hit(&self) -> bool {
        !self.matched.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub steps: Vec<StepOutcome>,
}

impl FilterReport {
    pub fn step(&self, name: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// e.g. `consent=miss advanced_search=hit posting_date=hit today=hit submit=hit`
    pub fn summary(&self) -> String {
        self.steps
            .iter()
            .map(|s| format!("{}={}", s.name, if s.hit() { "hit" } else { "miss" }))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The five UI steps that narrow the result list to today's postings.
pub fn posting_date_today_steps() -> Vec<FilterStep> {
    vec![
        FilterStep {
            name: "consent",
            locators: vec![
                Locator::id("onetrust-accept-btn-handler"),
                Locator::css("button[aria-label*='Accept'], button[title*='Accept']"),
            ],
            wait: Duration::from_secs(2),
            interaction: Interaction::Click,
            try_all: true,
        },
        FilterStep {
            name: "advanced_search",
            locators: vec![
                Locator::xpath("//button[contains(.,'Advanced Search') or contains(.,'Refine') or contains(.,'Gelişmiş')]"),
                Locator::css("button[aria-controls*='advancedSearch']"),
            ],
            wait: Duration::from_secs(3),
            interaction: Interaction::Click,
            try_all: false,
        },
        FilterStep {
            name: "posting_date",
            locators: vec![
                Locator::xpath("//div[contains(@class,'facet')][.//span[contains(.,'Posting Date')]]//button"),
                Locator::xpath("//button[contains(.,'Posting Date')]"),
            ],
            wait: Duration::from_secs(3),
            interaction: Interaction::Click,
            try_all: false,
        },
        FilterStep {
            name: "today",
            locators: vec![
                Locator::xpath("//label[.//span[contains(translate(., 'TODAYBUGÜN', 'todaybugün'), 'today') or contains(translate(., 'TODAYBUGÜN', 'todaybugün'), 'bugün')]]//input"),
                Locator::xpath("//span[contains(.,'Today') or contains(.,'Bugün')]/ancestor::label//input"),
                Locator::xpath("//input[@type='checkbox' or @type='radio'][@value='TODAY' or @value='Today']"),
            ],
            wait: Duration::from_secs(6),
            interaction: Interaction::ScriptClick,
            try_all: false,
        },
        FilterStep {
            name: "submit",
            locators: vec![
                Locator::xpath("//button[contains(.,'Search') or contains(.,'Apply') or contains(.,'Ara')]"),
                Locator::css("button[type='submit']"),
            ],
            wait: Duration::from_secs(2),
            interaction: Interaction::Click,
            try_all: false,
        },
    ]
}

/// Run `steps` in order against `driver`.
pub async fn run_steps<D>(driver: &D, steps: &[FilterStep]) -> FilterReport
where
    D: PageDriver + ?Sized,
{
    let mut report = FilterReport::default();
    for step in steps {
        let mut matched = Vec::new();
        for locator in &step.locators {
            if try_interact(driver, locator, step.interaction, step.wait).await {
                info!("filter step {}: matched {}", step.name, locator);
                matched.push(locator.clone());
                if !step.try_all {
                    break;
                }
            }
        }
        if matched.is_empty() {
            info!("filter step {}: no locator matched, skipping", step.name);
        }
        report.steps.push(StepOutcome {
            name: step.name,
            matched,
        });
    }
    report
}

/// Apply the "today" filter, then wait `settle` for the result list to render.
///
/// No completion signal is awaited; `settle` is a fixed sleep.
pub async fn set_posting_date_today<D>(driver: &D, settle: Duration) -> FilterReport
where
    D: PageDriver + ?Sized,
{
    let report = run_steps(driver, &posting_date_today_steps()).await;
    info!("filter: {}", report.summary());
    tokio::time::sleep(settle).await;
    report
}
