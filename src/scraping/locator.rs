//! Element lookup and interaction over a live page.
//!
//! Lookups run as small JS snippets evaluated in the page (CSS via
//! `querySelector`, XPath via `document.evaluate`) and are polled from Rust
//! until they succeed or the caller's timeout elapses. Every failure mode
//! (script error, stale node, timeout, nothing matched) collapses to "miss".

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Delay between two lookup attempts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// The minimal page surface the navigator and scraper need.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Evaluate a JS expression that yields a boolean.
    async fn eval_bool(&self, script: &str) -> Result<bool>;

    /// Serialized DOM of the current document.
    async fn html(&self) -> Result<String>;

    /// URL of the current document, if the browser reports one.
    async fn current_url(&self) -> Result<Option<String>>;
}

#[async_trait]
impl PageDriver for chromiumoxide::Page {
    async fn eval_bool(&self, script: &str) -> Result<bool> {
        let result = self
            .evaluate(script)
            .await
            .map_err(|e| anyhow!("evaluate failed: {}", e))?;
        result
            .into_value::<bool>()
            .map_err(|e| anyhow!("non-boolean script result: {}", e))
    }

    async fn html(&self) -> Result<String> {
        self.content()
            .await
            .map_err(|e| anyhow!("Failed to get page content: {}", e))
    }

    async fn current_url(&self) -> Result<Option<String>> {
        self.url()
            .await
            .map_err(|e| anyhow!("Failed to read page url: {}", e))
    }
}

/// One element-matching strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(String),
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn id(s: &str) -> Self {
        Locator::Id(s.to_string())
    }

    pub fn css(s: &str) -> Self {
        Locator::Css(s.to_string())
    }

    pub fn xpath(s: &str) -> Self {
        Locator::XPath(s.to_string())
    }

    pub fn selector(&self) -> &str {
        match self {
            Locator::Id(s) | Locator::Css(s) | Locator::XPath(s) => s,
        }
    }

    /// JS expression resolving to the first matching element, or `null`.
    pub fn lookup_js(&self) -> String {
        // A JSON string literal is a valid JS string literal.
        let lit = serde_json::Value::from(self.selector()).to_string();
        match self {
            Locator::Id(_) => format!("document.getElementById({lit})"),
            Locator::Css(_) => format!("document.querySelector({lit})"),
            Locator::XPath(_) => format!(
                "document.evaluate({lit}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(s) => write!(f, "id={}", s),
            Locator::Css(s) => write!(f, "css={}", s),
            Locator::XPath(s) => write!(f, "xpath={}", s),
        }
    }
}

/// What has to hold before the element is clicked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interaction {
    /// Element is rendered and enabled; clicked once it is.
    Click,
    /// Element merely exists in the DOM; clicked from script. Works for
    /// visually hidden checkbox/radio inputs behind styled labels.
    ScriptClick,
}

/// One-shot check-and-click script. Yields `true` only when the click happened.
pub fn interaction_script(locator: &Locator, interaction: Interaction) -> String {
    let guard = match interaction {
        Interaction::Click => {
            "if (el.disabled || el.getClientRects().length === 0 \
             || getComputedStyle(el).visibility === 'hidden') return false;"
        }
        Interaction::ScriptClick => "",
    };
    format!(
        "(() => {{ const el = {lookup}; if (!el) return false; {guard} el.click(); return true; }})()",
        lookup = locator.lookup_js(),
        guard = guard
    )
}

/// Poll `locator` until the interaction succeeds or `wait` elapses.
///
/// Never fails: returns `false` on timeout and on any driver error.
pub async fn try_interact<D>(
    driver: &D,
    locator: &Locator,
    interaction: Interaction,
    wait: Duration,
) -> bool
where
    D: PageDriver + ?Sized,
{
    let script = interaction_script(locator, interaction);
    let deadline = Instant::now() + wait;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining.max(POLL_INTERVAL), driver.eval_bool(&script)).await
        {
            Ok(Ok(true)) => return true,
            Ok(Ok(false)) => {}
            Ok(Err(e)) => debug!("lookup {} failed: {}", locator, e),
            Err(_) => debug!("lookup {} hung past its deadline", locator),
        }

        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
    }
}

/// Click `locator` once it is clickable. See [`try_interact`].
pub async fn click_if_present<D>(driver: &D, locator: &Locator, wait: Duration) -> bool
where
    D: PageDriver + ?Sized,
{
    try_interact(driver, locator, Interaction::Click, wait).await
}


#[cfg(test)]
mod tests {
    use super::testing::{Behavior, FakePage};
    use super::*;

    #[test]
    fn lookup_js_quotes_selectors_safely() {
        let xp = Locator::xpath("//button[contains(.,'Search')]");
        assert_eq!(
            xp.lookup_js(),
            "document.evaluate(\"//button[contains(.,'Search')]\", document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
        );

        let css = Locator::css(r#"a[title="x"]"#);
        assert_eq!(css.lookup_js(), r#"document.querySelector("a[title=\"x\"]")"#);

        let id = Locator::id("onetrust-accept-btn-handler");
        assert_eq!(
            id.lookup_js(),
            "document.getElementById(\"onetrust-accept-btn-handler\")"
        );
    }

    #[test]
    fn click_script_guards_on_visibility_but_script_click_does_not() {
        let loc = Locator::css("button");
        let click = interaction_script(&loc, Interaction::Click);
        let script = interaction_script(&loc, Interaction::ScriptClick);
        assert!(click.contains("getClientRects"));
        assert!(!script.contains("getClientRects"));
        assert!(click.contains("getComputedStyle(el).visibility === 'hidden'"));
        assert!(!script.contains("getComputedStyle"));
        assert!(script.contains("el.click()"));
    }

    #[tokio::test(start_paused = true)]
    async fn interaction_succeeds_once_element_appears() {
        let page = FakePage::new().on("late-button", Behavior::HitAfter(3));
        let hit = click_if_present(&page, &Locator::id("late-button"), Duration::from_secs(4)).await;
        assert!(hit);
        assert_eq!(page.polls_matching("late-button"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn interaction_times_out_as_a_miss() {
        let page = FakePage::new();
        let started = Instant::now();
        let hit = click_if_present(&page, &Locator::css(".never"), Duration::from_secs(2)).await;
        assert!(!hit);
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(page.clicked().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn driver_errors_are_swallowed() {
        let page = FakePage::new().on("stale", Behavior::Fail);
        let hit = try_interact(
            &page,
            &Locator::css(".stale"),
            Interaction::ScriptClick,
            Duration::from_secs(1),
        )
        .await;
        assert!(!hit);
        assert!(page.polls_matching("stale") >= 2);
    }
}
