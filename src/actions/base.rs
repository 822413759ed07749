use crate::core::config::TimeoutConfig;
use crate::core::driver::WebElement;
use crate::errors::{BrowserError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::warn;

/// How long a chained action keeps polling before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Slowness {
    #[default]
    Regular,
    Slow,
    AgonizinglySlow,
}

impl Slowness {
    pub fn timeout(&self, timeouts: &TimeoutConfig) -> Duration {
        let ms = match self {
            Slowness::Regular => timeouts.regular_ms,
            Slowness::Slow => timeouts.slow_ms,
            Slowness::AgonizinglySlow => timeouts.agonizingly_slow_ms,
        };
        Duration::from_millis(ms)
    }

    /// Description prefix, empty for the regular tier.
    pub fn prefix(&self) -> &'static str {
        match self {
            Slowness::Regular => "",
            Slowness::Slow => "slow.",
            Slowness::AgonizinglySlow => "agonizinglySlow.",
        }
    }
}

/// Where a candidate must sit relative to an anchor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Position {
    /// Below the anchor and sharing some of its horizontal span.
    Under,
    Below,
    Inside,
    RightOf,
    LeftOf,
    /// The chain's terminal locator, unconstrained.
    Global,
}

impl Position {
    pub fn name(&self) -> &'static str {
        match self {
            Position::Under => "under",
            Position::Below => "below",
            Position::Inside => "inside",
            Position::RightOf => "rightOf",
            Position::LeftOf => "leftOf",
            Position::Global => "global",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static INTERCEPTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Other element would receive the click").unwrap());
static MASKED_INPUT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"mat-input-element").unwrap());

/// True when a click failed because a masked `<input>` sits on top of the
/// target, the one interception we work around.
pub fn is_masked_input_interception(err: &BrowserError) -> bool {
    let message = err.to_string();
    INTERCEPTED.is_match(&message) && MASKED_INPUT.is_match(&message)
}

/// Clicks `element`. A click swallowed by a masked input is replayed once as
/// a pointer move plus raw click at the element's position.
pub async fn click_with_recovery(element: &WebElement) -> Result<()> {
    match element.click().await {
        Ok(()) => Ok(()),
        Err(err) if is_masked_input_interception(&err) => {
            warn!(element = %element.reference(), "Input element is blocking the click, retrying at its coordinates");
            let driver = element.driver();
            driver.pointer_click(element.reference()).await
        }
        Err(err) => Err(err),
    }
}
