use crate::actions::base::{Position, Slowness};
use crate::browser::Browser;
use crate::dom::locator::Locator;
use std::fmt;
use std::time::Duration;

/// One positional constraint of a chain.
#[derive(Debug, Clone)]
pub struct PositionalLocator {
    pub position: Position,
    pub locator: Locator,
}

impl PositionalLocator {
    pub fn new(position: Position, locator: Locator) -> Self {
        Self { position, locator }
    }
}

impl fmt::Display for PositionalLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.position, self.locator)
    }
}

/// Everything a chained action needs to find its element. Never mutated:
/// each modifier hands back a new context.
#[derive(Clone)]
pub struct ActionContext {
    locators: Vec<PositionalLocator>,
    slowness: Slowness,
    want_zero: bool,
    browser: Browser,
}

impl ActionContext {
    pub fn new(browser: Browser) -> Self {
        Self {
            locators: Vec::new(),
            slowness: Slowness::Regular,
            want_zero: false,
            browser,
        }
    }

    pub fn locators(&self) -> &[PositionalLocator] {
        &self.locators
    }

    pub fn slowness(&self) -> Slowness {
        self.slowness
    }

    pub fn want_zero(&self) -> bool {
        self.want_zero
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    pub fn timeout(&self) -> Duration {
        self.slowness.timeout(&self.browser.config().timeouts)
    }

    pub fn with_locator(&self, position: Position, locator: Locator) -> Self {
        let mut locators = self.locators.clone();
        locators.push(PositionalLocator::new(position, locator));
        Self {
            locators,
            ..self.clone()
        }
    }

    pub fn with_slowness(&self, slowness: Slowness) -> Self {
        Self {
            slowness,
            ..self.clone()
        }
    }

    pub fn with_not(&self, want_zero: bool) -> Self {
        Self {
            want_zero,
            ..self.clone()
        }
    }

    /// `not.` + tier prefix + one `position(locator).` per constraint.
    pub fn description(&self) -> String {
        let mut text = String::new();
        if self.want_zero {
            text.push_str("not.");
        }
        text.push_str(self.slowness.prefix());
        for modifier in &self.locators {
            text.push_str(&format!("{}.", modifier));
        }
        text
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("locators", &self.locators)
            .field("slowness", &self.slowness)
            .field("want_zero", &self.want_zero)
            .finish()
    }
}
