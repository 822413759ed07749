use crate::actions::base::Position;
use crate::actions::context::PositionalLocator;
use crate::browser::Browser;
use crate::core::driver::{Driver, WebElement};
use crate::dom::locator::Locator;
use crate::errors::{BrowserError, Result};
use crate::types::ElementRect;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Options a caller may pass to `see`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOptions {
    /// Count elements that are present but not displayed.
    #[serde(default)]
    pub allow_unseen: bool,
}

impl FindOptions {
    pub fn allow_unseen() -> Self {
        Self { allow_unseen: true }
    }
}

/// What a successful `retrying_find` settled on.
#[derive(Debug, Clone, PartialEq)]
pub enum FindOutcome {
    Found(WebElement),
    /// Nothing matched, which is what a negated chain wanted.
    Absent,
}

struct Candidate {
    element: WebElement,
    rect: ElementRect,
}

/// Whether `candidate` sits at `position` relative to `anchor`.
pub fn satisfies(position: Position, candidate: &ElementRect, anchor: &ElementRect) -> bool {
    match position {
        Position::Under => {
            candidate.top() >= anchor.bottom() && candidate.overlaps_horizontally(anchor)
        }
        Position::Below => candidate.top() >= anchor.bottom(),
        Position::Inside => anchor.contains(candidate),
        Position::RightOf => candidate.left() >= anchor.right(),
        Position::LeftOf => candidate.right() <= anchor.left(),
        Position::Global => true,
    }
}

async fn resolve(
    driver: &Driver,
    locator: &Locator,
    root_selector: &str,
    allow_unseen: bool,
) -> Result<Vec<Candidate>> {
    let mut found = vec![];
    for reference in locator.resolve(driver.as_ref(), None, root_selector).await? {
        if !allow_unseen && !driver.is_displayed(&reference).await? {
            continue;
        }
        let rect = driver.rect(&reference).await?;
        found.push(Candidate {
            element: WebElement::new(reference, driver.clone()),
            rect,
        });
    }
    Ok(found)
}

/// One pass over the chain. The `Global` entry supplies the candidates and
/// every other entry, left to right, keeps those positioned relative to at
/// least one of its anchors.
async fn find_once(
    browser: &Browser,
    locators: &[PositionalLocator],
    options: &FindOptions,
) -> Result<Vec<WebElement>> {
    let driver = browser.driver();
    let root_selector = browser.config().browser.root_selector.as_str();

    let Some(terminal) = locators.iter().find(|l| l.position == Position::Global) else {
        return Err(BrowserError::InvalidLocator(
            "a chain needs a terminal locator".to_string(),
        ));
    };
    let mut candidates =
        resolve(&driver, &terminal.locator, root_selector, options.allow_unseen).await?;

    for constraint in locators.iter().filter(|l| l.position != Position::Global) {
        if candidates.is_empty() {
            break;
        }
        let anchors = resolve(&driver, &constraint.locator, root_selector, false).await?;
        candidates.retain(|candidate| {
            anchors.iter().any(|anchor| {
                anchor.element != candidate.element
                    && satisfies(constraint.position, &candidate.rect, &anchor.rect)
            })
        });
    }
    Ok(candidates.into_iter().map(|c| c.element).collect())
}

/// Polls the chain until it yields an element, or until it yields none when
/// `want_zero` is set. Stale references met while polling only cost a
/// retry. Running out of time fails with `NotFound`.
pub async fn retrying_find(
    browser: &Browser,
    locators: &[PositionalLocator],
    timeout: Duration,
    description: &str,
    options: &FindOptions,
    want_zero: bool,
) -> Result<FindOutcome> {
    let poll_interval = browser.config().timeouts.find_poll_interval();
    let deadline = Instant::now() + timeout;
    loop {
        match find_once(browser, locators, options).await {
            Ok(found) if want_zero && found.is_empty() => return Ok(FindOutcome::Absent),
            Ok(found) if !want_zero => {
                if let Some(first) = found.into_iter().next() {
                    return Ok(FindOutcome::Found(first));
                }
            }
            Ok(_) => {}
            Err(err) if err.is_stale() => {
                debug!(error = %err, "stale reference while finding, polling again");
            }
            Err(err) => return Err(err),
        }
        if Instant::now() >= deadline {
            return Err(BrowserError::NotFound {
                description: description.to_string(),
            });
        }
        sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_of_each_position() {
        let anchor = ElementRect::new(100.0, 100.0, 100.0, 20.0);
        let under = ElementRect::new(120.0, 140.0, 50.0, 20.0);
        let below_elsewhere = ElementRect::new(400.0, 140.0, 50.0, 20.0);
        let right = ElementRect::new(250.0, 100.0, 50.0, 20.0);
        let left = ElementRect::new(10.0, 100.0, 50.0, 20.0);
        let inner = ElementRect::new(110.0, 105.0, 20.0, 10.0);

        assert!(satisfies(Position::Under, &under, &anchor));
        assert!(!satisfies(Position::Under, &below_elsewhere, &anchor));
        assert!(satisfies(Position::Below, &below_elsewhere, &anchor));
        assert!(!satisfies(Position::Below, &right, &anchor));
        assert!(satisfies(Position::RightOf, &right, &anchor));
        assert!(!satisfies(Position::RightOf, &left, &anchor));
        assert!(satisfies(Position::LeftOf, &left, &anchor));
        assert!(satisfies(Position::Inside, &inner, &anchor));
        assert!(!satisfies(Position::Inside, &under, &anchor));
    }

    #[test]
    fn options_serialize_in_camel_case() {
        let json = serde_json::to_string(&FindOptions::allow_unseen()).unwrap();
        assert_eq!(json, r#"{"allowUnseen":true}"#);
        let parsed: FindOptions = serde_json::from_str("{}").unwrap();
        assert!(!parsed.allow_unseen);
    }
}
