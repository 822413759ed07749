use crate::browser::Browser;
use crate::core::driver::{ElementRef, WebElement};
use crate::dom::element::ElementFinder;
use crate::dom::locator::Locator;
use crate::errors::{BrowserError, Result};
use crate::task::{run_action, SharedResults, Target, TaskOptions};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Where a finder's locator is evaluated.
#[derive(Clone)]
pub(crate) enum Root {
    Session,
    /// Under the single element of a parent finder.
    Element(Arc<ElementFinder>),
    /// Under every element of a parent list.
    Each(Arc<ElementArrayFinder>),
}

/// A lazily evaluated list of elements. Nothing touches the browser until a
/// method is awaited, and every call resolves again from scratch.
#[derive(Clone)]
pub struct ElementArrayFinder {
    browser: Browser,
    root: Root,
    locator: Locator,
}

impl ElementArrayFinder {
    pub(crate) fn new(browser: Browser, root: Root, locator: Locator) -> Self {
        Self {
            browser,
            root,
            locator,
        }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// The session the elements belong to.
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    pub fn with_task_options(&self, options: TaskOptions) -> Self {
        let mut finder = self.clone();
        finder.browser = self.browser.with_task_options(options);
        finder
    }

    pub fn get_web_elements(&self) -> BoxFuture<'_, Result<Vec<WebElement>>> {
        Box::pin(async move {
            let driver = self.browser.driver();
            let root_selector = self.browser.config().browser.root_selector.as_str();
            let references = match &self.root {
                Root::Session => {
                    self.locator
                        .resolve(driver.as_ref(), None, root_selector)
                        .await?
                }
                Root::Element(parent) => {
                    let scope = parent.get_web_element().await.map_err(|e| match e {
                        BrowserError::NoSuchElement(_) | BrowserError::StaleElement(_) => {
                            BrowserError::StaleRoot(format!(
                                "{} no longer matches an element: {}",
                                parent, e
                            ))
                        }
                        other => other,
                    })?;
                    self.resolve_under(&scope).await?
                }
                Root::Each(parents) => {
                    let mut found = vec![];
                    for scope in parents.get_web_elements().await? {
                        found.extend(self.resolve_under(&scope).await?);
                    }
                    found
                }
            };
            Ok(references
                .into_iter()
                .map(|r| WebElement::new(r, driver.clone()))
                .collect())
        })
    }

    async fn resolve_under(&self, scope: &WebElement) -> Result<Vec<ElementRef>> {
        let root_selector = self.browser.config().browser.root_selector.as_str();
        self.locator
            .resolve(scope.driver().as_ref(), Some(scope.reference()), root_selector)
            .await
            .map_err(|e| match e {
                BrowserError::StaleElement(message) => BrowserError::StaleRoot(format!(
                    "scope element {} vanished while resolving {}: {}",
                    scope.reference(),
                    self.locator,
                    message
                )),
                other => other,
            })
    }

    /// Matches of `locator` under each element of this list, in order.
    pub fn all(&self, locator: impl Into<Locator>) -> ElementArrayFinder {
        ElementArrayFinder::new(
            self.browser.clone(),
            Root::Each(Arc::new(self.clone())),
            locator.into(),
        )
    }

    /// The element at `index`; negative indices count from the end.
    pub fn get(&self, index: isize) -> ElementFinder {
        ElementFinder::from_array(self.clone(), index)
    }

    pub fn first(&self) -> ElementFinder {
        self.get(0)
    }

    pub fn last(&self) -> ElementFinder {
        self.get(-1)
    }

    pub async fn count(&self) -> Result<usize> {
        let options = self.browser.task_options().clone();
        let target = Target::Session(self.browser.driver());
        let count = run_action(
            move || async move { Ok::<_, BrowserError>(self.get_web_elements().await?.len()) },
            &options,
            &mut SharedResults::new(),
            &target,
        )
        .await?;
        Ok(count.unwrap_or_default())
    }

    pub async fn is_present(&self) -> Result<bool> {
        Ok(self.count().await? > 0)
    }
}

impl fmt::Display for ElementArrayFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Root::Session => write!(f, "{}", self.locator),
            Root::Element(parent) => write!(f, "{} > {}", parent, self.locator),
            Root::Each(parents) => write!(f, "{} >> {}", parents, self.locator),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::driver::WebDriver;
    use crate::dom::by::By;
    use crate::errors::BrowserError;
    use crate::testing::MockDriver;
    use crate::{Browser, Config};
    use std::sync::Arc;

    const PAGE: &str = r#"<html><body>
        <ul class="list"><li>a1</li><li>a2</li></ul>
        <ul class="list"><li>b1</li></ul>
        <ul class="empty"></ul>
      </body></html>"#;

    async fn browser() -> (Arc<MockDriver>, Browser) {
        let mock = Arc::new(MockDriver::new().with_page("http://localhost/list.html", PAGE));
        let browser = Browser::new(mock.clone(), Config::default());
        mock.get("http://localhost/list.html").await.unwrap();
        (mock, browser)
    }

    #[tokio::test]
    async fn all_flat_maps_over_parents() {
        let (_, browser) = browser().await;
        let items = browser.all(By::css(".list")).all(By::css("li"));
        assert_eq!(items.count().await.unwrap(), 3);
        assert_eq!(items.last().get_text().await.unwrap(), "b1");
        assert_eq!(items.get(-2).get_text().await.unwrap(), "a2");
        assert_eq!(items.to_string(), "By(css selector, .list) >> By(css selector, li)");
    }

    #[tokio::test]
    async fn count_is_idempotent_and_tracks_the_dom() {
        let (mock, browser) = browser().await;
        let items = browser.all(By::css("li"));
        assert_eq!(items.count().await.unwrap(), 3);
        assert_eq!(items.count().await.unwrap(), 3);
        assert!(items.is_present().await.unwrap());

        mock.replace_page(
            "http://localhost/list.html",
            "<html><body><ul class=\"list\"><li>x</li></ul></body></html>",
        );
        assert_eq!(items.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_root_is_a_stale_root_not_zero_matches() {
        let (_, browser) = browser().await;
        let orphan = browser.element(By::css(".missing")).all(By::css("li"));
        let err = orphan.count().await.unwrap_err();
        assert!(matches!(err, BrowserError::StaleRoot(_)), "{err:?}");

        let none_inside = browser.element(By::css(".empty")).all(By::css("li"));
        assert_eq!(none_inside.count().await.unwrap(), 0);
    }
}
