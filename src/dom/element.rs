use crate::actions::base::click_with_recovery;
use crate::browser::Browser;
use crate::core::driver::WebElement;
use crate::dom::element_array::{ElementArrayFinder, Root};
use crate::dom::locator::Locator;
use crate::errors::{BrowserError, Result};
use crate::task::{run_action, SharedResults, Target, TaskOptions};
use crate::types::ElementRect;
use crate::utils::javascript::ELEMENTS_EQUAL;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// A lazily evaluated single element: one entry of an `ElementArrayFinder`.
///
/// Every operation resolves the element again and runs through the task
/// pipeline with this finder's `TaskOptions`.
#[derive(Clone)]
pub struct ElementFinder {
    array: ElementArrayFinder,
    index: isize,
}

impl ElementFinder {
    pub(crate) fn from_array(array: ElementArrayFinder, index: isize) -> Self {
        Self { array, index }
    }

    pub(crate) fn from_locator(browser: Browser, locator: Locator) -> Self {
        Self::from_array(ElementArrayFinder::new(browser, Root::Session, locator), 0)
    }

    pub fn locator(&self) -> &Locator {
        self.array.locator()
    }

    pub fn browser(&self) -> &Browser {
        self.array.browser()
    }

    /// Same element with different retry and hook settings.
    pub fn with_task_options(&self, options: TaskOptions) -> Self {
        Self::from_array(self.array.with_task_options(options), self.index)
    }

    /// First match of `locator` inside this element.
    pub fn element(&self, locator: impl Into<Locator>) -> ElementFinder {
        ElementFinder::from_array(self.all(locator), 0)
    }

    /// All matches of `locator` inside this element.
    pub fn all(&self, locator: impl Into<Locator>) -> ElementArrayFinder {
        ElementArrayFinder::new(
            self.browser().clone(),
            Root::Element(Arc::new(self.clone())),
            locator.into(),
        )
    }

    pub async fn get_web_element(&self) -> Result<WebElement> {
        let mut elements = self.array.get_web_elements().await?;
        let count = elements.len() as isize;
        if count == 0 {
            return Err(BrowserError::NoSuchElement(format!(
                "No element found using locator: {}",
                self.array
            )));
        }
        let index = if self.index < 0 {
            count + self.index
        } else {
            self.index
        };
        if index < 0 || index >= count {
            return Err(BrowserError::NoSuchElement(format!(
                "Index out of bound. Trying to access element at index: {}, but there are only {} elements that match locator {}",
                self.index, count, self.array
            )));
        }
        Ok(elements.swap_remove(index as usize))
    }

    /// Resolves the element and runs `op` on it inside the task pipeline.
    async fn perform<T, F, Fut>(&self, name: &str, op: F) -> Result<Option<T>>
    where
        F: Fn(WebElement) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        debug!(element = %self, action = name, "element action");
        let browser = self.browser();
        let options = browser.task_options();
        let wait_override = options.wait_strategy.as_deref();
        let target = Target::Session(browser.driver());
        let op = &op;
        run_action(
            move || async move {
                browser.apply_wait_strategy(wait_override).await?;
                let element = self.get_web_element().await?;
                op(element).await
            },
            options,
            &mut SharedResults::new(),
            &target,
        )
        .await
    }

    pub async fn click(&self) -> Result<()> {
        self.perform("click", |el| async move { click_with_recovery(&el).await })
            .await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.perform("clear", |el| async move { el.clear().await }).await?;
        Ok(())
    }

    pub async fn send_keys(&self, text: &str) -> Result<()> {
        self.perform("sendKeys", |el| async move { el.send_keys(text).await })
            .await?;
        Ok(())
    }

    pub async fn submit(&self) -> Result<()> {
        self.perform("submit", |el| async move { el.submit().await }).await?;
        Ok(())
    }

    pub async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .perform("getAttribute", |el| async move { el.attribute(name).await })
            .await?
            .flatten())
    }

    pub async fn get_css_value(&self, property: &str) -> Result<String> {
        Ok(self
            .perform("getCssValue", |el| async move { el.css_value(property).await })
            .await?
            .unwrap_or_default())
    }

    pub async fn get_rect(&self) -> Result<ElementRect> {
        Ok(self
            .perform("getRect", |el| async move { el.rect().await })
            .await?
            .unwrap_or_default())
    }

    pub async fn get_tag_name(&self) -> Result<String> {
        Ok(self
            .perform("getTagName", |el| async move { el.tag_name().await })
            .await?
            .unwrap_or_default())
    }

    pub async fn get_text(&self) -> Result<String> {
        Ok(self
            .perform("getText", |el| async move { el.text().await })
            .await?
            .unwrap_or_default())
    }

    pub async fn is_displayed(&self) -> Result<bool> {
        Ok(self
            .perform("isDisplayed", |el| async move { el.is_displayed().await })
            .await?
            .unwrap_or_default())
    }

    pub async fn is_enabled(&self) -> Result<bool> {
        Ok(self
            .perform("isEnabled", |el| async move { el.is_enabled().await })
            .await?
            .unwrap_or_default())
    }

    pub async fn is_selected(&self) -> Result<bool> {
        Ok(self
            .perform("isSelected", |el| async move { el.is_selected().await })
            .await?
            .unwrap_or_default())
    }

    /// Number of elements matching this finder's locator.
    pub async fn count(&self) -> Result<usize> {
        self.array.count().await
    }

    pub async fn is_present(&self) -> Result<bool> {
        Ok(self.count().await? >= 1)
    }

    /// Whether both finders resolve to the same DOM node.
    pub async fn equals(&self, other: &ElementFinder) -> Result<bool> {
        let theirs = other.get_web_element().await?;
        self.equals_element(&theirs).await
    }

    pub async fn equals_element(&self, other: &WebElement) -> Result<bool> {
        let other = other.reference().to_json();
        let same = self
            .perform("equals", |el| {
                let other = other.clone();
                async move {
                    let driver = el.driver();
                    let value = driver
                        .execute_script(ELEMENTS_EQUAL, vec![el.reference().to_json(), other])
                        .await?;
                    Ok(value == Value::Bool(true))
                }
            })
            .await?;
        Ok(same.unwrap_or_default())
    }
}

impl fmt::Display for ElementFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 0 {
            write!(f, "{}", self.array)
        } else {
            write!(f, "{}[{}]", self.array, self.index)
        }
    }
}
