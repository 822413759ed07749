use crate::core::driver::{ElementRef, WebDriver};
use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Native search strategies understood by the remote end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    Css,
    XPath,
    Id,
    Name,
    LinkText,
    PartialLinkText,
    TagName,
    ClassName,
    Js,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Css => "css selector",
            Strategy::XPath => "xpath",
            Strategy::Id => "id",
            Strategy::Name => "name",
            Strategy::LinkText => "link text",
            Strategy::PartialLinkText => "partial link text",
            Strategy::TagName => "tag name",
            Strategy::ClassName => "class name",
            Strategy::Js => "js",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeLocator {
    pub strategy: Strategy,
    pub value: String,
    /// Arguments for the `js` strategy; empty otherwise.
    pub args: Vec<Value>,
}

impl NativeLocator {
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
            args: vec![],
        }
    }

    /// Rewrites strategies that some remote ends lack in terms of css or
    /// xpath. `js` and the two primitive strategies are returned unchanged.
    pub fn to_css_or_xpath(&self) -> NativeLocator {
        let quoted = serde_json::to_string(&self.value).unwrap_or_default();
        match self.strategy {
            Strategy::Id => NativeLocator::new(Strategy::Css, format!("[id={}]", quoted)),
            Strategy::Name => NativeLocator::new(Strategy::Css, format!("[name={}]", quoted)),
            Strategy::TagName => NativeLocator::new(Strategy::Css, self.value.clone()),
            Strategy::ClassName => {
                NativeLocator::new(Strategy::Css, format!(".{}", self.value.trim()))
            }
            Strategy::LinkText => NativeLocator::new(
                Strategy::XPath,
                format!(".//a[normalize-space(.)={}]", xpath_literal(&self.value)),
            ),
            Strategy::PartialLinkText => NativeLocator::new(
                Strategy::XPath,
                format!(".//a[contains(., {})]", xpath_literal(&self.value)),
            ),
            _ => self.clone(),
        }
    }
}

fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

impl fmt::Display for NativeLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "By({}, {})", self.strategy, self.value)
    }
}

/// Finds elements on behalf of a custom locator.
#[async_trait]
pub trait ElementResolver: Send + Sync {
    async fn find_elements(
        &self,
        driver: &dyn WebDriver,
        using: Option<&ElementRef>,
        root_selector: &str,
    ) -> Result<Vec<ElementRef>>;
}

/// A client-side search function shipped to the browser with its
/// arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptFinder {
    pub name: String,
    pub script: String,
    pub args: Vec<Value>,
}

impl ScriptFinder {
    pub fn new(name: impl Into<String>, script: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
            args,
        }
    }
}

#[async_trait]
impl ElementResolver for ScriptFinder {
    async fn find_elements(
        &self,
        driver: &dyn WebDriver,
        using: Option<&ElementRef>,
        _root_selector: &str,
    ) -> Result<Vec<ElementRef>> {
        driver.find_elements_by_script(self, using).await
    }
}

#[derive(Clone)]
pub struct CustomLocator {
    pub resolver: Arc<dyn ElementResolver>,
    pub description: String,
}

impl CustomLocator {
    pub fn new(resolver: Arc<dyn ElementResolver>, description: impl Into<String>) -> Self {
        Self {
            resolver,
            description: description.into(),
        }
    }
}

impl fmt::Debug for CustomLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomLocator")
            .field("description", &self.description)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum Locator {
    Native(NativeLocator),
    Custom(CustomLocator),
}

impl Locator {
    pub async fn resolve(
        &self,
        driver: &dyn WebDriver,
        using: Option<&ElementRef>,
        root_selector: &str,
    ) -> Result<Vec<ElementRef>> {
        match self {
            Locator::Native(native) => driver.find_elements(using, native).await,
            Locator::Custom(custom) => {
                custom
                    .resolver
                    .find_elements(driver, using, root_selector)
                    .await
            }
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Locator::Custom(_))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Native(native) => native.fmt(f),
            Locator::Custom(custom) => f.write_str(&custom.description),
        }
    }
}

impl From<NativeLocator> for Locator {
    fn from(native: NativeLocator) -> Self {
        Locator::Native(native)
    }
}

impl From<CustomLocator> for Locator {
    fn from(custom: CustomLocator) -> Self {
        Locator::Custom(custom)
    }
}

/// Plain strings locate the innermost element with that exact text.
impl From<&str> for Locator {
    fn from(text: &str) -> Self {
        crate::dom::by::By::text(text)
    }
}

impl From<String> for Locator {
    fn from(text: String) -> Self {
        crate::dom::by::By::text(&text)
    }
}

impl From<&Locator> for Locator {
    fn from(locator: &Locator) -> Self {
        locator.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_locators_render_like_by() {
        let locator = Locator::from(NativeLocator::new(Strategy::Css, ".nav-page1"));
        assert_eq!(locator.to_string(), "By(css selector, .nav-page1)");
        assert!(!locator.is_custom());
    }

    #[test]
    fn strategies_without_native_support_are_rewritten() {
        let by_name = NativeLocator::new(Strategy::Name, "q").to_css_or_xpath();
        assert_eq!(by_name.strategy, Strategy::Css);
        assert_eq!(by_name.value, "[name=\"q\"]");

        let by_link = NativeLocator::new(Strategy::PartialLinkText, "it's").to_css_or_xpath();
        assert_eq!(by_link.strategy, Strategy::XPath);
        assert_eq!(by_link.value, ".//a[contains(., \"it's\")]");
    }

    #[test]
    fn xpath_literal_handles_both_quote_kinds() {
        assert_eq!(xpath_literal("a'b\"c"), "concat('a', \"'\", 'b\"c')");
    }

    #[test]
    fn strings_become_text_locators() {
        let locator = Locator::from("Cheese");
        assert!(locator.is_custom());
        assert_eq!(locator.to_string(), "\"Cheese\"");
    }
}
