use crate::core::driver::{ElementRef, WebDriver};
use crate::dom::finders;
use crate::dom::locator::{
    CustomLocator, ElementResolver, Locator, NativeLocator, ScriptFinder, Strategy,
};
use crate::errors::{BrowserError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::Arc;

/// Locator constructors.
pub struct By;

fn quoted(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

impl By {
    pub fn css(selector: &str) -> Locator {
        NativeLocator::new(Strategy::Css, selector).into()
    }

    pub fn xpath(xpath: &str) -> Locator {
        NativeLocator::new(Strategy::XPath, xpath).into()
    }

    pub fn id(id: &str) -> Locator {
        NativeLocator::new(Strategy::Id, id).into()
    }

    pub fn name(name: &str) -> Locator {
        NativeLocator::new(Strategy::Name, name).into()
    }

    pub fn link_text(text: &str) -> Locator {
        NativeLocator::new(Strategy::LinkText, text).into()
    }

    pub fn partial_link_text(text: &str) -> Locator {
        NativeLocator::new(Strategy::PartialLinkText, text).into()
    }

    pub fn tag_name(tag: &str) -> Locator {
        NativeLocator::new(Strategy::TagName, tag).into()
    }

    pub fn class_name(class: &str) -> Locator {
        NativeLocator::new(Strategy::ClassName, class).into()
    }

    /// Elements returned by a script body evaluated with `args`.
    pub fn js(script: &str, args: Vec<Value>) -> Locator {
        NativeLocator {
            strategy: Strategy::Js,
            value: script.to_string(),
            args,
        }
        .into()
    }

    pub fn button_text(text: &str) -> Locator {
        CustomLocator::new(
            Arc::new(ScriptFinder::new(
                "buttonText",
                finders::BUTTON_TEXT,
                vec![json!(text)],
            )),
            format!("by.buttonText({})", quoted(text)),
        )
        .into()
    }

    pub fn partial_button_text(text: &str) -> Locator {
        CustomLocator::new(
            Arc::new(ScriptFinder::new(
                "partialButtonText",
                finders::PARTIAL_BUTTON_TEXT,
                vec![json!(text)],
            )),
            format!("by.partialButtonText({})", quoted(text)),
        )
        .into()
    }

    pub fn css_containing_text(css: &str, text: &str) -> Locator {
        CustomLocator::new(
            Arc::new(ScriptFinder::new(
                "cssContainingText",
                finders::CSS_CONTAINING_TEXT,
                vec![json!(css), json!(text)],
            )),
            format!("by.cssContainingText({}, {})", quoted(css), quoted(text)),
        )
        .into()
    }

    /// Like `css_containing_text` with a regular expression. The pattern is
    /// checked locally before it is shipped to the browser.
    pub fn css_containing_regex(css: &str, pattern: &str, flags: &str) -> Result<Locator> {
        Regex::new(pattern).map_err(|e| {
            BrowserError::InvalidLocator(format!("bad pattern /{}/: {}", pattern, e))
        })?;
        if let Some(flag) = flags.chars().find(|c| !"dgimsuy".contains(*c)) {
            return Err(BrowserError::InvalidLocator(format!(
                "unknown regexp flag '{}'",
                flag
            )));
        }
        Ok(CustomLocator::new(
            Arc::new(ScriptFinder::new(
                "cssContainingText",
                finders::CSS_CONTAINING_TEXT,
                vec![json!(css), json!(finders::serialize_regexp(pattern, flags))],
            )),
            format!("by.cssContainingText({}, /{}/{})", quoted(css), pattern, flags),
        )
        .into())
    }

    /// Innermost element whose trimmed text is exactly `text`.
    pub fn text(text: &str) -> Locator {
        CustomLocator::new(
            Arc::new(ScriptFinder::new(
                "text",
                finders::EXACT_TEXT,
                vec![json!(text)],
            )),
            quoted(text),
        )
        .into()
    }

    /// Css that pierces shadow roots.
    pub fn deep_css(selector: &str) -> Locator {
        CustomLocator::new(
            Arc::new(DeepCss {
                native: NativeLocator::new(Strategy::Css, format!("* /deep/ {}", selector)),
            }),
            format!("by.deepCss({})", quoted(selector)),
        )
        .into()
    }
}

struct DeepCss {
    native: NativeLocator,
}

#[async_trait]
impl ElementResolver for DeepCss {
    async fn find_elements(
        &self,
        driver: &dyn WebDriver,
        using: Option<&ElementRef>,
        _root_selector: &str,
    ) -> Result<Vec<ElementRef>> {
        driver.find_elements(using, &self.native).await
    }
}
