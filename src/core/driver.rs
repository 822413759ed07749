use crate::dom::locator::{NativeLocator, ScriptFinder};
use crate::errors::{BrowserError, Result};
use crate::types::{Cookie, ElementRect};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Key under which the W3C protocol serializes element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// W3C page-load timeout for sessions that never set one.
pub const DEFAULT_PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(300);

pub type Driver = Arc<dyn WebDriver>;

/// Opaque, session-scoped reference to a DOM element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// Script argument form understood by every remote end.
    pub fn to_json(&self) -> Value {
        json!({ ELEMENT_KEY: self.0 })
    }

    pub fn from_json(value: &Value) -> Option<Self> {
        value
            .as_object()
            .and_then(|obj| obj.get(ELEMENT_KEY))
            .and_then(Value::as_str)
            .map(ElementRef::new)
    }

    /// Reads a script result that must be an element, a list of elements or
    /// null.
    pub fn list_from_json(value: Value) -> Result<Vec<Self>> {
        match value {
            Value::Null => Ok(vec![]),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    Self::from_json(item).ok_or_else(|| {
                        BrowserError::JavaScriptFailed(format!(
                            "expected an element reference, got {}",
                            item
                        ))
                    })
                })
                .collect(),
            other => Self::from_json(&other).map(|r| vec![r]).ok_or_else(|| {
                BrowserError::JavaScriptFailed(format!(
                    "expected a list of elements, got {}",
                    other
                ))
            }),
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameTarget {
    Index(u16),
    Element(ElementRef),
}

/// A session-bound command executor. Every implementation talks to exactly
/// one browsing session and issues one command at a time.
#[async_trait]
pub trait WebDriver: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, url: &str) -> Result<()>;
    async fn current_url(&self) -> Result<String>;
    async fn title(&self) -> Result<String>;
    async fn page_source(&self) -> Result<String>;
    async fn back(&self) -> Result<()>;
    async fn forward(&self) -> Result<()>;
    async fn refresh(&self) -> Result<()>;
    async fn page_load_timeout(&self) -> Result<Duration>;
    async fn set_page_load_timeout(&self, timeout: Duration) -> Result<()>;

    async fn find_elements(
        &self,
        using: Option<&ElementRef>,
        locator: &NativeLocator,
    ) -> Result<Vec<ElementRef>>;

    /// Runs a client-side finder. The scope element (or null) is appended
    /// to the finder's own arguments.
    async fn find_elements_by_script(
        &self,
        finder: &ScriptFinder,
        using: Option<&ElementRef>,
    ) -> Result<Vec<ElementRef>> {
        let mut args = finder.args.clone();
        args.push(using.map(ElementRef::to_json).unwrap_or(Value::Null));
        let value = self.execute_script(&finder.script, args).await?;
        ElementRef::list_from_json(value)
    }

    async fn active_element(&self) -> Result<Option<ElementRef>>;

    /// Executes `script` as the body of a function receiving `args`.
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value>;

    async fn click(&self, element: &ElementRef) -> Result<()>;
    /// Moves the pointer over the element's center and clicks whatever is
    /// there.
    async fn pointer_click(&self, element: &ElementRef) -> Result<()>;
    async fn long_press(&self, element: &ElementRef, hold: Duration) -> Result<()>;
    async fn tap(&self, element: &ElementRef) -> Result<()>;
    async fn clear(&self, element: &ElementRef) -> Result<()>;
    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()>;

    async fn send_keys_to_active(&self, text: &str) -> Result<()> {
        match self.active_element().await? {
            Some(element) => self.send_keys(&element, text).await,
            None => Err(BrowserError::NoSuchElement(
                "no such element: nothing has focus".to_string(),
            )),
        }
    }

    async fn submit(&self, element: &ElementRef) -> Result<()> {
        self.execute_script(
            crate::utils::javascript::SUBMIT_FORM,
            vec![element.to_json()],
        )
        .await?;
        Ok(())
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>>;
    async fn css_value(&self, element: &ElementRef, property: &str) -> Result<String>;
    async fn text(&self, element: &ElementRef) -> Result<String>;
    async fn tag_name(&self, element: &ElementRef) -> Result<String>;
    async fn rect(&self, element: &ElementRef) -> Result<ElementRect>;
    async fn is_displayed(&self, element: &ElementRef) -> Result<bool>;
    async fn is_enabled(&self, element: &ElementRef) -> Result<bool>;
    async fn is_selected(&self, element: &ElementRef) -> Result<bool>;

    async fn cookies(&self) -> Result<Vec<Cookie>>;
    async fn add_cookie(&self, cookie: Cookie) -> Result<()>;
    async fn delete_cookie(&self, name: &str) -> Result<()>;

    async fn window_handle(&self) -> Result<String>;
    async fn window_handles(&self) -> Result<Vec<String>>;
    async fn switch_to_window(&self, handle: &str) -> Result<()>;
    async fn switch_to_frame(&self, target: &FrameTarget) -> Result<()>;
    async fn switch_to_parent_frame(&self) -> Result<()>;

    async fn screenshot(&self) -> Result<Vec<u8>>;
    async fn quit(&self) -> Result<()>;
}

/// An element reference bound to the session that produced it.
#[derive(Clone)]
pub struct WebElement {
    reference: ElementRef,
    driver: Driver,
}

impl WebElement {
    pub fn new(reference: ElementRef, driver: Driver) -> Self {
        Self { reference, driver }
    }

    pub fn reference(&self) -> &ElementRef {
        &self.reference
    }

    pub fn id(&self) -> &str {
        self.reference.id()
    }

    pub fn driver(&self) -> Driver {
        self.driver.clone()
    }

    pub async fn click(&self) -> Result<()> {
        self.driver.click(&self.reference).await
    }

    pub async fn send_keys(&self, text: &str) -> Result<()> {
        self.driver.send_keys(&self.reference, text).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.driver.clear(&self.reference).await
    }

    pub async fn submit(&self) -> Result<()> {
        self.driver.submit(&self.reference).await
    }

    pub async fn tag_name(&self) -> Result<String> {
        self.driver.tag_name(&self.reference).await
    }

    pub async fn css_value(&self, property: &str) -> Result<String> {
        self.driver.css_value(&self.reference, property).await
    }

    pub async fn text(&self) -> Result<String> {
        self.driver.text(&self.reference).await
    }

    pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.driver.attribute(&self.reference, name).await
    }

    pub async fn rect(&self) -> Result<ElementRect> {
        self.driver.rect(&self.reference).await
    }

    pub async fn is_displayed(&self) -> Result<bool> {
        self.driver.is_displayed(&self.reference).await
    }

    pub async fn is_enabled(&self) -> Result<bool> {
        self.driver.is_enabled(&self.reference).await
    }

    pub async fn is_selected(&self) -> Result<bool> {
        self.driver.is_selected(&self.reference).await
    }
}

impl fmt::Debug for WebElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebElement")
            .field("reference", &self.reference)
            .field("driver", &self.driver.name())
            .finish()
    }
}

impl PartialEq for WebElement {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_refs_round_trip_through_script_values() {
        let reference = ElementRef::new("42");
        let value = reference.to_json();
        assert_eq!(value[ELEMENT_KEY], json!("42"));
        assert_eq!(ElementRef::from_json(&value), Some(reference));
    }

    #[test]
    fn list_from_json_accepts_null_single_and_arrays() {
        assert!(ElementRef::list_from_json(Value::Null).unwrap().is_empty());
        let single = ElementRef::list_from_json(ElementRef::new("1").to_json()).unwrap();
        assert_eq!(single, vec![ElementRef::new("1")]);
        let many = ElementRef::list_from_json(json!([
            ElementRef::new("1").to_json(),
            ElementRef::new("2").to_json()
        ]))
        .unwrap();
        assert_eq!(many.len(), 2);
        assert!(ElementRef::list_from_json(json!(["nope"])).is_err());
    }
}
