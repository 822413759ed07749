use crate::errors::{BrowserError, Result};
use crate::types::Viewport;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub timeouts: TimeoutConfig,
    pub tasks: TaskConfig,
    /// Wait strategy applied before element actions unless overridden.
    pub default_wait_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Address of a remote WebDriver server. When unset the local Chrome
    /// executor is used.
    pub selenium_address: Option<String>,
    /// Connect straight to a driver at `selenium_address` without a hub.
    pub direct_connect: bool,
    /// Prefix for relative paths given to `go`.
    pub base_url: Option<String>,
    /// Selector of the application root passed to custom locators.
    pub root_selector: String,
    pub capabilities: Capabilities,
    pub headless: bool,
    pub viewport: Viewport,
    pub args: Vec<String>,
}

/// W3C capabilities. Vendor extensions such as `goog:chromeOptions` live in
/// `extensions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Capabilities {
    pub browser_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_insecure_certs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_load_strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unhandled_prompt_behavior: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_file_interactability: Option<bool>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub regular_ms: u64,
    pub slow_ms: u64,
    pub agonizingly_slow_ms: u64,
    pub page_load_ms: u64,
    pub find_poll_interval_ms: u64,
    pub wait_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub retries: u32,
    pub validate: bool,
    pub use_defaults: bool,
    pub hook_timeout_ms: u64,
    pub hook_poll_interval_ms: u64,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BrowserError::ConfigurationError(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            selenium_address: None,
            direct_connect: false,
            base_url: None,
            root_selector: "body".to_string(),
            capabilities: Capabilities::default(),
            headless: true,
            viewport: Viewport::default(),
            args: vec![],
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            browser_name: "chrome".to_string(),
            browser_version: None,
            platform_name: None,
            accept_insecure_certs: None,
            page_load_strategy: None,
            proxy: None,
            timeouts: None,
            unhandled_prompt_behavior: None,
            strict_file_interactability: None,
            extensions: Map::new(),
        }
    }
}

impl Capabilities {
    pub fn to_map(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(BrowserError::ConfigurationError(format!(
                "capabilities must serialize to an object, got {}",
                other
            ))),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            regular_ms: 6_000,
            slow_ms: 90_000,
            agonizingly_slow_ms: 600_000,
            page_load_ms: 60_000,
            find_poll_interval_ms: 100,
            wait_poll_interval_ms: 500,
        }
    }
}

impl TimeoutConfig {
    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    pub fn find_poll_interval(&self) -> Duration {
        Duration::from_millis(self.find_poll_interval_ms)
    }

    pub fn wait_poll_interval(&self) -> Duration {
        Duration::from_millis(self.wait_poll_interval_ms)
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            retries: 1,
            validate: true,
            use_defaults: true,
            hook_timeout_ms: 5_000,
            hook_poll_interval_ms: 500,
        }
    }
}

impl TaskConfig {
    pub fn hook_timeout(&self) -> Duration {
        Duration::from_millis(self.hook_timeout_ms)
    }

    pub fn hook_poll_interval(&self) -> Duration {
        Duration::from_millis(self.hook_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = Config::from_json_str(
            r#"{ "browser": { "baseUrl": null, "selenium_address": "http://localhost:4444/wd/hub" },
                 "tasks": { "retries": 3 } }"#,
        )
        .unwrap();
        assert_eq!(
            config.browser.selenium_address.as_deref(),
            Some("http://localhost:4444/wd/hub")
        );
        assert_eq!(config.browser.root_selector, "body");
        assert_eq!(config.tasks.retries, 3);
        assert!(config.tasks.validate);
        assert_eq!(config.timeouts.regular_ms, 6_000);
    }

    #[test]
    fn capabilities_keep_vendor_extensions() {
        let caps: Capabilities = serde_json::from_str(
            r#"{ "browserName": "firefox", "acceptInsecureCerts": true,
                 "moz:firefoxOptions": { "args": ["-headless"] } }"#,
        )
        .unwrap();
        assert_eq!(caps.browser_name, "firefox");
        assert_eq!(caps.accept_insecure_certs, Some(true));
        let map = caps.to_map().unwrap();
        assert!(map.contains_key("moz:firefoxOptions"));
        assert!(!map.contains_key("proxy"));
    }
}
