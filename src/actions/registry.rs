use crate::core::config::TaskConfig;
use crate::core::driver::WebDriver;
use crate::errors::{BrowserError, Result};
use crate::utils::javascript::JavaScriptRunner;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Something to wait for before an element action runs.
#[async_trait]
pub trait WaitStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn wait(&self, driver: &dyn WebDriver) -> Result<()>;
}

/// Polls a script until it returns `true`.
pub struct ScriptWait {
    name: String,
    condition: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl ScriptWait {
    pub fn new(
        name: impl Into<String>,
        condition: impl Into<String>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            condition: condition.into(),
            timeout,
            poll_interval,
        }
    }

    pub fn document_ready(config: &TaskConfig) -> Self {
        Self::new(
            DOCUMENT_READY,
            "return document.readyState === 'complete';",
            config.hook_timeout(),
            config.hook_poll_interval(),
        )
    }
}

#[async_trait]
impl WaitStrategy for ScriptWait {
    fn name(&self) -> &str {
        &self.name
    }

    async fn wait(&self, driver: &dyn WebDriver) -> Result<()> {
        let done = JavaScriptRunner::wait_for_condition(
            driver,
            &self.condition,
            self.timeout.as_millis() as u64,
            self.poll_interval.as_millis() as u64,
        )
        .await?;
        if done {
            Ok(())
        } else {
            Err(BrowserError::Timeout(format!(
                "wait strategy '{}' did not complete",
                self.name
            )))
        }
    }
}

pub const DOCUMENT_READY: &str = "document-ready";

/// Named wait strategies. One registry belongs to one `Browser`.
pub struct WaitRegistry {
    strategies: HashMap<String, Arc<dyn WaitStrategy>>,
}

impl WaitRegistry {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in `document-ready` strategy.
    pub fn with_defaults(config: &TaskConfig) -> Self {
        let mut registry = Self::new();
        registry.register(ScriptWait::document_ready(config));
        registry
    }

    pub fn register<W: WaitStrategy + 'static>(&mut self, strategy: W) {
        let name = strategy.name().to_string();
        self.strategies.insert(name, Arc::new(strategy));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn WaitStrategy>> {
        self.strategies.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.strategies.keys().cloned().collect();
        names.sort();
        names
    }

    /// Runs the override strategy if given, else the default one. Nothing
    /// runs when neither is set.
    pub async fn wait(
        &self,
        driver: &dyn WebDriver,
        default: Option<&str>,
        override_key: Option<&str>,
    ) -> Result<()> {
        let Some(key) = override_key.or(default) else {
            return Ok(());
        };
        let strategy = self.get(key).ok_or_else(|| {
            BrowserError::ConfigurationError(format!("unknown wait strategy '{}'", key))
        })?;
        debug!(strategy = key, "waiting");
        strategy.wait(driver).await
    }
}

impl Default for WaitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDriver;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Counting {
        name: &'static str,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl WaitStrategy for Counting {
        fn name(&self) -> &str {
            self.name
        }

        async fn wait(&self, _driver: &dyn WebDriver) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn registry() -> (WaitRegistry, Arc<AtomicU32>, Arc<AtomicU32>) {
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));
        let mut registry = WaitRegistry::new();
        registry.register(Counting {
            name: "first",
            calls: first.clone(),
        });
        registry.register(Counting {
            name: "second",
            calls: second.clone(),
        });
        (registry, first, second)
    }

    #[tokio::test]
    async fn override_wins_over_default() {
        let (registry, first, second) = registry();
        let driver = MockDriver::new();
        registry.wait(&driver, Some("first"), Some("second")).await.unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);

        registry.wait(&driver, Some("first"), None).await.unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn nothing_runs_without_keys_and_unknown_keys_fail() {
        let (registry, first, second) = registry();
        let driver = MockDriver::new();
        registry.wait(&driver, None, None).await.unwrap();
        assert_eq!(first.load(Ordering::SeqCst) + second.load(Ordering::SeqCst), 0);
        assert!(matches!(
            registry.wait(&driver, Some("missing"), None).await,
            Err(BrowserError::ConfigurationError(_))
        ));
        assert_eq!(registry.names(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn script_wait_polls_until_true() {
        let driver = MockDriver::new();
        driver.on_script("readyState === 'complete'", serde_json::json!(true));
        let registry = WaitRegistry::with_defaults(&TaskConfig::default());
        registry
            .wait(&driver, Some(DOCUMENT_READY), None)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn script_wait_times_out() {
        let driver = MockDriver::new();
        let registry = WaitRegistry::with_defaults(&TaskConfig::default());
        let err = registry
            .wait(&driver, Some(DOCUMENT_READY), None)
            .await
            .unwrap_err();
        assert!(matches!(err, BrowserError::Timeout(_)));
    }
}
