use crate::actions::chain::ChainedAction;
use crate::actions::registry::WaitRegistry;
use crate::browser::navigation::Navigation;
use crate::browser::provider::DriverProvider;
use crate::core::config::Config;
use crate::core::driver::{Driver, FrameTarget};
use crate::dom::element::ElementFinder;
use crate::dom::element_array::{ElementArrayFinder, Root};
use crate::dom::locator::Locator;
use crate::errors::{BrowserError, Result};
use crate::task::helpers::{cookie_tasks, frame_tasks, navigation_tasks, window_tasks};
use crate::task::{run_action, SharedResults, Target, TaskEvents, TaskOptions};
use crate::types::Cookie;
use crate::utils::polling::wait_until;
use crate::utils::screenshot::ScreenshotManager;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Handle on one browsing session. Cheap to clone; clones share the
/// session, the configuration and the wait registry.
#[derive(Clone)]
pub struct Browser {
    driver: Driver,
    config: Arc<Config>,
    waits: Arc<WaitRegistry>,
    task_options: TaskOptions,
}

impl Browser {
    pub fn new(driver: Driver, config: Config) -> Self {
        let waits = WaitRegistry::with_defaults(&config.tasks);
        Self::with_registry(driver, config, waits)
    }

    pub fn with_registry(driver: Driver, config: Config, waits: WaitRegistry) -> Self {
        let task_options = TaskOptions::from_config(&config.tasks);
        Self {
            driver,
            config: Arc::new(config),
            waits: Arc::new(waits),
            task_options,
        }
    }

    /// Provisions a session the way `config` asks for and wraps it.
    pub async fn start(config: Config) -> Result<Self> {
        let provider = DriverProvider::from_config(&config);
        info!(provider = %provider, "starting browser session");
        let driver = provider.provision().await?;
        Ok(Self::new(driver, config))
    }

    pub fn driver(&self) -> Driver {
        self.driver.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn waits(&self) -> &WaitRegistry {
        &self.waits
    }

    pub fn task_options(&self) -> &TaskOptions {
        &self.task_options
    }

    /// Same session, different retry and hook settings.
    pub fn with_task_options(&self, options: TaskOptions) -> Self {
        Self {
            task_options: options,
            ..self.clone()
        }
    }

    pub async fn apply_wait_strategy(&self, override_key: Option<&str>) -> Result<()> {
        self.waits
            .wait(
                self.driver.as_ref(),
                self.config.default_wait_strategy.as_deref(),
                override_key,
            )
            .await
    }

    /// `path` itself when absolute, otherwise joined onto `base_url`.
    pub fn resolve_url(&self, path: &str) -> Result<String> {
        match Url::parse(path) {
            Ok(url) => Ok(url.into()),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.config.browser.base_url.as_deref().ok_or_else(|| {
                    BrowserError::ConfigurationError(format!(
                        "relative path '{}' needs a base_url",
                        path
                    ))
                })?;
                Ok(Url::parse(base)?.join(path)?.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Runs `action` through the pipeline with `defaults` ahead of this
    /// browser's own tasks.
    pub(crate) async fn run<T, F, Fut>(
        &self,
        defaults: Option<&TaskEvents>,
        results: &mut SharedResults,
        action: F,
    ) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let options = match defaults {
            Some(defaults) => self.task_options.with_default_tasks(defaults),
            None => self.task_options.clone(),
        };
        run_action(action, &options, results, &Target::Session(self.driver())).await
    }

    pub async fn get(&self, url: &str) -> Result<()> {
        self.get_with_results(url, &mut SharedResults::new()).await
    }

    /// `get`, keeping the snapshots the navigation hooks took.
    pub async fn get_with_results(&self, url: &str, results: &mut SharedResults) -> Result<()> {
        let url = self.resolve_url(url)?;
        debug!(url = %url, "get");
        let driver = self.driver.as_ref();
        let target = url.as_str();
        self.run(
            Some(&navigation_tasks(&self.config.tasks)),
            results,
            move || async move { driver.get(target).await },
        )
        .await?;
        Ok(())
    }

    pub fn navigate(&self) -> Navigation<'_> {
        Navigation::new(self)
    }

    pub async fn get_current_url(&self) -> Result<String> {
        let driver = self.driver.as_ref();
        Ok(self
            .run(None, &mut SharedResults::new(), move || driver.current_url())
            .await?
            .unwrap_or_default())
    }

    pub async fn get_title(&self) -> Result<String> {
        self.driver.title().await
    }

    pub async fn get_page_source(&self) -> Result<String> {
        self.driver.page_source().await
    }

    pub async fn add_cookie(&self, cookie: Cookie) -> Result<()> {
        let driver = self.driver.as_ref();
        let cookie = &cookie;
        self.run(
            Some(&cookie_tasks()),
            &mut SharedResults::new(),
            move || driver.add_cookie(cookie.clone()),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_cookie(&self, name: &str) -> Result<()> {
        let driver = self.driver.as_ref();
        self.run(Some(&cookie_tasks()), &mut SharedResults::new(), move || {
            driver.delete_cookie(name)
        })
        .await?;
        Ok(())
    }

    pub async fn get_cookies(&self) -> Result<Vec<Cookie>> {
        let driver = self.driver.as_ref();
        Ok(self
            .run(Some(&cookie_tasks()), &mut SharedResults::new(), move || {
                driver.cookies()
            })
            .await?
            .unwrap_or_default())
    }

    pub async fn get_window_handle(&self) -> Result<String> {
        let driver = self.driver.as_ref();
        Ok(self
            .run(Some(&window_tasks()), &mut SharedResults::new(), move || {
                driver.window_handle()
            })
            .await?
            .unwrap_or_default())
    }

    pub async fn get_all_window_handles(&self) -> Result<Vec<String>> {
        let driver = self.driver.as_ref();
        Ok(self
            .run(Some(&window_tasks()), &mut SharedResults::new(), move || {
                driver.window_handles()
            })
            .await?
            .unwrap_or_default())
    }

    pub async fn switch_to_window(&self, handle: &str) -> Result<()> {
        let driver = self.driver.as_ref();
        self.run(Some(&window_tasks()), &mut SharedResults::new(), move || {
            driver.switch_to_window(handle)
        })
        .await?;
        Ok(())
    }

    pub async fn switch_to_frame(&self, target: FrameTarget) -> Result<()> {
        let driver = self.driver.as_ref();
        let target = &target;
        self.run(Some(&frame_tasks()), &mut SharedResults::new(), move || {
            driver.switch_to_frame(target)
        })
        .await?;
        Ok(())
    }

    pub async fn switch_to_parent_frame(&self) -> Result<()> {
        let driver = self.driver.as_ref();
        self.run(Some(&frame_tasks()), &mut SharedResults::new(), move || {
            driver.switch_to_parent_frame()
        })
        .await?;
        Ok(())
    }

    pub async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let driver = self.driver.as_ref();
        let args = &args;
        Ok(self
            .run(None, &mut SharedResults::new(), move || {
                driver.execute_script(script, args.clone())
            })
            .await?
            .unwrap_or(Value::Null))
    }

    pub async fn take_screenshot(&self) -> Result<Vec<u8>> {
        self.driver.screenshot().await
    }

    pub async fn take_screenshot_base64(&self) -> Result<String> {
        ScreenshotManager::take_base64(self.driver.as_ref()).await
    }

    pub async fn save_screenshot(&self, path: impl AsRef<Path>) -> Result<()> {
        ScreenshotManager::save_to_file(self.driver.as_ref(), path).await
    }

    /// Polls `condition` every `poll_interval` (the configured explicit-wait
    /// interval when `None`) until it holds, failing with `message` once
    /// `timeout` has passed.
    pub async fn wait<F, Fut>(
        &self,
        condition: F,
        timeout: Duration,
        poll_interval: Option<Duration>,
        message: &str,
    ) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let poll_interval =
            poll_interval.unwrap_or_else(|| self.config.timeouts.wait_poll_interval());
        wait_until(condition, timeout, poll_interval, message).await
    }

    /// Ends the session. Finders created from this browser stop working.
    pub async fn quit(&self) -> Result<()> {
        info!(driver = self.driver.name(), "quitting browser session");
        self.driver.quit().await
    }

    pub fn element(&self, locator: impl Into<Locator>) -> ElementFinder {
        ElementFinder::from_locator(self.clone(), locator.into())
    }

    pub fn all(&self, locator: impl Into<Locator>) -> ElementArrayFinder {
        ElementArrayFinder::new(self.clone(), Root::Session, locator.into())
    }

    /// Entry point of the positional action language.
    pub fn actions(&self) -> ChainedAction {
        ChainedAction::new(self.clone())
    }
}

impl fmt::Debug for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Browser")
            .field("driver", &self.driver.name())
            .field("task_options", &self.task_options)
            .finish()
    }
}
