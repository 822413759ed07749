//! Built-in hooks registered around session actions when `use_defaults` is
//! on.

use crate::core::config::TaskConfig;
use crate::core::driver::WebDriver;
use crate::errors::{BrowserError, Result};
use crate::task::options::{LocalTask, Task, TaskEvents};
use crate::task::shared_results::SharedResults;
use crate::utils::javascript::JavaScriptRunner;
use async_trait::async_trait;
use crate::utils::polling::wait_until;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

pub const READY_STATE_TIMEOUT_MESSAGE: &str = "Ready state is not complete.";
pub const PAGE_SOURCE_TIMEOUT_MESSAGE: &str = "The page resource should match";

pub struct BeforeUrl;
pub struct AfterUrl;
pub struct BeforeCookies;
pub struct AfterCookies;
pub struct BeforeActiveElement;
pub struct AfterActiveElement;
pub struct BeforeWindowHandle;
pub struct AfterWindowHandle;

#[async_trait]
impl LocalTask for BeforeUrl {
    fn name(&self) -> &str {
        "beforeUrl"
    }

    async fn run(&self, results: &mut SharedResults, driver: &dyn WebDriver) -> Result<()> {
        results.before_url = Some(driver.current_url().await?);
        Ok(())
    }
}

#[async_trait]
impl LocalTask for AfterUrl {
    fn name(&self) -> &str {
        "afterUrl"
    }

    async fn run(&self, results: &mut SharedResults, driver: &dyn WebDriver) -> Result<()> {
        let url = driver.current_url().await?;
        results.url = Some(url.clone());
        results.after_url = Some(url);
        Ok(())
    }
}

#[async_trait]
impl LocalTask for BeforeCookies {
    fn name(&self) -> &str {
        "beforeCookies"
    }

    async fn run(&self, results: &mut SharedResults, driver: &dyn WebDriver) -> Result<()> {
        results.before_cookies = Some(driver.cookies().await?);
        Ok(())
    }
}

#[async_trait]
impl LocalTask for AfterCookies {
    fn name(&self) -> &str {
        "afterCookies"
    }

    async fn run(&self, results: &mut SharedResults, driver: &dyn WebDriver) -> Result<()> {
        results.after_cookies = Some(driver.cookies().await?);
        Ok(())
    }
}

#[async_trait]
impl LocalTask for BeforeActiveElement {
    fn name(&self) -> &str {
        "beforeActiveElement"
    }

    async fn run(&self, results: &mut SharedResults, driver: &dyn WebDriver) -> Result<()> {
        results.before_active_element = driver.active_element().await?.map(|e| e.to_string());
        Ok(())
    }
}

#[async_trait]
impl LocalTask for AfterActiveElement {
    fn name(&self) -> &str {
        "afterActiveElement"
    }

    async fn run(&self, results: &mut SharedResults, driver: &dyn WebDriver) -> Result<()> {
        results.after_active_element = driver.active_element().await?.map(|e| e.to_string());
        Ok(())
    }
}

#[async_trait]
impl LocalTask for BeforeWindowHandle {
    fn name(&self) -> &str {
        "beforeWindowHandle"
    }

    async fn run(&self, results: &mut SharedResults, driver: &dyn WebDriver) -> Result<()> {
        results.before_window_handle = Some(driver.window_handle().await?);
        Ok(())
    }
}

#[async_trait]
impl LocalTask for AfterWindowHandle {
    fn name(&self) -> &str {
        "afterWindowHandle"
    }

    async fn run(&self, results: &mut SharedResults, driver: &dyn WebDriver) -> Result<()> {
        results.after_window_handle = Some(driver.window_handle().await?);
        Ok(())
    }
}

/// Waits for `document.readyState` to become `complete`.
pub struct AfterDocumentReadyState {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

#[async_trait]
impl LocalTask for AfterDocumentReadyState {
    fn name(&self) -> &str {
        "afterDocumentReadyState"
    }

    async fn run(&self, results: &mut SharedResults, driver: &dyn WebDriver) -> Result<()> {
        let last = Mutex::new(None);
        let observed = &last;
        let outcome = wait_until(
            move || async move {
                let state = JavaScriptRunner::ready_state(driver).await?;
                let complete = state == "complete";
                if let Ok(mut slot) = observed.lock() {
                    *slot = Some(state);
                }
                Ok(complete)
            },
            self.timeout,
            self.poll_interval,
            READY_STATE_TIMEOUT_MESSAGE,
        )
        .await;
        results.after_document_ready_state = last.into_inner().ok().flatten();
        outcome
    }
}

/// Waits until two consecutive reads of the page source are identical.
pub struct AfterPageSource {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

#[async_trait]
impl LocalTask for AfterPageSource {
    fn name(&self) -> &str {
        "afterPageSource"
    }

    async fn run(&self, results: &mut SharedResults, driver: &dyn WebDriver) -> Result<()> {
        let previous: Mutex<Option<String>> = Mutex::new(None);
        let seen = &previous;
        let outcome = wait_until(
            move || async move {
                let current = driver.page_source().await?;
                let mut previous = seen
                    .lock()
                    .map_err(|_| BrowserError::SessionFailed("page source lock poisoned".to_string()))?;
                let settled = previous.as_deref() == Some(current.as_str());
                if !settled {
                    debug!("page source still changing");
                }
                *previous = Some(current);
                Ok(settled)
            },
            self.timeout,
            self.poll_interval,
            PAGE_SOURCE_TIMEOUT_MESSAGE,
        )
        .await;
        results.after_page_source = previous.into_inner().ok().flatten();
        outcome
    }
}

pub fn navigation_tasks(config: &TaskConfig) -> TaskEvents {
    TaskEvents::new(
        Task::new().with_local(BeforeUrl),
        Task::new()
            .with_local(AfterUrl)
            .with_local(AfterDocumentReadyState {
                timeout: config.hook_timeout(),
                poll_interval: config.hook_poll_interval(),
            })
            .with_local(AfterPageSource {
                timeout: config.hook_timeout(),
                poll_interval: config.hook_poll_interval(),
            }),
    )
}

pub fn cookie_tasks() -> TaskEvents {
    TaskEvents::new(
        Task::new().with_local(BeforeCookies),
        Task::new().with_local(AfterCookies),
    )
}

pub fn frame_tasks() -> TaskEvents {
    TaskEvents::new(
        Task::new().with_local(BeforeActiveElement),
        Task::new().with_local(AfterActiveElement),
    )
}

pub fn window_tasks() -> TaskEvents {
    TaskEvents::new(
        Task::new().with_local(BeforeWindowHandle),
        Task::new().with_local(AfterWindowHandle),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDriver;

    fn page() -> MockDriver {
        MockDriver::new().with_page(
            "http://localhost/index.html",
            "<html><body><p>hi</p></body></html>",
        )
    }

    #[tokio::test(start_paused = true)]
    async fn ready_state_and_page_source_settle() {
        let driver = page();
        driver.get("http://localhost/index.html").await.unwrap();
        let mut results = SharedResults::new();

        let config = TaskConfig::default();
        let events = navigation_tasks(&config);
        for task in events.after.local.iter() {
            task.run(&mut results, &driver).await.unwrap();
        }
        assert_eq!(results.after_url.as_deref(), Some("http://localhost/index.html"));
        assert_eq!(results.after_document_ready_state.as_deref(), Some("complete"));
        assert!(results.after_page_source.unwrap().contains("<p>hi</p>"));
    }

    #[tokio::test(start_paused = true)]
    async fn ready_state_times_out_with_message() {
        let driver = page();
        driver.get("http://localhost/index.html").await.unwrap();
        driver.set_ready_state("loading");
        let task = AfterDocumentReadyState {
            timeout: Duration::from_millis(5000),
            poll_interval: Duration::from_millis(500),
        };
        let mut results = SharedResults::new();
        let err = task.run(&mut results, &driver).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Timeout error: {}", READY_STATE_TIMEOUT_MESSAGE));
        assert_eq!(results.after_document_ready_state.as_deref(), Some("loading"));
    }

    #[tokio::test(start_paused = true)]
    async fn page_source_that_never_settles_times_out() {
        let driver = page();
        driver.get("http://localhost/index.html").await.unwrap();
        driver.set_mutating_source(true);
        let task = AfterPageSource {
            timeout: Duration::from_millis(2000),
            poll_interval: Duration::from_millis(500),
        };
        let mut results = SharedResults::new();
        let err = task.run(&mut results, &driver).await.unwrap_err();
        assert!(matches!(err, BrowserError::Timeout(ref m) if m == PAGE_SOURCE_TIMEOUT_MESSAGE));
        assert!(results.after_page_source.unwrap().contains("<p>hi</p>"));
    }

    #[tokio::test]
    async fn cookie_snapshots() {
        let driver = page();
        driver.get("http://localhost/index.html").await.unwrap();
        let mut results = SharedResults::new();
        BeforeCookies.run(&mut results, &driver).await.unwrap();
        driver
            .add_cookie(crate::types::Cookie::new("a", "1"))
            .await
            .unwrap();
        AfterCookies.run(&mut results, &driver).await.unwrap();
        assert_eq!(results.before_cookies.unwrap().len(), 0);
        assert_eq!(results.after_cookies.unwrap()[0].name, "a");
    }
}
