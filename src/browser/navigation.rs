use crate::browser::session::Browser;
use crate::errors::Result;
use crate::task::helpers::navigation_tasks;
use crate::task::SharedResults;
use tracing::debug;

/// History commands of a session, each run with the navigation hooks.
pub struct Navigation<'a> {
    browser: &'a Browser,
}

impl<'a> Navigation<'a> {
    pub(crate) fn new(browser: &'a Browser) -> Self {
        Self { browser }
    }

    pub async fn to(&self, url: &str) -> Result<()> {
        self.browser.get(url).await
    }

    pub async fn back(&self) -> Result<()> {
        debug!("navigate back");
        let driver = self.browser.driver();
        let driver = driver.as_ref();
        self.browser
            .run(
                Some(&navigation_tasks(&self.browser.config().tasks)),
                &mut SharedResults::new(),
                move || driver.back(),
            )
            .await?;
        Ok(())
    }

    pub async fn forward(&self) -> Result<()> {
        debug!("navigate forward");
        let driver = self.browser.driver();
        let driver = driver.as_ref();
        self.browser
            .run(
                Some(&navigation_tasks(&self.browser.config().tasks)),
                &mut SharedResults::new(),
                move || driver.forward(),
            )
            .await?;
        Ok(())
    }

    pub async fn refresh(&self) -> Result<()> {
        debug!("refresh");
        let driver = self.browser.driver();
        let driver = driver.as_ref();
        self.browser
            .run(
                Some(&navigation_tasks(&self.browser.config().tasks)),
                &mut SharedResults::new(),
                move || driver.refresh(),
            )
            .await?;
        Ok(())
    }
}
