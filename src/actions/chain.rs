use crate::actions::base::{click_with_recovery, Position, Slowness};
use crate::actions::context::ActionContext;
use crate::actions::find::{retrying_find, FindOptions, FindOutcome};
use crate::browser::Browser;
use crate::core::driver::WebElement;
use crate::dom::locator::Locator;
use crate::errors::{BrowserError, Result};
use crate::utils::javascript::{restore_context_menu, suppress_context_menu};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// How long `long_press` holds the pointer down.
pub const LONG_PRESS_HOLD: Duration = Duration::from_millis(1000);

/// Positional action language:
///
/// ```ignore
/// let actions = browser.actions();
/// actions.see("Sandwich Order Form", None).await?;
/// actions.under("Cheese").see("Provolone", None).await?;
/// actions.under("Cheese").not().see("American", None).await?;
/// actions.click("Order Sandwich").await?;
/// ```
///
/// Modifiers return new chains, so a partially built chain can be kept and
/// reused.
#[derive(Clone, Debug)]
pub struct ChainedAction {
    context: ActionContext,
}

/// A chain that expects its locator to match nothing.
#[derive(Clone, Debug)]
pub struct NotChain {
    chain: ChainedAction,
}

impl NotChain {
    pub async fn see(
        &self,
        locator: impl Into<Locator>,
        options: Option<FindOptions>,
    ) -> Result<bool> {
        self.chain.see(locator, options).await
    }
}

impl ChainedAction {
    pub fn new(browser: Browser) -> Self {
        Self::from_context(ActionContext::new(browser))
    }

    fn from_context(context: ActionContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ActionContext {
        &self.context
    }

    fn with(&self, position: Position, locator: impl Into<Locator>) -> Self {
        Self::from_context(self.context.with_locator(position, locator.into()))
    }

    /// Below the anchor and in the same vertical band.
    pub fn under(&self, locator: impl Into<Locator>) -> Self {
        self.with(Position::Under, locator)
    }

    pub fn below(&self, locator: impl Into<Locator>) -> Self {
        self.with(Position::Below, locator)
    }

    pub fn inside(&self, locator: impl Into<Locator>) -> Self {
        self.with(Position::Inside, locator)
    }

    pub fn right_of(&self, locator: impl Into<Locator>) -> Self {
        self.with(Position::RightOf, locator)
    }

    pub fn left_of(&self, locator: impl Into<Locator>) -> Self {
        self.with(Position::LeftOf, locator)
    }

    pub fn slow(&self) -> Self {
        Self::from_context(self.context.with_slowness(Slowness::Slow))
    }

    pub fn agonizingly_slow(&self) -> Self {
        Self::from_context(self.context.with_slowness(Slowness::AgonizinglySlow))
    }

    pub fn not(&self) -> NotChain {
        NotChain {
            chain: Self::from_context(self.context.with_not(true)),
        }
    }

    fn describe(&self, action: &str, args: &str) -> String {
        let description = format!("{}{}({})", self.context.description(), action, args);
        info!("{}", description);
        description
    }

    async fn get_element(&self, locator: Locator, description: &str) -> Result<WebElement> {
        let context = self.context.with_locator(Position::Global, locator);
        let outcome = retrying_find(
            context.browser(),
            context.locators(),
            context.timeout(),
            description,
            &FindOptions::allow_unseen(),
            false,
        )
        .await?;
        match outcome {
            FindOutcome::Found(element) => Ok(element),
            FindOutcome::Absent => Err(BrowserError::Driver(
                "an element is expected, but the chain settled on no element".to_string(),
            )),
        }
    }

    /// True once the chain matches, or matches nothing when negated.
    /// `Ok(false)` when the tier's timeout runs out first.
    pub async fn see(
        &self,
        locator: impl Into<Locator>,
        options: Option<FindOptions>,
    ) -> Result<bool> {
        let locator = locator.into();
        let args = match &options {
            Some(options) => format!("{}, {}", locator, serde_json::to_string(options)?),
            None => locator.to_string(),
        };
        let description = self.describe("see", &args);
        let options = options.unwrap_or_default();
        let context = self.context.with_locator(Position::Global, locator);
        let found = retrying_find(
            context.browser(),
            context.locators(),
            context.timeout(),
            &description,
            &options,
            context.want_zero(),
        )
        .await;
        match found {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// The first element the chain settles on, or `None` if nothing turned
    /// up in time. Every other failure is an error.
    pub async fn find(&self, locator: impl Into<Locator>) -> Result<Option<WebElement>> {
        let locator = locator.into();
        let description = self.describe("find", &locator.to_string());
        match self.get_element(locator, &description).await {
            Ok(element) => Ok(Some(element)),
            Err(BrowserError::NotFound { description: failed }) if failed == description => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn click(&self, locator: impl Into<Locator>) -> Result<()> {
        let locator = locator.into();
        let description = self.describe("click", &locator.to_string());
        let element = self.get_element(locator, &description).await?;
        click_with_recovery(&element).await
    }

    /// Touch long press. The page's context menu is switched off for the
    /// duration of the gesture and restored even when the gesture fails.
    pub async fn long_press(&self, locator: impl Into<Locator>) -> Result<()> {
        let locator = locator.into();
        let description = self.describe("longPress", &locator.to_string());
        let element = self.get_element(locator, &description).await?;

        let driver = element.driver();
        let prefix = format!("browserTest{}", Uuid::new_v4().simple());
        driver
            .execute_script(&suppress_context_menu(&prefix), vec![])
            .await?;
        let pressed = driver.long_press(element.reference(), LONG_PRESS_HOLD).await;
        let restored = driver
            .execute_script(&restore_context_menu(&prefix), vec![])
            .await;
        pressed?;
        restored?;
        Ok(())
    }

    pub async fn tap(&self, locator: impl Into<Locator>) -> Result<()> {
        let locator = locator.into();
        let description = self.describe("tap", &locator.to_string());
        let element = self.get_element(locator, &description).await?;
        let driver = element.driver();
        driver.tap(element.reference()).await
    }

    /// Sends `text` to whichever element has focus.
    pub async fn type_text(&self, text: &str) -> Result<()> {
        info!("type({})", text);
        let driver = self.context.browser().driver();
        driver.send_keys_to_active(text).await
    }

    /// Navigates to `path`, absolute or relative to the configured base url,
    /// with the extended page-load timeout. The session's own timeout is
    /// put back afterwards.
    pub async fn go(&self, path: &str) -> Result<()> {
        info!("go({})", path);
        let browser = self.context.browser();
        let url = browser.resolve_url(path)?;
        let driver = browser.driver();
        let previous = driver.page_load_timeout().await?;
        driver
            .set_page_load_timeout(browser.config().timeouts.page_load())
            .await?;
        let navigated = browser.get(&url).await;
        driver.set_page_load_timeout(previous).await?;
        navigated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::by::By;
    use crate::testing::MockDriver;
    use crate::Config;
    use std::sync::Arc;

    fn actions() -> ChainedAction {
        let mock = Arc::new(MockDriver::new());
        Browser::new(mock, Config::default()).actions()
    }

    #[test]
    fn modifiers_leave_the_original_chain_untouched() {
        let base = actions();
        let under = base.under("Cheese");
        let both = under.right_of(By::css(".menu"));

        assert!(base.context().locators().is_empty());
        assert_eq!(under.context().locators().len(), 1);
        assert_eq!(both.context().locators().len(), 2);
        assert_eq!(base.slow().context().slowness(), Slowness::Slow);
        assert_eq!(base.context().slowness(), Slowness::Regular);
    }

    #[test]
    fn descriptions_read_like_the_chain() {
        let chain = actions()
            .agonizingly_slow()
            .under("Cheese")
            .left_of(By::css(".price"));
        assert_eq!(
            chain.context().description(),
            "agonizinglySlow.under(\"Cheese\").leftOf(By(css selector, .price))."
        );
        assert_eq!(
            chain.not().chain.context().description(),
            "not.agonizinglySlow.under(\"Cheese\").leftOf(By(css selector, .price))."
        );
    }
}
