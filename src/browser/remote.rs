use crate::core::config::Capabilities;
use crate::core::driver::{ElementRef, FrameTarget, WebDriver, DEFAULT_PAGE_LOAD_TIMEOUT};
use crate::dom::locator::{NativeLocator, Strategy};
use crate::errors::{BrowserError, Result};
use crate::types::{Cookie, ElementRect};
use async_trait::async_trait;
use fantoccini::actions::{InputSource, MouseActions, PointerAction, MOUSE_BUTTON_LEFT};
use fantoccini::elements::Element;
use fantoccini::wd::{TimeoutConfiguration, WindowHandle};
use fantoccini::{Client, ClientBuilder, Locator as WdLocator};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

type WdCookie = fantoccini::cookies::Cookie<'static>;

fn driver_error(err: fantoccini::error::CmdError) -> BrowserError {
    BrowserError::from_driver_message(err.to_string())
}

fn from_wd_cookie(c: &WdCookie) -> Cookie {
    let mut cookie = Cookie::new(c.name(), c.value());
    cookie.domain = c.domain().map(str::to_string);
    cookie.path = c.path().map(str::to_string);
    cookie.expiry = c.expires_datetime().map(|at| at.unix_timestamp());
    cookie.secure = c.secure();
    cookie.http_only = c.http_only();
    cookie
}

fn to_wd_cookie(cookie: Cookie) -> WdCookie {
    let expires = cookie
        .expires_http_date()
        .and_then(|date| WdCookie::parse(format!("x=y; Expires={}", date)).ok())
        .and_then(|parsed| parsed.expires());
    let mut wd_cookie = WdCookie::new(cookie.name, cookie.value);
    if let Some(domain) = cookie.domain {
        wd_cookie.set_domain(domain);
    }
    if let Some(path) = cookie.path {
        wd_cookie.set_path(path);
    }
    if let Some(expires) = expires {
        wd_cookie.set_expires(expires);
    }
    wd_cookie.set_secure(cookie.secure);
    wd_cookie.set_http_only(cookie.http_only);
    wd_cookie
}

/// W3C WebDriver executor speaking to a remote end over HTTP.
pub struct RemoteDriver {
    client: Client,
}

impl RemoteDriver {
    pub async fn connect(address: &str, capabilities: &Capabilities) -> Result<Self> {
        info!(address, browser = %capabilities.browser_name, "connecting to webdriver");
        let client = ClientBuilder::native()
            .capabilities(capabilities.to_map()?)
            .connect(address)
            .await
            .map_err(|e| BrowserError::SessionFailed(format!("{}: {}", address, e)))?;
        Ok(Self { client })
    }

    fn element(&self, element: &ElementRef) -> Element {
        Element::from_element_id(
            self.client.clone(),
            fantoccini::elements::ElementRef::from(element.id().to_string()),
        )
    }

    fn reference(element: &Element) -> ElementRef {
        ElementRef::new(element.element_id().to_string())
    }

    async fn perform(&self, actions: MouseActions) -> Result<()> {
        self.client
            .perform_actions(actions)
            .await
            .map_err(driver_error)?;
        self.client.release_actions().await.map_err(driver_error)
    }
}

#[async_trait]
impl WebDriver for RemoteDriver {
    fn name(&self) -> &str {
        "remote"
    }

    async fn get(&self, url: &str) -> Result<()> {
        self.client
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self
            .client
            .current_url()
            .await
            .map_err(driver_error)?
            .to_string())
    }

    async fn title(&self) -> Result<String> {
        self.client.title().await.map_err(driver_error)
    }

    async fn page_source(&self) -> Result<String> {
        self.client.source().await.map_err(driver_error)
    }

    async fn back(&self) -> Result<()> {
        self.client.back().await.map_err(driver_error)
    }

    async fn forward(&self) -> Result<()> {
        self.client.forward().await.map_err(driver_error)
    }

    async fn refresh(&self) -> Result<()> {
        self.client.refresh().await.map_err(driver_error)
    }

    async fn page_load_timeout(&self) -> Result<Duration> {
        let timeouts = self.client.get_timeouts().await.map_err(driver_error)?;
        Ok(timeouts.page_load().unwrap_or(DEFAULT_PAGE_LOAD_TIMEOUT))
    }

    async fn set_page_load_timeout(&self, timeout: Duration) -> Result<()> {
        self.client
            .update_timeouts(TimeoutConfiguration::new(None, Some(timeout), None))
            .await
            .map_err(driver_error)
    }

    async fn find_elements(
        &self,
        using: Option<&ElementRef>,
        locator: &NativeLocator,
    ) -> Result<Vec<ElementRef>> {
        let found = match locator.strategy {
            Strategy::Js => {
                let mut args = locator.args.clone();
                args.push(using.map(ElementRef::to_json).unwrap_or(Value::Null));
                let value = self.execute_script(&locator.value, args).await?;
                return ElementRef::list_from_json(value);
            }
            _ => {
                let native = locator.to_css_or_xpath();
                let wd = match native.strategy {
                    Strategy::XPath => WdLocator::XPath(&native.value),
                    _ => WdLocator::Css(&native.value),
                };
                debug!(locator = %native, "find_elements");
                match using {
                    Some(scope) => self.element(scope).find_all(wd).await,
                    None => self.client.find_all(wd).await,
                }
            }
        };
        Ok(found
            .map_err(driver_error)?
            .iter()
            .map(Self::reference)
            .collect())
    }

    async fn active_element(&self) -> Result<Option<ElementRef>> {
        match self.client.active_element().await {
            Ok(element) => Ok(Some(Self::reference(&element))),
            Err(e) => match driver_error(e) {
                BrowserError::NoSuchElement(_) => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.client
            .execute(script, args)
            .await
            .map_err(driver_error)
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.element(element).click().await.map_err(driver_error)
    }

    async fn pointer_click(&self, element: &ElementRef) -> Result<()> {
        let actions = MouseActions::new("mouse".to_string())
            .then(PointerAction::MoveToElement {
                element: self.element(element),
                duration: None,
                x: 0,
                y: 0,
            })
            .then(PointerAction::Down {
                button: MOUSE_BUTTON_LEFT,
            })
            .then(PointerAction::Up {
                button: MOUSE_BUTTON_LEFT,
            });
        self.perform(actions).await
    }

    async fn long_press(&self, element: &ElementRef, hold: Duration) -> Result<()> {
        let actions = MouseActions::new("mouse".to_string())
            .then(PointerAction::MoveToElement {
                element: self.element(element),
                duration: None,
                x: 0,
                y: 0,
            })
            .then(PointerAction::Down {
                button: MOUSE_BUTTON_LEFT,
            })
            .then(PointerAction::Pause { duration: hold })
            .then(PointerAction::Up {
                button: MOUSE_BUTTON_LEFT,
            });
        self.perform(actions).await
    }

    async fn tap(&self, element: &ElementRef) -> Result<()> {
        self.click(element).await
    }

    async fn clear(&self, element: &ElementRef) -> Result<()> {
        self.element(element).clear().await.map_err(driver_error)
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.element(element)
            .send_keys(text)
            .await
            .map_err(driver_error)
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        self.element(element).attr(name).await.map_err(driver_error)
    }

    async fn css_value(&self, element: &ElementRef, property: &str) -> Result<String> {
        self.element(element)
            .css_value(property)
            .await
            .map_err(driver_error)
    }

    async fn text(&self, element: &ElementRef) -> Result<String> {
        self.element(element).text().await.map_err(driver_error)
    }

    async fn tag_name(&self, element: &ElementRef) -> Result<String> {
        self.element(element).tag_name().await.map_err(driver_error)
    }

    async fn rect(&self, element: &ElementRef) -> Result<ElementRect> {
        let (x, y, width, height) = self
            .element(element)
            .rectangle()
            .await
            .map_err(driver_error)?;
        Ok(ElementRect::new(x, y, width, height))
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool> {
        self.element(element)
            .is_displayed()
            .await
            .map_err(driver_error)
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool> {
        self.element(element).is_enabled().await.map_err(driver_error)
    }

    async fn is_selected(&self, element: &ElementRef) -> Result<bool> {
        self.element(element)
            .is_selected()
            .await
            .map_err(driver_error)
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        let cookies = self.client.get_all_cookies().await.map_err(driver_error)?;
        Ok(cookies.iter().map(from_wd_cookie).collect())
    }

    async fn add_cookie(&self, cookie: Cookie) -> Result<()> {
        self.client
            .add_cookie(to_wd_cookie(cookie))
            .await
            .map_err(driver_error)
    }

    async fn delete_cookie(&self, name: &str) -> Result<()> {
        self.client.delete_cookie(name).await.map_err(driver_error)
    }

    async fn window_handle(&self) -> Result<String> {
        let handle = self.client.window().await.map_err(driver_error)?;
        Ok(String::from(handle))
    }

    async fn window_handles(&self) -> Result<Vec<String>> {
        let handles = self.client.windows().await.map_err(driver_error)?;
        Ok(handles.into_iter().map(String::from).collect())
    }

    async fn switch_to_window(&self, handle: &str) -> Result<()> {
        let handle = WindowHandle::try_from(handle.to_string())
            .map_err(|e| BrowserError::Driver(format!("bad window handle: {}", e)))?;
        self.client
            .switch_to_window(handle)
            .await
            .map_err(driver_error)
    }

    async fn switch_to_frame(&self, target: &FrameTarget) -> Result<()> {
        match target {
            FrameTarget::Index(index) => self
                .client
                .enter_frame(Some(*index))
                .await
                .map_err(driver_error),
            FrameTarget::Element(element) => self
                .element(element)
                .enter_frame()
                .await
                .map(|_| ())
                .map_err(driver_error),
        }
    }

    async fn switch_to_parent_frame(&self) -> Result<()> {
        self.client
            .enter_parent_frame()
            .await
            .map(|_| ())
            .map_err(driver_error)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.client.screenshot().await.map_err(driver_error)
    }

    async fn quit(&self) -> Result<()> {
        self.client.clone().close().await.map_err(driver_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_expiry_survives_the_wire_form() {
        let cookie = Cookie::new("session", "abc")
            .with_domain("example.com")
            .with_expiry(1_700_000_000)
            .with_secure(true);

        let wd_cookie = to_wd_cookie(cookie.clone());
        assert_eq!(wd_cookie.name(), "session");
        assert_eq!(
            wd_cookie.expires_datetime().map(|at| at.unix_timestamp()),
            Some(1_700_000_000)
        );

        assert_eq!(from_wd_cookie(&wd_cookie), cookie);
    }

    #[test]
    fn session_cookies_have_no_expiry() {
        let wd_cookie = to_wd_cookie(Cookie::new("session", "abc"));
        assert!(wd_cookie.expires().is_none());
        assert_eq!(from_wd_cookie(&wd_cookie).expiry, None);
    }
}
