use crate::actions::keys;
use crate::core::config::BrowserConfig;
use crate::core::driver::{ElementRef, FrameTarget, WebDriver, ELEMENT_KEY};
use crate::dom::locator::{NativeLocator, Strategy};
use crate::errors::{BrowserError, Result};
use crate::types::{Cookie, ElementRect};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser as ChromeProcess, LaunchOptions, Tab};
use serde::Deserialize;
use serde_json::{json, Value};
use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Evaluated around every script. Elements crossing the boundary are kept
/// in a per-document table and travel as W3C element references.
const SCRIPT_WRAPPER: &str = r#"(function () {
  var KEY = '__ELEMENT_KEY__';
  var refs = window.__wdRefs;
  if (!refs || refs.doc !== document) {
    refs = window.__wdRefs = {
      doc: document,
      prefix: Math.random().toString(36).slice(2),
      next: 0,
      map: {}
    };
  }
  function isElement(v) { return v && typeof v === 'object' && v.nodeType === 1; }
  function revive(v) {
    if (Array.isArray(v)) { return v.map(revive); }
    if (v && typeof v === 'object') {
      if (typeof v[KEY] === 'string') {
        var el = refs.map[v[KEY]];
        if (!el || !el.isConnected) {
          throw new Error('stale element reference: element is not attached to the page document');
        }
        return el;
      }
      var out = {};
      for (var k in v) { out[k] = revive(v[k]); }
      return out;
    }
    return v;
  }
  function store(v) {
    if (isElement(v)) {
      if (!v.__wdId || refs.map[v.__wdId] !== v) {
        v.__wdId = refs.prefix + ':' + (++refs.next);
        refs.map[v.__wdId] = v;
      }
      var ref = {};
      ref[KEY] = v.__wdId;
      return ref;
    }
    if (Array.isArray(v) || (typeof NodeList !== 'undefined' && v instanceof NodeList)
        || (typeof HTMLCollection !== 'undefined' && v instanceof HTMLCollection)) {
      return Array.prototype.map.call(v, store);
    }
    if (v && typeof v === 'object' && Object.getPrototypeOf(v) === Object.prototype) {
      var out = {};
      for (var k in v) { out[k] = store(v[k]); }
      return out;
    }
    return v === undefined ? null : v;
  }
  try {
    var args = revive(__ARGS__);
    var value = (function () {
__BODY__
    }).apply(null, args);
    return JSON.stringify({ ok: true, value: store(value) });
  } catch (e) {
    return JSON.stringify({ ok: false, error: String((e && e.message) || e) });
  }
})()"#;

const FIND_CSS: &str = "return (arguments[1] || document).querySelectorAll(arguments[0]);";

const FIND_XPATH: &str = r#"var context = arguments[1] || document;
var snapshot = document.evaluate(arguments[0], context, null,
    XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
var found = [];
for (var i = 0; i < snapshot.snapshotLength; i++) { found.push(snapshot.snapshotItem(i)); }
return found;"#;

const ACTIVE_ELEMENT: &str = "return document.activeElement || null;";

const CLICK: &str = r#"var el = arguments[0];
el.scrollIntoView({ block: 'center', inline: 'center' });
var r = el.getBoundingClientRect();
var x = r.left + r.width / 2, y = r.top + r.height / 2;
var top = document.elementFromPoint(x, y);
function tag(n) {
  var cls = n.getAttribute && n.getAttribute('class');
  return '<' + n.tagName.toLowerCase() + (cls ? ' class="' + cls + '"' : '') + '>';
}
if (top && top !== el && !el.contains(top)) {
  throw new Error('element click intercepted: Element ' + tag(el) + ' is not clickable at point ('
    + Math.round(x) + ', ' + Math.round(y) + '). Other element would receive the click: ' + tag(top));
}
el.click();
return null;"#;

const POINTER: &str = r#"var el = arguments[0], types = arguments[1];
el.scrollIntoView({ block: 'center', inline: 'center' });
var r = el.getBoundingClientRect();
var x = r.left + r.width / 2, y = r.top + r.height / 2;
var target = document.elementFromPoint(x, y) || el;
types.forEach(function (type) {
  var init = { bubbles: true, cancelable: true, clientX: x, clientY: y, button: type === 'contextmenu' ? 2 : 0 };
  var Ctor = type.indexOf('pointer') === 0 && typeof PointerEvent !== 'undefined' ? PointerEvent : MouseEvent;
  target.dispatchEvent(new Ctor(type, init));
});
if (types.indexOf('click') >= 0 && target.focus) { target.focus(); }
return null;"#;

const CLEAR: &str = r#"var el = arguments[0];
if ('value' in el) { el.value = ''; } else if (el.isContentEditable) { el.textContent = ''; }
el.dispatchEvent(new Event('input', { bubbles: true }));
el.dispatchEvent(new Event('change', { bubbles: true }));
return null;"#;

const TYPE: &str = r#"var el = arguments[0], text = arguments[1], clear = arguments[2], enter = arguments[3];
if (el.focus) { el.focus(); }
if ('value' in el) {
  el.value = (clear ? '' : el.value) + text;
} else if (el.isContentEditable) {
  el.textContent = (clear ? '' : el.textContent) + text;
}
el.dispatchEvent(new Event('input', { bubbles: true }));
el.dispatchEvent(new Event('change', { bubbles: true }));
if (enter && el.form) {
  if (el.form.requestSubmit) { el.form.requestSubmit(); } else { el.form.submit(); }
}
return null;"#;

const ATTRIBUTE: &str = r#"var el = arguments[0], name = arguments[1];
if (name === 'value' && 'value' in el) { return el.value == null ? null : String(el.value); }
if (name === 'checked' || name === 'selected') { return el[name] ? 'true' : null; }
var booleans = ['disabled', 'readonly', 'required', 'multiple', 'hidden', 'autofocus'];
if (booleans.indexOf(name) >= 0) { return el.hasAttribute(name) ? 'true' : null; }
return el.getAttribute(name);"#;

const CSS_VALUE: &str =
    "return window.getComputedStyle(arguments[0]).getPropertyValue(arguments[1]);";

const TEXT: &str = "return (arguments[0].innerText || arguments[0].textContent || '').trim();";

const TAG_NAME: &str = "return arguments[0].tagName.toLowerCase();";

const RECT: &str = r#"var r = arguments[0].getBoundingClientRect();
return { x: r.left + window.scrollX, y: r.top + window.scrollY, width: r.width, height: r.height };"#;

const DISPLAYED: &str = r#"var el = arguments[0];
if (!el.isConnected) { return false; }
for (var n = el; n && n.nodeType === 1; n = n.parentElement) {
  var s = window.getComputedStyle(n);
  if (s.display === 'none') { return false; }
}
var style = window.getComputedStyle(el);
if (style.visibility === 'hidden' || style.visibility === 'collapse' || style.opacity === '0') {
  return false;
}
var r = el.getBoundingClientRect();
return r.width > 0 && r.height > 0;"#;

const ENABLED: &str = "return !arguments[0].disabled;";

const SELECTED: &str = "return !!(arguments[0].checked || arguments[0].selected);";

/// `Tab`'s own wait timeout until one is set.
const TAB_DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const SET_COOKIE: &str = "document.cookie = arguments[0]; return null;";

#[derive(Deserialize)]
struct ScriptOutcome {
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

fn script_error(message: String) -> BrowserError {
    match BrowserError::from_driver_message(message) {
        BrowserError::Driver(message) => BrowserError::JavaScriptFailed(message),
        other => other,
    }
}

fn wrap(script: &str, args: &[Value]) -> Result<String> {
    let args = serde_json::to_string(args)?;
    let template = SCRIPT_WRAPPER.replace("__ELEMENT_KEY__", ELEMENT_KEY);
    let malformed = || BrowserError::JavaScriptFailed("malformed script wrapper".to_string());
    let (head, rest) = template.split_once("__ARGS__").ok_or_else(malformed)?;
    let (middle, tail) = rest.split_once("__BODY__").ok_or_else(malformed)?;
    Ok(format!("{}{}{}{}{}", head, args, middle, script, tail))
}

/// `document.cookie` assignment for a cookie.
fn cookie_string(cookie: &Cookie) -> String {
    let mut parts = vec![format!("{}={}", cookie.name, cookie.value)];
    if let Some(domain) = &cookie.domain {
        parts.push(format!("domain={}", domain));
    }
    parts.push(format!("path={}", cookie.path.as_deref().unwrap_or("/")));
    if let Some(expires) = cookie.expires_http_date() {
        parts.push(format!("expires={}", expires));
    }
    if cookie.secure == Some(true) {
        parts.push("secure".to_string());
    }
    parts.join("; ")
}

/// Executor driving a locally launched Chrome over the DevTools protocol.
/// Element commands run as page scripts; frames are not supported.
pub struct ChromeDriver {
    process: Mutex<Option<ChromeProcess>>,
    tab: Mutex<Arc<Tab>>,
    page_load_timeout: Mutex<Duration>,
}

impl ChromeDriver {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];
        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        info!(headless = config.headless, "launching chrome");
        let process = ChromeProcess::new(launch_options)
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;
        let tab = process
            .new_tab()
            .map_err(|e| BrowserError::SessionFailed(e.to_string()))?;

        Ok(Self {
            process: Mutex::new(Some(process)),
            tab: Mutex::new(tab),
            page_load_timeout: Mutex::new(TAB_DEFAULT_TIMEOUT),
        })
    }

    fn tab(&self) -> Result<Arc<Tab>> {
        self.tab
            .lock()
            .map(|tab| tab.clone())
            .map_err(|_| BrowserError::SessionFailed("chrome tab lock poisoned".to_string()))
    }

    fn tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let process = self
            .process
            .lock()
            .map_err(|_| BrowserError::SessionFailed("chrome lock poisoned".to_string()))?;
        let process = process
            .as_ref()
            .ok_or_else(|| BrowserError::SessionFailed("chrome has quit".to_string()))?;
        let tabs = process
            .get_tabs()
            .lock()
            .map_err(|_| BrowserError::SessionFailed("chrome tab list poisoned".to_string()))?
            .clone();
        Ok(tabs)
    }

    async fn run(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let expression = wrap(script, &args)?;
        let result = self
            .tab()?
            .evaluate(&expression, false)
            .map_err(|e| BrowserError::JavaScriptFailed(e.to_string()))?;
        let raw = match result.value {
            Some(Value::String(raw)) => raw,
            other => {
                return Err(BrowserError::JavaScriptFailed(format!(
                    "unexpected script result: {:?}",
                    other
                )))
            }
        };
        let outcome: ScriptOutcome = serde_json::from_str(&raw)?;
        if outcome.ok {
            Ok(outcome.value)
        } else {
            Err(script_error(outcome.error.unwrap_or_default()))
        }
    }

    async fn on_element(&self, script: &str, element: &ElementRef, args: Vec<Value>) -> Result<Value> {
        let mut all = vec![element.to_json()];
        all.extend(args);
        self.run(script, all).await
    }

    async fn pointer(&self, element: &ElementRef, events: &[&str]) -> Result<()> {
        self.on_element(POINTER, element, vec![json!(events)]).await?;
        Ok(())
    }

    async fn flag(&self, script: &str, element: &ElementRef) -> Result<bool> {
        Ok(self
            .on_element(script, element, vec![])
            .await?
            .as_bool()
            .unwrap_or(false))
    }

    async fn string(&self, script: &str, element: &ElementRef, args: Vec<Value>) -> Result<String> {
        Ok(self
            .on_element(script, element, args)
            .await?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}

#[async_trait]
impl WebDriver for ChromeDriver {
    fn name(&self) -> &str {
        "chrome"
    }

    async fn get(&self, url: &str) -> Result<()> {
        let tab = self.tab()?;
        tab.navigate_to(url)
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
        tab.wait_until_navigated()
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.tab()?.get_url())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.tab()?.get_title()?)
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.tab()?.get_content()?)
    }

    async fn back(&self) -> Result<()> {
        self.run("history.back(); return null;", vec![]).await?;
        Ok(())
    }

    async fn forward(&self) -> Result<()> {
        self.run("history.forward(); return null;", vec![]).await?;
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        self.tab()?
            .reload(false, None)
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
        Ok(())
    }

    async fn page_load_timeout(&self) -> Result<Duration> {
        self.page_load_timeout
            .lock()
            .map(|timeout| *timeout)
            .map_err(|_| BrowserError::SessionFailed("chrome timeout lock poisoned".to_string()))
    }

    async fn set_page_load_timeout(&self, timeout: Duration) -> Result<()> {
        self.tab()?.set_default_timeout(timeout);
        let mut current = self.page_load_timeout.lock().map_err(|_| {
            BrowserError::SessionFailed("chrome timeout lock poisoned".to_string())
        })?;
        *current = timeout;
        Ok(())
    }

    async fn find_elements(
        &self,
        using: Option<&ElementRef>,
        locator: &NativeLocator,
    ) -> Result<Vec<ElementRef>> {
        let scope = using.map(ElementRef::to_json).unwrap_or(Value::Null);
        let value = match locator.strategy {
            Strategy::Js => {
                let mut args = locator.args.clone();
                args.push(scope);
                self.run(&locator.value, args).await?
            }
            _ => {
                let native = locator.to_css_or_xpath();
                debug!(locator = %native, "find_elements");
                let script = match native.strategy {
                    Strategy::XPath => FIND_XPATH,
                    _ => FIND_CSS,
                };
                self.run(script, vec![json!(native.value), scope]).await?
            }
        };
        ElementRef::list_from_json(value)
    }

    async fn active_element(&self) -> Result<Option<ElementRef>> {
        let value = self.run(ACTIVE_ELEMENT, vec![]).await?;
        Ok(ElementRef::from_json(&value))
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.run(script, args).await
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.on_element(CLICK, element, vec![]).await?;
        Ok(())
    }

    async fn pointer_click(&self, element: &ElementRef) -> Result<()> {
        self.pointer(element, &["pointerdown", "mousedown", "pointerup", "mouseup", "click"])
            .await
    }

    async fn long_press(&self, element: &ElementRef, hold: Duration) -> Result<()> {
        self.pointer(element, &["pointerdown", "mousedown"]).await?;
        tokio::time::sleep(hold).await;
        self.pointer(element, &["contextmenu", "pointerup", "mouseup"])
            .await
    }

    async fn tap(&self, element: &ElementRef) -> Result<()> {
        self.pointer(element, &["pointerdown", "pointerup", "click"])
            .await
    }

    async fn clear(&self, element: &ElementRef) -> Result<()> {
        self.on_element(CLEAR, element, vec![]).await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        let (clears, printable) = keys::printable(text);
        let enter = text.contains(keys::ENTER);
        self.on_element(
            TYPE,
            element,
            vec![json!(printable), json!(clears), json!(enter)],
        )
        .await?;
        Ok(())
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        let value = self.on_element(ATTRIBUTE, element, vec![json!(name)]).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn css_value(&self, element: &ElementRef, property: &str) -> Result<String> {
        self.string(CSS_VALUE, element, vec![json!(property)]).await
    }

    async fn text(&self, element: &ElementRef) -> Result<String> {
        self.string(TEXT, element, vec![]).await
    }

    async fn tag_name(&self, element: &ElementRef) -> Result<String> {
        self.string(TAG_NAME, element, vec![]).await
    }

    async fn rect(&self, element: &ElementRef) -> Result<ElementRect> {
        let value = self.on_element(RECT, element, vec![]).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool> {
        self.flag(DISPLAYED, element).await
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool> {
        self.flag(ENABLED, element).await
    }

    async fn is_selected(&self, element: &ElementRef) -> Result<bool> {
        self.flag(SELECTED, element).await
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        let cookies = self.tab()?.get_cookies()?;
        Ok(cookies
            .into_iter()
            .map(|c| {
                let mut cookie = Cookie::new(c.name, c.value);
                cookie.domain = Some(c.domain);
                cookie.path = Some(c.path);
                cookie.expiry = (!c.session).then_some(c.expires as i64);
                cookie.http_only = Some(c.http_only);
                cookie.secure = Some(c.secure);
                cookie
            })
            .collect())
    }

    async fn add_cookie(&self, cookie: Cookie) -> Result<()> {
        self.run(SET_COOKIE, vec![json!(cookie_string(&cookie))])
            .await?;
        Ok(())
    }

    async fn delete_cookie(&self, name: &str) -> Result<()> {
        let expired = format!("{}=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/", name);
        self.run(SET_COOKIE, vec![json!(expired)]).await?;
        Ok(())
    }

    async fn window_handle(&self) -> Result<String> {
        Ok(self.tab()?.get_target_id().to_string())
    }

    async fn window_handles(&self) -> Result<Vec<String>> {
        Ok(self
            .tabs()?
            .iter()
            .map(|tab| tab.get_target_id().to_string())
            .collect())
    }

    async fn switch_to_window(&self, handle: &str) -> Result<()> {
        let target = self
            .tabs()?
            .into_iter()
            .find(|tab| tab.get_target_id() == handle)
            .ok_or_else(|| {
                BrowserError::Driver(format!("no such window: {}", handle))
            })?;
        target
            .activate()
            .map_err(|e| BrowserError::Driver(e.to_string()))?;
        let mut current = self
            .tab
            .lock()
            .map_err(|_| BrowserError::SessionFailed("chrome tab lock poisoned".to_string()))?;
        *current = target;
        Ok(())
    }

    async fn switch_to_frame(&self, target: &FrameTarget) -> Result<()> {
        Err(BrowserError::NotSupported(format!(
            "switching to frame {:?} on the chrome executor",
            target
        )))
    }

    async fn switch_to_parent_frame(&self) -> Result<()> {
        Err(BrowserError::NotSupported(
            "frames on the chrome executor".to_string(),
        ))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.tab()?
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| BrowserError::Driver(e.to_string()))
    }

    async fn quit(&self) -> Result<()> {
        let process = self
            .process
            .lock()
            .map_err(|_| BrowserError::SessionFailed("chrome lock poisoned".to_string()))?
            .take();
        info!(running = process.is_some(), "closing chrome");
        drop(process);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_script_embeds_args_and_body() {
        let script = wrap("return arguments[0];", &[json!("a"), json!(1)]).unwrap();
        assert!(script.contains(r#"revive(["a",1])"#));
        assert!(script.contains("return arguments[0];"));
        assert!(script.contains(ELEMENT_KEY));
        assert!(!script.contains("__BODY__"));
    }

    #[test]
    fn placeholder_text_in_args_or_body_stays_literal() {
        let script = wrap("return '__ARGS__';", &[json!("__BODY__")]).unwrap();
        assert!(script.contains(r#"revive(["__BODY__"])"#));
        assert!(script.contains("return '__ARGS__';"));
        assert_eq!(script.matches("return '__ARGS__';").count(), 1);
    }

    #[test]
    fn script_errors_keep_their_class() {
        assert!(matches!(
            script_error("stale element reference: element is not attached".into()),
            BrowserError::StaleElement(_)
        ));
        assert!(matches!(
            script_error(
                "element click intercepted: Other element would receive the click: <div>".into()
            ),
            BrowserError::ClickIntercepted(_)
        ));
        assert!(matches!(
            script_error("boom".into()),
            BrowserError::JavaScriptFailed(_)
        ));
    }

    #[test]
    fn cookie_string_carries_attributes() {
        let mut cookie = Cookie::new("session", "abc");
        cookie.domain = Some("example.com".into());
        cookie.expiry = Some(0);
        cookie.secure = Some(true);
        assert_eq!(
            cookie_string(&cookie),
            "session=abc; domain=example.com; path=/; expires=Thu, 01 Jan 1970 00:00:00 GMT; secure"
        );
    }
}
