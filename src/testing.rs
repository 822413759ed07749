//! In-memory `WebDriver` over static HTML pages.
//!
//! Pages are parsed with `scraper` on every command, so element references
//! are `(generation, document index)` pairs. Navigating or replacing the
//! current page bumps the generation and turns older references stale.
//! Geometry comes from a `data-rect="x,y,width,height"` attribute.

use crate::actions::keys;
use crate::core::driver::{ElementRef, FrameTarget, WebDriver, DEFAULT_PAGE_LOAD_TIMEOUT};
use crate::dom::finders;
use crate::dom::locator::{NativeLocator, ScriptFinder, Strategy};
use crate::errors::{BrowserError, Result};
use crate::types::{Cookie, ElementRect};
use crate::utils::javascript::{ELEMENTS_EQUAL, READY_STATE};
use async_trait::async_trait;
use regex::RegexBuilder;
use scraper::{ElementRef as DomNode, Html, Selector};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use url::Url;

const BLANK_PAGE: &str = "<html><head></head><body></body></html>";
const STALE_MESSAGE: &str =
    "stale element reference: element is not attached to the page document";
/// Smallest valid PNG header, enough for callers that only check the magic.
const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Default)]
struct MockState {
    pages: HashMap<String, String>,
    history: Vec<String>,
    position: usize,
    generation: u64,
    values: HashMap<usize, String>,
    checked: HashMap<usize, bool>,
    focused: Option<usize>,
    cookies: Vec<Cookie>,
    ready_state: String,
    mutating_source: bool,
    source_reads: u64,
    scripts: Vec<String>,
    commands: Vec<String>,
    failures: HashMap<String, VecDeque<BrowserError>>,
    script_results: Vec<(String, Value)>,
    windows: Vec<String>,
    current_window: usize,
    frame_depth: u32,
    page_load_timeout: Option<Duration>,
    quit: bool,
}

impl MockState {
    fn current_url(&self) -> Option<&str> {
        self.history.get(self.position).map(String::as_str)
    }

    fn current_source(&self) -> String {
        self.current_url()
            .and_then(|url| self.pages.get(url))
            .cloned()
            .unwrap_or_else(|| BLANK_PAGE.to_string())
    }

    fn reset_document(&mut self) {
        self.generation += 1;
        self.values.clear();
        self.checked.clear();
        self.focused = None;
    }

    fn navigate(&mut self, url: &str) {
        self.history.truncate(self.position + 1);
        self.history.push(url.to_string());
        self.position = self.history.len() - 1;
        self.reset_document();
    }

    fn take_failure(&mut self, command: &str) -> Result<()> {
        match self.failures.get_mut(command).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.quit {
            Err(BrowserError::SessionFailed(
                "invalid session id: session deleted".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn element_ref(&self, index: usize) -> ElementRef {
        ElementRef::new(format!("{}:{}", self.generation, index))
    }

    /// Document index of a live reference.
    fn index_of(&self, element: &ElementRef) -> Result<usize> {
        let (generation, index) = element
            .id()
            .split_once(':')
            .and_then(|(g, i)| Some((g.parse::<u64>().ok()?, i.parse::<usize>().ok()?)))
            .ok_or_else(|| BrowserError::NoSuchElement(format!("no such element: {}", element)))?;
        if generation != self.generation {
            return Err(BrowserError::StaleElement(STALE_MESSAGE.to_string()));
        }
        Ok(index)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| BrowserError::InvalidLocator(format!("invalid selector {}: {:?}", css, e)))
}

fn all_elements(html: &Html) -> Result<Vec<DomNode<'_>>> {
    let any = selector("*")?;
    Ok(html.select(&any).collect())
}

fn normalized_text(node: &DomNode) -> String {
    node.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_hidden(node: &DomNode) -> bool {
    let element = node.value();
    element.attr("hidden").is_some()
        || element
            .attr("style")
            .map(|s| s.replace(' ', "").contains("display:none"))
            .unwrap_or(false)
        || element.attr("type") == Some("hidden")
}

fn css_property(node: &DomNode, property: &str) -> Option<String> {
    node.value().attr("style").and_then(|style| {
        style.split(';').find_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            (name.trim() == property).then(|| value.trim().to_string())
        })
    })
}

fn parse_rect(node: &DomNode) -> ElementRect {
    node.value()
        .attr("data-rect")
        .map(|raw| {
            let parts: Vec<f64> = raw
                .split(',')
                .filter_map(|p| p.trim().parse::<f64>().ok())
                .collect();
            match parts.as_slice() {
                [x, y, w, h] => ElementRect::new(*x, *y, *w, *h),
                _ => ElementRect::default(),
            }
        })
        .unwrap_or_default()
}

pub struct MockDriver {
    state: Mutex<MockState>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                ready_state: "complete".to_string(),
                windows: vec!["window-1".to_string()],
                ..Default::default()
            }),
        }
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.add_page(url, html);
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockState>> {
        self.state
            .lock()
            .map_err(|_| BrowserError::Driver("mock driver state poisoned".to_string()))
    }

    pub fn add_page(&self, url: &str, html: &str) {
        if let Ok(mut state) = self.lock() {
            state.pages.insert(url.to_string(), html.to_string());
        }
    }

    /// Swaps the markup of `url`. If it is the current page, every existing
    /// element reference goes stale.
    pub fn replace_page(&self, url: &str, html: &str) {
        if let Ok(mut state) = self.lock() {
            state.pages.insert(url.to_string(), html.to_string());
            if state.current_url() == Some(url) {
                state.reset_document();
            }
        }
    }

    /// Queues an error returned by the next call of `command` (`click`,
    /// `pointer_click`, `find_elements`, `execute_script`, `get`, ...).
    pub fn fail_next(&self, command: &str, err: BrowserError) {
        if let Ok(mut state) = self.lock() {
            state
                .failures
                .entry(command.to_string())
                .or_default()
                .push_back(err);
        }
    }

    /// Canned result for scripts containing `needle`.
    pub fn on_script(&self, needle: &str, result: Value) {
        if let Ok(mut state) = self.lock() {
            state.script_results.push((needle.to_string(), result));
        }
    }

    pub fn set_ready_state(&self, ready_state: &str) {
        if let Ok(mut state) = self.lock() {
            state.ready_state = ready_state.to_string();
        }
    }

    /// Makes every page-source read differ from the previous one.
    pub fn set_mutating_source(&self, mutating: bool) {
        if let Ok(mut state) = self.lock() {
            state.mutating_source = mutating;
        }
    }

    pub fn open_window(&self) -> String {
        match self.lock() {
            Ok(mut state) => {
                let handle = format!("window-{}", state.windows.len() + 1);
                state.windows.push(handle.clone());
                handle
            }
            Err(_) => String::new(),
        }
    }

    pub fn executed_scripts(&self) -> Vec<String> {
        self.lock().map(|s| s.scripts.clone()).unwrap_or_default()
    }

    /// Element and session commands in the order they were received.
    pub fn commands(&self) -> Vec<String> {
        self.lock().map(|s| s.commands.clone()).unwrap_or_default()
    }

    pub fn command_count(&self, prefix: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn frame_depth(&self) -> u32 {
        self.lock().map(|s| s.frame_depth).unwrap_or_default()
    }

    pub fn current_page_load_timeout(&self) -> Option<Duration> {
        self.lock().ok().and_then(|s| s.page_load_timeout)
    }

    pub fn has_quit(&self) -> bool {
        self.lock().map(|s| s.quit).unwrap_or(true)
    }

    /// Runs `f` against the parsed current document.
    fn with_dom<R>(
        &self,
        command: &str,
        f: impl FnOnce(&Html, &mut MockState) -> Result<R>,
    ) -> Result<R> {
        let mut state = self.lock()?;
        state.ensure_alive()?;
        state.take_failure(command)?;
        let html = Html::parse_document(&state.current_source());
        f(&html, &mut state)
    }

    /// Runs `f` against one live element.
    fn with_element<R>(
        &self,
        command: &str,
        element: &ElementRef,
        f: impl FnOnce(&DomNode, usize, &mut MockState) -> Result<R>,
    ) -> Result<R> {
        self.with_dom(command, |html, state| {
            let index = state.index_of(element)?;
            state.commands.push(format!("{}:{}", command, element));
            let nodes = all_elements(html)?;
            let node = nodes
                .get(index)
                .ok_or_else(|| BrowserError::StaleElement(STALE_MESSAGE.to_string()))?;
            f(node, index, state)
        })
    }

    fn scoped_select(
        html: &Html,
        state: &MockState,
        using: Option<&ElementRef>,
        css: &str,
    ) -> Result<Vec<ElementRef>> {
        let sel = selector(css)?;
        let nodes = all_elements(html)?;
        let index_of = |node: &DomNode| nodes.iter().position(|n| n.id() == node.id());
        let matches: Vec<usize> = match using {
            Some(scope) => {
                let scope_index = state.index_of(scope)?;
                let scope_node = nodes
                    .get(scope_index)
                    .ok_or_else(|| BrowserError::StaleElement(STALE_MESSAGE.to_string()))?;
                scope_node.select(&sel).filter_map(|n| index_of(&n)).collect()
            }
            None => html.select(&sel).filter_map(|n| index_of(&n)).collect(),
        };
        Ok(matches.into_iter().map(|i| state.element_ref(i)).collect())
    }

    fn filter_scoped<F>(
        html: &Html,
        state: &MockState,
        using: Option<&ElementRef>,
        css: &str,
        keep: F,
    ) -> Result<Vec<ElementRef>>
    where
        F: Fn(&DomNode, usize) -> bool,
    {
        let candidates = Self::scoped_select(html, state, using, css)?;
        let nodes = all_elements(html)?;
        let mut kept = vec![];
        for candidate in candidates {
            let index = state.index_of(&candidate)?;
            if let Some(node) = nodes.get(index) {
                if keep(node, index) {
                    kept.push(candidate);
                }
            }
        }
        Ok(kept)
    }

    fn value_of(state: &MockState, node: &DomNode, index: usize) -> String {
        state
            .values
            .get(&index)
            .cloned()
            .or_else(|| node.value().attr("value").map(str::to_string))
            .unwrap_or_default()
    }

    fn activate(node: &DomNode, index: usize, state: &mut MockState) -> Result<()> {
        state.focused = Some(index);
        let element = node.value();
        match element.name() {
            "a" => {
                if let Some(href) = element.attr("href") {
                    let base = state.current_url().unwrap_or("about:blank").to_string();
                    let target = Url::parse(&base)?.join(href)?;
                    state.navigate(target.as_str());
                }
            }
            "input" if matches!(element.attr("type"), Some("checkbox") | Some("radio")) => {
                let current = state
                    .checked
                    .get(&index)
                    .copied()
                    .unwrap_or(element.attr("checked").is_some());
                state.checked.insert(index, !current);
            }
            _ => {}
        }
        Ok(())
    }

    fn emulate_finder(
        html: &Html,
        state: &MockState,
        finder: &ScriptFinder,
        using: Option<&ElementRef>,
    ) -> Result<Option<Vec<ElementRef>>> {
        let arg = |i: usize| {
            finder
                .args
                .get(i)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let buttons = r#"button, input[type="button"], input[type="submit"]"#;
        let button_text = |node: &DomNode, index: usize| {
            if node.value().name() == "button" {
                normalized_text(node)
            } else {
                Self::value_of(state, node, index)
            }
        };
        let found = match finder.name.as_str() {
            "buttonText" => {
                let wanted = arg(0);
                Self::filter_scoped(html, state, using, buttons, |node, index| {
                    button_text(node, index).trim() == wanted
                })?
            }
            "partialButtonText" => {
                let wanted = arg(0);
                Self::filter_scoped(html, state, using, buttons, |node, index| {
                    button_text(node, index).contains(&wanted)
                })?
            }
            "cssContainingText" => {
                let css = arg(0);
                let search = arg(1);
                match finders::parse_regexp(&search) {
                    Some((pattern, flags)) => {
                        let regex = RegexBuilder::new(pattern)
                            .case_insensitive(flags.contains('i'))
                            .multi_line(flags.contains('m'))
                            .build()
                            .map_err(|e| BrowserError::JavaScriptFailed(e.to_string()))?;
                        Self::filter_scoped(html, state, using, &css, |node, _| {
                            regex.is_match(&normalized_text(node))
                        })?
                    }
                    None => Self::filter_scoped(html, state, using, &css, |node, _| {
                        normalized_text(node).contains(&search)
                    })?,
                }
            }
            "text" => {
                let wanted = arg(0);
                Self::filter_scoped(html, state, using, "*", |node, index| {
                    match node.value().name() {
                        "script" | "style" | "html" | "head" => false,
                        "input" | "textarea" => {
                            Self::value_of(state, node, index) == wanted
                                || node.value().attr("placeholder") == Some(wanted.as_str())
                        }
                        _ => {
                            normalized_text(node) == wanted
                                && !node
                                    .children()
                                    .filter_map(DomNode::wrap)
                                    .any(|child| normalized_text(&child) == wanted)
                        }
                    }
                })?
            }
            _ => return Ok(None),
        };
        Ok(Some(found))
    }
}

#[async_trait]
impl WebDriver for MockDriver {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get(&self, url: &str) -> Result<()> {
        let mut state = self.lock()?;
        state.ensure_alive()?;
        state.take_failure("get")?;
        state.commands.push(format!("get:{}", url));
        state.navigate(url);
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let state = self.lock()?;
        state.ensure_alive()?;
        Ok(state.current_url().unwrap_or("about:blank").to_string())
    }

    async fn title(&self) -> Result<String> {
        self.with_dom("title", |html, _| {
            let title = selector("title")?;
            Ok(html
                .select(&title)
                .next()
                .map(|t| normalized_text(&t))
                .unwrap_or_default())
        })
    }

    async fn page_source(&self) -> Result<String> {
        let mut state = self.lock()?;
        state.ensure_alive()?;
        let mut source = state.current_source();
        if state.mutating_source {
            state.source_reads += 1;
            source.push_str(&format!("<!-- {} -->", state.source_reads));
        }
        Ok(source)
    }

    async fn back(&self) -> Result<()> {
        let mut state = self.lock()?;
        if state.position > 0 {
            state.position -= 1;
            state.reset_document();
        }
        Ok(())
    }

    async fn forward(&self) -> Result<()> {
        let mut state = self.lock()?;
        if state.position + 1 < state.history.len() {
            state.position += 1;
            state.reset_document();
        }
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        self.lock()?.reset_document();
        Ok(())
    }

    async fn page_load_timeout(&self) -> Result<Duration> {
        Ok(self
            .lock()?
            .page_load_timeout
            .unwrap_or(DEFAULT_PAGE_LOAD_TIMEOUT))
    }

    async fn set_page_load_timeout(&self, timeout: Duration) -> Result<()> {
        let mut state = self.lock()?;
        state
            .commands
            .push(format!("page_load_timeout:{}", timeout.as_millis()));
        state.page_load_timeout = Some(timeout);
        Ok(())
    }

    async fn find_elements(
        &self,
        using: Option<&ElementRef>,
        locator: &NativeLocator,
    ) -> Result<Vec<ElementRef>> {
        self.with_dom("find_elements", |html, state| match locator.strategy {
            Strategy::LinkText | Strategy::PartialLinkText => {
                let exact = locator.strategy == Strategy::LinkText;
                Self::filter_scoped(html, state, using, "a", |node, _| {
                    let text = normalized_text(node);
                    if exact {
                        text == locator.value
                    } else {
                        text.contains(&locator.value)
                    }
                })
            }
            Strategy::XPath => Err(BrowserError::NotSupported(
                "xpath is not available in the mock driver".to_string(),
            )),
            Strategy::Js => {
                let canned = state
                    .script_results
                    .iter()
                    .find(|(needle, _)| locator.value.contains(needle.as_str()))
                    .map(|(_, v)| v.clone())
                    .unwrap_or(Value::Null);
                ElementRef::list_from_json(canned)
            }
            _ => {
                let css = locator.to_css_or_xpath();
                Self::scoped_select(html, state, using, &css.value)
            }
        })
    }

    async fn find_elements_by_script(
        &self,
        finder: &ScriptFinder,
        using: Option<&ElementRef>,
    ) -> Result<Vec<ElementRef>> {
        let emulated = self.with_dom("find_elements", |html, state| {
            state.scripts.push(finder.script.clone());
            Self::emulate_finder(html, state, finder, using)
        })?;
        match emulated {
            Some(found) => Ok(found),
            None => {
                let mut args = finder.args.clone();
                args.push(using.map(ElementRef::to_json).unwrap_or(Value::Null));
                let value = self.execute_script(&finder.script, args).await?;
                ElementRef::list_from_json(value)
            }
        }
    }

    async fn active_element(&self) -> Result<Option<ElementRef>> {
        let state = self.lock()?;
        Ok(state.focused.map(|i| state.element_ref(i)))
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let mut state = self.lock()?;
        state.ensure_alive()?;
        state.take_failure("execute_script")?;
        state.scripts.push(script.to_string());
        if script == READY_STATE {
            return Ok(Value::String(state.ready_state.clone()));
        }
        if script == ELEMENTS_EQUAL {
            let left = args.first().and_then(ElementRef::from_json);
            let right = args.get(1).and_then(ElementRef::from_json);
            for element in [&left, &right].into_iter().flatten() {
                state.index_of(element)?;
            }
            return Ok(Value::Bool(left.is_some() && left == right));
        }
        Ok(state
            .script_results
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null))
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.with_element("click", element, |node, index, state| {
            Self::activate(node, index, state)
        })
    }

    async fn pointer_click(&self, element: &ElementRef) -> Result<()> {
        self.with_element("pointer_click", element, |node, index, state| {
            Self::activate(node, index, state)
        })
    }

    async fn long_press(&self, element: &ElementRef, _hold: Duration) -> Result<()> {
        self.with_element("long_press", element, |_, _, _| Ok(()))
    }

    async fn tap(&self, element: &ElementRef) -> Result<()> {
        self.with_element("tap", element, |node, index, state| {
            Self::activate(node, index, state)
        })
    }

    async fn clear(&self, element: &ElementRef) -> Result<()> {
        self.with_element("clear", element, |_, index, state| {
            state.values.insert(index, String::new());
            Ok(())
        })
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.with_element("send_keys", element, |node, index, state| {
            let (clears, printable) = keys::printable(text);
            let mut value = if clears {
                String::new()
            } else {
                Self::value_of(state, node, index)
            };
            value.push_str(&printable);
            state.values.insert(index, value);
            state.focused = Some(index);
            Ok(())
        })
    }

    async fn submit(&self, element: &ElementRef) -> Result<()> {
        self.with_element("submit", element, |node, _, state| {
            let form = std::iter::once(**node)
                .chain(node.ancestors())
                .filter_map(DomNode::wrap)
                .find(|n| n.value().name() == "form")
                .ok_or_else(|| {
                    BrowserError::NoSuchElement(
                        "no such element: element is not inside a form".to_string(),
                    )
                })?;
            if let Some(action) = form.value().attr("action") {
                let base = state.current_url().unwrap_or("about:blank").to_string();
                let target = Url::parse(&base)?.join(action)?;
                state.navigate(target.as_str());
            }
            Ok(())
        })
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        self.with_element("attribute", element, |node, index, state| {
            let attr = node.value().attr(name);
            Ok(match name {
                "value" => Some(Self::value_of(state, node, index)),
                "checked" | "selected" => {
                    let on = state
                        .checked
                        .get(&index)
                        .copied()
                        .unwrap_or(attr.is_some());
                    on.then(|| "true".to_string())
                }
                "disabled" | "hidden" | "readonly" | "required" => {
                    attr.map(|_| "true".to_string())
                }
                _ => attr.map(str::to_string),
            })
        })
    }

    async fn css_value(&self, element: &ElementRef, property: &str) -> Result<String> {
        self.with_element("css_value", element, |node, _, _| {
            Ok(css_property(node, property).unwrap_or_default())
        })
    }

    async fn text(&self, element: &ElementRef) -> Result<String> {
        self.with_element("text", element, |node, _, _| {
            Ok(if is_hidden(node) {
                String::new()
            } else {
                normalized_text(node)
            })
        })
    }

    async fn tag_name(&self, element: &ElementRef) -> Result<String> {
        self.with_element("tag_name", element, |node, _, _| {
            Ok(node.value().name().to_string())
        })
    }

    async fn rect(&self, element: &ElementRef) -> Result<ElementRect> {
        self.with_element("rect", element, |node, _, _| Ok(parse_rect(node)))
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool> {
        self.with_element("is_displayed", element, |node, _, _| {
            let hidden = std::iter::once(**node)
                .chain(node.ancestors())
                .filter_map(DomNode::wrap)
                .any(|n| is_hidden(&n));
            Ok(!hidden)
        })
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool> {
        self.with_element("is_enabled", element, |node, _, _| {
            Ok(node.value().attr("disabled").is_none())
        })
    }

    async fn is_selected(&self, element: &ElementRef) -> Result<bool> {
        self.with_element("is_selected", element, |node, index, state| {
            Ok(state.checked.get(&index).copied().unwrap_or(
                node.value().attr("checked").is_some() || node.value().attr("selected").is_some(),
            ))
        })
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        Ok(self.lock()?.cookies.clone())
    }

    async fn add_cookie(&self, cookie: Cookie) -> Result<()> {
        let mut state = self.lock()?;
        state.take_failure("add_cookie")?;
        state.cookies.retain(|c| c.name != cookie.name);
        state.cookies.push(cookie);
        Ok(())
    }

    async fn delete_cookie(&self, name: &str) -> Result<()> {
        self.lock()?.cookies.retain(|c| c.name != name);
        Ok(())
    }

    async fn window_handle(&self) -> Result<String> {
        let state = self.lock()?;
        Ok(state.windows[state.current_window].clone())
    }

    async fn window_handles(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.windows.clone())
    }

    async fn switch_to_window(&self, handle: &str) -> Result<()> {
        let mut state = self.lock()?;
        let index = state
            .windows
            .iter()
            .position(|w| w == handle)
            .ok_or_else(|| BrowserError::Driver(format!("no such window: {}", handle)))?;
        state.current_window = index;
        state.frame_depth = 0;
        Ok(())
    }

    async fn switch_to_frame(&self, target: &FrameTarget) -> Result<()> {
        let mut state = self.lock()?;
        if let FrameTarget::Element(element) = target {
            state.index_of(element)?;
        }
        state.frame_depth += 1;
        state.focused = None;
        Ok(())
    }

    async fn switch_to_parent_frame(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.frame_depth = state.frame_depth.saturating_sub(1);
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.lock()?.ensure_alive()?;
        Ok(PNG_MAGIC.to_vec())
    }

    async fn quit(&self) -> Result<()> {
        self.lock()?.quit = true;
        Ok(())
    }
}
