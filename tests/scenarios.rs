use protractor::keys;
use protractor::testing::MockDriver;
use protractor::{Browser, BrowserError, By, Config, FindOptions, SharedResults, TaskOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const INDEX: &str = r#"<html><head><title>Index</title></head><body>
    <nav>
      <a class="nav-page1" href="page1.html">One</a>
      <a class="nav-page1" href="page1.html">One again</a>
      <a class="nav-page1" href="page1.html">Still one</a>
      <a class="nav-page1" href="page1.html">One more</a>
      <a class="nav-page1" href="page1.html">Last one</a>
      <a class="nav-page2" href="page2.html">Two</a>
    </nav>
    <form action="done.html">
      <input id="query" name="query" value="">
      <input id="remember" type="checkbox">
    </form>
  </body></html>"#;

const SANDWICH: &str = r#"<html><body>
    <h1 data-rect="0,0,400,40">Sandwich Order Form</h1>
    <label data-rect="0,60,100,20">Cheese</label>
    <span data-rect="0,100,100,20">Provolone</span>
    <span data-rect="300,100,100,20">American</span>
    <label data-rect="0,200,100,20">Notes</label>
    <input id="notes" data-rect="120,200,200,20">
    <button data-rect="0,300,120,30">Order Sandwich</button>
  </body></html>"#;

const MASKED_CLICK: &str = "element click intercepted: Element <label class=\"mat-form-field-label\"> \
    is not clickable at point (10, 20). Other element would receive the click: \
    <input class=\"mat-input-element\">";

fn site() -> Arc<MockDriver> {
    Arc::new(
        MockDriver::new()
            .with_page("http://localhost:8080/index.html", INDEX)
            .with_page("http://localhost:8080/sandwich.html", SANDWICH)
            .with_page(
                "http://localhost:8080/page2.html",
                "<html><head><title>Two</title></head><body><h1>Two</h1></body></html>",
            ),
    )
}

fn config() -> Config {
    let mut config = Config::default();
    config.browser.base_url = Some("http://localhost:8080/".to_string());
    config
}

async fn open(path: &str) -> (Arc<MockDriver>, Browser) {
    let mock = site();
    let browser = Browser::new(mock.clone(), config());
    browser.actions().go(path).await.unwrap();
    (mock, browser)
}

#[tokio::test]
async fn counts_links_and_follows_one() {
    let (_, browser) = open("index.html").await;

    assert_eq!(browser.all(By::css(".nav-page1")).count().await.unwrap(), 5);
    browser.element(By::css(".nav-page2")).click().await.unwrap();

    let url = browser.get_current_url().await.unwrap();
    assert!(url.ends_with("page2.html"), "landed on {}", url);
    assert_eq!(browser.get_title().await.unwrap(), "Two");
}

#[tokio::test]
async fn typed_text_lands_in_the_value_and_clears() {
    let (_, browser) = open("index.html").await;
    let query = browser.element(By::id("query"));

    query.send_keys("foo bar baz").await.unwrap();
    assert_eq!(
        query.get_attribute("value").await.unwrap().as_deref(),
        Some("foo bar baz")
    );

    query.clear().await.unwrap();
    assert_eq!(query.get_attribute("value").await.unwrap().as_deref(), Some(""));
}

#[tokio::test]
async fn count_and_presence_do_not_change_the_page() {
    let (mock, browser) = open("index.html").await;
    let missing = browser.element(By::css(".does-not-exist"));

    for _ in 0..3 {
        assert!(!missing.is_present().await.unwrap());
        assert_eq!(missing.count().await.unwrap(), 0);
    }
    assert!(browser.element(By::id("remember")).is_present().await.unwrap());
    assert_eq!(mock.command_count("click:"), 0);
}

#[tokio::test]
async fn go_resolves_against_the_base_url_with_the_page_load_timeout() {
    let (mock, browser) = open("sandwich.html").await;

    assert_eq!(
        browser.get_current_url().await.unwrap(),
        "http://localhost:8080/sandwich.html"
    );
    assert_eq!(mock.command_count("page_load_timeout:60000"), 1);
    assert_eq!(
        mock.current_page_load_timeout(),
        Some(Duration::from_secs(300))
    );

    browser.actions().go("http://localhost:8080/index.html").await.unwrap();
    assert_eq!(mock.command_count("get:"), 2);
}

#[tokio::test]
async fn go_restores_the_session_timeout_after_a_failed_load() {
    let mock = site();
    let browser = Browser::new(mock.clone(), config());
    browser
        .driver()
        .set_page_load_timeout(Duration::from_secs(15))
        .await
        .unwrap();
    mock.fail_next("get", BrowserError::NavigationFailed("net::ERR_ABORTED".into()));

    assert_err!(browser.actions().go("index.html").await);

    assert_eq!(mock.command_count("page_load_timeout:60000"), 1);
    assert_eq!(
        mock.current_page_load_timeout(),
        Some(Duration::from_secs(15))
    );
}

#[tokio::test]
async fn go_without_a_base_url_needs_an_absolute_path() {
    let browser = Browser::new(site(), Config::default());
    let err = assert_err!(browser.actions().go("index.html").await);
    assert!(matches!(err, BrowserError::ConfigurationError(_)));
}

#[tokio::test(start_paused = true)]
async fn positional_chains_filter_by_geometry() {
    let (_, browser) = open("sandwich.html").await;
    let actions = browser.actions();

    assert!(actions.see("Sandwich Order Form", None).await.unwrap());
    assert!(actions.under("Cheese").see("Provolone", None).await.unwrap());
    assert!(actions.under("Cheese").not().see("American", None).await.unwrap());
    assert!(!actions.under("Cheese").see("American", None).await.unwrap());
    assert!(actions.below("Cheese").see("American", None).await.unwrap());
    assert!(actions.right_of("Provolone").see("American", None).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn find_returns_none_only_when_nothing_turns_up() {
    let (_, browser) = open("sandwich.html").await;
    let actions = browser.actions();

    let provolone = actions.under("Cheese").find("Provolone").await.unwrap();
    assert!(provolone.is_some());
    assert_eq!(provolone.unwrap().text().await.unwrap(), "Provolone");

    assert!(actions.find("Swiss").await.unwrap().is_none());
    assert!(actions.under("Cheese").find("American").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn find_and_see_propagate_errors_other_than_not_found() {
    let (_, browser) = open("sandwich.html").await;
    let actions = browser.actions();

    let err = assert_err!(actions.find(By::xpath("//span")).await);
    assert!(matches!(err, BrowserError::NotSupported(_)));

    let err = assert_err!(actions.see(By::xpath("//span"), None).await);
    assert!(matches!(err, BrowserError::NotSupported(_)));

    let err = assert_err!(actions.under("Cheese").find(By::xpath("//span")).await);
    assert!(matches!(err, BrowserError::NotSupported(_)));
}

#[tokio::test(start_paused = true)]
async fn not_see_fails_while_the_element_stays() {
    let (_, browser) = open("sandwich.html").await;
    let seen = browser
        .actions()
        .not()
        .see("Provolone", Some(FindOptions::allow_unseen()))
        .await
        .unwrap();
    assert!(!seen);
}

#[tokio::test]
async fn chains_are_immutable() {
    let (_, browser) = open("sandwich.html").await;
    let base = browser.actions();
    let under_cheese = base.under("Cheese");
    let slow = under_cheese.slow();

    assert!(base.context().locators().is_empty());
    assert_eq!(under_cheese.context().locators().len(), 1);
    assert_eq!(slow.context().locators().len(), 1);
    assert_eq!(slow.context().timeout(), Duration::from_secs(90));
    assert_eq!(under_cheese.context().timeout(), Duration::from_secs(6));
}

#[tokio::test]
async fn chained_click_and_type_target_the_focused_field() {
    let (mock, browser) = open("sandwich.html").await;
    let actions = browser.actions();

    actions.right_of("Notes").click(By::id("notes")).await.unwrap();
    actions.type_text("no pickles").await.unwrap();
    actions
        .type_text(&format!("{}extra pickles", keys::CLEAR))
        .await
        .unwrap();

    assert_eq!(
        browser
            .element(By::id("notes"))
            .get_attribute("value")
            .await
            .unwrap()
            .as_deref(),
        Some("extra pickles")
    );
    assert_eq!(mock.command_count("click:"), 1);
}

#[tokio::test]
async fn masked_input_interception_falls_back_to_a_pointer_click() {
    let (mock, browser) = open("sandwich.html").await;
    mock.fail_next("click", BrowserError::ClickIntercepted(MASKED_CLICK.to_string()));

    assert_ok!(browser.actions().click("Order Sandwich").await);

    assert_eq!(mock.command_count("click:"), 0);
    assert_eq!(mock.command_count("pointer_click:"), 1);
}

#[tokio::test]
async fn other_interceptions_are_rethrown() {
    let (mock, browser) = open("sandwich.html").await;
    let overlay = MASKED_CLICK.replace("mat-input-element", "cdk-overlay-backdrop");
    mock.fail_next("click", BrowserError::ClickIntercepted(overlay));

    let err = browser.actions().click("Order Sandwich").await.unwrap_err();

    assert!(matches!(err, BrowserError::ClickIntercepted(_)));
    assert_eq!(mock.command_count("pointer_click:"), 0);
}

#[tokio::test]
async fn long_press_suppresses_and_restores_the_context_menu() {
    let (mock, browser) = open("sandwich.html").await;

    assert_ok!(browser.actions().long_press("Order Sandwich").await);

    let scripts: Vec<String> = mock
        .executed_scripts()
        .into_iter()
        .filter(|s| s.contains("OriginalOnContextMenuHandler"))
        .collect();
    assert_eq!(scripts.len(), 2);
    assert!(scripts[0].starts_with("window.browserTest"));
    assert!(scripts[1].contains("delete window.browserTest"));
    assert_eq!(mock.command_count("long_press:"), 1);
}

#[tokio::test]
async fn long_press_restores_even_when_the_gesture_fails() {
    let (mock, browser) = open("sandwich.html").await;
    mock.fail_next("long_press", BrowserError::Driver("gesture rejected".into()));

    let err = browser.actions().long_press("Order Sandwich").await.unwrap_err();

    assert!(err.to_string().contains("gesture rejected"));
    let restores = mock
        .executed_scripts()
        .iter()
        .filter(|s| s.contains("delete window.browserTest"))
        .count();
    assert_eq!(restores, 1);
}

#[tokio::test]
async fn tap_activates_the_element() {
    let (mock, browser) = open("index.html").await;
    browser.actions().tap("Two").await.unwrap();

    assert_eq!(mock.command_count("tap:"), 1);
    assert!(browser.get_current_url().await.unwrap().ends_with("page2.html"));
}

#[tokio::test]
async fn navigation_hooks_fill_shared_results() {
    let mock = site();
    let browser = Browser::new(mock.clone(), config());
    let mut results = SharedResults::new();

    browser
        .get_with_results("http://localhost:8080/index.html", &mut results)
        .await
        .unwrap();

    assert_eq!(results.before_url.as_deref(), Some("about:blank"));
    assert_eq!(
        results.after_url.as_deref(),
        Some("http://localhost:8080/index.html")
    );
    assert_eq!(results.after_document_ready_state.as_deref(), Some("complete"));
    assert_eq!(results.retry, 1);
}

#[tokio::test]
async fn element_actions_retry_past_a_failed_attempt() {
    let (mock, browser) = open("index.html").await;
    mock.fail_next("click", BrowserError::Driver("unknown error: flaky".into()));

    let checkbox = browser
        .element(By::id("remember"))
        .with_task_options(TaskOptions::default().with_retries(2));
    checkbox.click().await.unwrap();

    assert!(checkbox.is_selected().await.unwrap());
    assert_eq!(mock.command_count("click:"), 1);
}

#[tokio::test]
async fn failed_element_actions_are_swallowed_without_validation() {
    let (mock, browser) = open("index.html").await;
    mock.fail_next("click", BrowserError::Driver("unknown error: flaky".into()));

    let checkbox = browser
        .element(By::id("remember"))
        .with_task_options(TaskOptions::default().with_validate(false));
    checkbox.click().await.unwrap();

    assert!(!checkbox.is_selected().await.unwrap());
}
