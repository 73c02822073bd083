//! Bounded-wait behavior of the element interaction layer, driven against
//! the scripted driver.

use std::time::{Duration, Instant};

use browser_testkit::core::driver::Locator;
use browser_testkit::errors::HarnessError;
use browser_testkit::testing::{harness_config_in, MockDriver, MockElement};
use browser_testkit::Page;

fn screenshot_names(dir: &std::path::Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn find_elements_returns_empty_for_zero_matches_without_raising() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let driver = MockDriver::new();
    let page = Page::new(&driver, &config);

    let start = Instant::now();
    let found = page.find_elements(&Locator::css(".absent")).await.unwrap();

    assert!(found.is_empty());
    // The empty answer still takes the full wait: absence is only known
    // once the bound elapses.
    assert!(start.elapsed() >= config.default_timeout);
    assert!(screenshot_names(&config.screenshot_dir).is_empty());
}

#[tokio::test]
async fn find_element_raises_after_the_full_wait_and_captures_a_screenshot() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let driver = MockDriver::new();
    let page = Page::new(&driver, &config).with_timeout(Duration::from_secs(1));

    let start = Instant::now();
    let err = page.find_element(&Locator::id("missing")).await.unwrap_err();

    assert!(start.elapsed() >= Duration::from_secs(1));
    assert!(matches!(err, HarnessError::ElementNotFound(_)));
    let names = screenshot_names(&config.screenshot_dir);
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("element_not_found_missing_"));
    assert!(names[0].ends_with(".png"));

    // Same locator through the many-variant: empty vec, no new artifact.
    let found = page.find_elements(&Locator::id("missing")).await.unwrap();
    assert!(found.is_empty());
    assert_eq!(screenshot_names(&config.screenshot_dir).len(), 1);
}

#[tokio::test]
async fn find_element_resolves_as_soon_as_the_element_appears() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let locator = Locator::css("#late");
    let driver = MockDriver::new().with_element_appearing_after(
        &locator,
        MockElement::new().with_text("made it"),
        Duration::from_millis(150),
    );
    let page = Page::new(&driver, &config).with_timeout(Duration::from_secs(2));

    let start = Instant::now();
    let element = page.find_element(&locator).await.unwrap();

    assert_eq!(element.text, "made it");
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(150));
    assert!(elapsed < Duration::from_secs(1), "resolved late: {elapsed:?}");
}

#[tokio::test]
async fn click_waits_for_clickable_and_dispatches_once() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let locator = Locator::css("button[type='submit']");
    let driver = MockDriver::new().with_element(&locator, MockElement::new());
    let page = Page::new(&driver, &config);

    page.click(&locator).await.unwrap();

    assert_eq!(driver.clicks().len(), 1);
    assert!(screenshot_names(&config.screenshot_dir).is_empty());
}

#[tokio::test]
async fn click_on_a_disabled_element_times_out_with_diagnostics() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let locator = Locator::id("frozen");
    let driver = MockDriver::new().with_element(&locator, MockElement::new().disabled());
    let page = Page::new(&driver, &config);

    let err = page.click(&locator).await.unwrap_err();

    assert!(matches!(err, HarnessError::Interaction { .. }));
    assert!(driver.clicks().is_empty());
    let names = screenshot_names(&config.screenshot_dir);
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("click_failed_frozen_"));
}

#[tokio::test]
async fn click_on_a_hidden_element_names_visibility_as_the_cause() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let locator = Locator::css(".offscreen");
    let driver = MockDriver::new().with_element(&locator, MockElement::new().hidden());
    let page = Page::new(&driver, &config);

    let err = page.click(&locator).await.unwrap_err();

    match err {
        HarnessError::Interaction { source, .. } => {
            assert!(matches!(*source, HarnessError::ElementNotVisible(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn intercepted_click_reports_the_cause_without_retrying() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let locator = Locator::id("covered");
    let driver =
        MockDriver::new().with_element(&locator, MockElement::new().click_intercepted());
    let page = Page::new(&driver, &config);

    let err = page.click(&locator).await.unwrap_err();

    match err {
        HarnessError::Interaction { locator, source } => {
            assert_eq!(locator, "id=covered");
            assert!(matches!(*source, HarnessError::Command(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    // Single attempt only, plus the diagnostic capture.
    assert!(driver.clicks().is_empty());
    assert_eq!(screenshot_names(&config.screenshot_dir).len(), 1);
}

#[tokio::test]
async fn type_text_clears_first_unless_opted_out() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let locator = Locator::name("q");
    let driver = MockDriver::new().with_element(&locator, MockElement::new());
    let page = Page::new(&driver, &config);

    page.type_text(&locator, "laptop", true).await.unwrap();
    assert_eq!(driver.cleared().len(), 1);

    page.type_text(&locator, " pro", false).await.unwrap();
    assert_eq!(driver.cleared().len(), 1);
    assert_eq!(
        driver.typed(),
        vec![
            ("name=q".to_string(), "laptop".to_string()),
            ("name=q".to_string(), " pro".to_string()),
        ]
    );
}

#[tokio::test]
async fn presence_and_visibility_probes_return_false_instead_of_raising() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let hidden = Locator::id("ghost");
    let driver = MockDriver::new().with_element(&hidden, MockElement::new().hidden());
    let page = Page::new(&driver, &config);

    assert!(page.is_present(&hidden, None).await.unwrap());
    assert!(!page.is_visible(&hidden, None).await.unwrap());
    assert!(!page.is_present(&Locator::id("nowhere"), None).await.unwrap());
    assert!(screenshot_names(&config.screenshot_dir).is_empty());
}

#[tokio::test]
async fn probe_timeout_can_be_overridden_per_call() {
    let root = tempfile::tempdir().unwrap();
    let mut config = harness_config_in(root.path());
    config.default_timeout = Duration::from_secs(5);
    let driver = MockDriver::new();
    let page = Page::new(&driver, &config);

    let start = Instant::now();
    let present = page
        .is_present(&Locator::id("nowhere"), Some(Duration::from_millis(120)))
        .await
        .unwrap();

    assert!(!present);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn wait_for_element_gone_reports_both_ways() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let spinner = Locator::css(".spinner");
    let driver = MockDriver::new().with_element(&spinner, MockElement::new());
    let page = Page::new(&driver, &config);

    // Still present after the wait: false, no error.
    assert!(!page.wait_for_element_gone(&spinner, None).await.unwrap());
    // Never present at all: immediately true.
    assert!(page
        .wait_for_element_gone(&Locator::css(".done"), None)
        .await
        .unwrap());
}

#[tokio::test]
async fn page_ready_is_idempotent_on_an_already_ready_page() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let driver = MockDriver::new();
    let page = Page::new(&driver, &config);

    let start = Instant::now();
    page.wait_for_page_ready(None).await.unwrap();
    page.wait_for_page_ready(None).await.unwrap();

    // One readiness check per call, no polling delay on either.
    assert_eq!(driver.script_count(), 2);
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[tokio::test]
async fn page_ready_timeout_raises_instead_of_returning_false() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let driver = MockDriver::new().with_ready_state("loading");
    let page = Page::new(&driver, &config);

    let err = page
        .wait_for_page_ready(Some(Duration::from_millis(200)))
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::Timeout(_, _)));
}

#[tokio::test]
async fn select_failures_propagate_without_screenshot_capture() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let dropdown = Locator::id("country");
    let driver = MockDriver::new().with_element(
        &dropdown,
        MockElement::new().with_options(&["United States", "Canada"]),
    );
    let page = Page::new(&driver, &config);

    page.select_by_text(&dropdown, "Canada").await.unwrap();
    assert_eq!(page.selected_option_text(&dropdown).await.unwrap(), "Canada");

    let err = page.select_by_text(&dropdown, "Atlantis").await.unwrap_err();
    assert!(matches!(err, HarnessError::Command(_)));
    // Only lookup failures trigger diagnostic capture.
    assert!(screenshot_names(&config.screenshot_dir).is_empty());

    let err = page.select_by_index(&dropdown, 9).await.unwrap_err();
    assert!(matches!(err, HarnessError::Command(_)));
}

#[tokio::test]
async fn alert_operations_wait_for_presence() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());

    let driver = MockDriver::new().with_alert("Are you sure?");
    let page = Page::new(&driver, &config);
    assert_eq!(page.alert_text().await.unwrap(), "Are you sure?");
    page.accept_alert().await.unwrap();

    let silent = MockDriver::new();
    let page = Page::new(&silent, &config).with_timeout(Duration::from_millis(200));
    let err = page.accept_alert().await.unwrap_err();
    assert!(matches!(err, HarnessError::Timeout(_, _)));
}

#[tokio::test]
async fn frame_switching_resolves_the_frame_element_first() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let frame = Locator::css("iframe#payments");
    let driver = MockDriver::new().with_element(&frame, MockElement::new());
    let page = Page::new(&driver, &config);

    page.switch_to_frame(&frame).await.unwrap();
    page.switch_to_default_content().await.unwrap();

    let actions = driver.actions();
    assert_eq!(actions[0], "enter_frame:css=iframe#payments");
    assert_eq!(actions[1], "default_frame");
}

#[tokio::test]
async fn take_screenshot_names_files_with_label_and_timestamp() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let driver = MockDriver::new();
    let page = Page::new(&driver, &config);

    let path = page.take_screenshot("checkout step 2").await.unwrap();

    assert!(path.exists());
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("checkout_step_2_"));
    assert!(name.ends_with(".png"));
}
