//! Scoped-session guarantees of the test lifecycle manager: teardown on
//! every exit path, diagnostics exactly when a test does not pass.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::FutureExt;

use browser_testkit::core::driver::Locator;
use browser_testkit::errors::HarnessError;
use browser_testkit::harness::{self, TestLifecycle, TestOutcome};
use browser_testkit::testing::{harness_config_in, MockDriver, MockElement};
use browser_testkit::{ReportSink, SuiteLifecycle};

fn attachment_names(sink_dir: &std::path::Path, test: &str) -> Vec<String> {
    let dir = sink_dir.join(test);
    match std::fs::read_dir(dir) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect();
            names.sort();
            names
        }
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn teardown_happens_exactly_once_on_pass() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let sink = Arc::new(ReportSink::new(config.report_dir.clone()));
    let driver = MockDriver::new();
    let quits = driver.quit_counter();

    let lifecycle = TestLifecycle::with_session(driver, &config, sink.clone(), "passing_case");
    lifecycle.conclude(&TestOutcome::Passed).await.unwrap();

    assert_eq!(quits.load(Ordering::SeqCst), 1);
    // A pass produces zero diagnostic artifacts.
    assert!(attachment_names(sink.dir(), "passing_case").is_empty());
}

#[tokio::test]
async fn failure_produces_exactly_one_screenshot_and_one_markup_attachment() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let sink = Arc::new(ReportSink::new(config.report_dir.clone()));
    let driver = MockDriver::new();
    let quits = driver.quit_counter();

    let lifecycle = TestLifecycle::with_session(driver, &config, sink.clone(), "failing_case");
    lifecycle
        .conclude(&TestOutcome::Failed("expected dashboard".to_string()))
        .await
        .unwrap();

    assert_eq!(quits.load(Ordering::SeqCst), 1);
    assert_eq!(
        attachment_names(sink.dir(), "failing_case"),
        vec![
            "failure_screenshot.png".to_string(),
            "page_source.html".to_string(),
        ]
    );
}

#[tokio::test]
async fn run_translates_results_and_always_tears_down() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let sink = Arc::new(ReportSink::new(config.report_dir.clone()));

    // Passing body.
    let driver = MockDriver::new().with_element(&Locator::id("ok"), MockElement::new());
    let quits = driver.quit_counter();
    let lifecycle = TestLifecycle::with_session(driver, &config, sink.clone(), "run_pass");
    let outcome = harness::run(lifecycle, |lc| {
        async move {
            let page = lc.page()?;
            page.find_element(&Locator::id("ok")).await?;
            Ok(())
        }
        .boxed()
    })
    .await;
    assert_eq!(outcome, TestOutcome::Passed);
    assert_eq!(quits.load(Ordering::SeqCst), 1);
    assert!(attachment_names(sink.dir(), "run_pass").is_empty());

    // Erroring body.
    let driver = MockDriver::new();
    let quits = driver.quit_counter();
    let lifecycle = TestLifecycle::with_session(driver, &config, sink.clone(), "run_error");
    let outcome = harness::run(lifecycle, |_lc| {
        async {
            let result: browser_testkit::Result<()> =
                Err(HarnessError::Command("backend gone".to_string()));
            result
        }
        .boxed()
    })
    .await;
    assert!(matches!(outcome, TestOutcome::Errored(_)));
    assert_eq!(quits.load(Ordering::SeqCst), 1);
    assert_eq!(attachment_names(sink.dir(), "run_error").len(), 2);
}

#[tokio::test]
async fn run_tears_down_even_when_the_body_panics() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let sink = Arc::new(ReportSink::new(config.report_dir.clone()));
    let driver = MockDriver::new();
    let quits = driver.quit_counter();

    let lifecycle = TestLifecycle::with_session(driver, &config, sink.clone(), "run_panic");
    let result = AssertUnwindSafe(harness::run(lifecycle, |_lc| {
        async {
            let answer = 2 + 2;
            assert_eq!(answer, 5, "assertion blew up");
            Ok::<(), HarnessError>(())
        }
        .boxed()
    }))
    .catch_unwind()
    .await;

    // The panic is re-raised for the surrounding framework...
    assert!(result.is_err());
    // ...but only after the session was released and diagnostics captured.
    assert_eq!(quits.load(Ordering::SeqCst), 1);
    assert_eq!(attachment_names(sink.dir(), "run_panic").len(), 2);
}

#[tokio::test]
async fn session_access_after_conclude_is_impossible_by_construction() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let sink = Arc::new(ReportSink::new(config.report_dir.clone()));
    let driver = MockDriver::new();

    let lifecycle = TestLifecycle::with_session(driver, &config, sink, "typed_teardown");
    assert!(lifecycle.session().is_ok());
    assert!(lifecycle.page().is_ok());
    // `conclude` consumes the lifecycle; the borrow checker enforces the
    // Torn Down state, nothing left to assert at runtime.
    lifecycle.conclude(&TestOutcome::Passed).await.unwrap();
}

#[tokio::test]
async fn suite_lifecycle_spans_tests_and_quits_once_at_the_end() {
    let root = tempfile::tempdir().unwrap();
    let config = harness_config_in(root.path());
    let sink = Arc::new(ReportSink::new(config.report_dir.clone()));
    let driver = MockDriver::new().with_element(&Locator::id("menu"), MockElement::new());
    let quits = driver.quit_counter();

    let suite = SuiteLifecycle::with_session(driver, &config, sink.clone());

    let page = suite.page().unwrap();
    page.find_element(&Locator::id("menu")).await.unwrap();
    suite.record_outcome("suite_first", &TestOutcome::Passed).await;

    suite
        .record_outcome(
            "suite_second",
            &TestOutcome::Failed("menu missing".to_string()),
        )
        .await;

    // Still alive between tests, exactly one quit at the end.
    assert_eq!(quits.load(Ordering::SeqCst), 0);
    suite.finish().await.unwrap();
    assert_eq!(quits.load(Ordering::SeqCst), 1);

    assert!(attachment_names(sink.dir(), "suite_first").is_empty());
    assert_eq!(attachment_names(sink.dir(), "suite_second").len(), 2);
}
