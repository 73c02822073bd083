use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{error, info, warn};

use crate::browser::page::Page;
use crate::browser::provisioner;
use crate::browser::webdriver::WdSession;
use crate::core::config::HarnessConfig;
use crate::core::driver::DriverOps;
use crate::errors::{HarnessError, Result};
use crate::reporting::ReportSink;

/// Final verdict of one test, produced once by the surrounding framework.
/// Diagnostics are captured for anything that is not a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    /// An assertion did not hold.
    Failed(String),
    /// The body returned an error before reaching its assertions.
    Errored(String),
}

impl TestOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }

    pub fn needs_diagnostics(&self) -> bool {
        !self.is_passed()
    }
}

/// Per-test lifecycle: Active (session open) until `conclude`, Torn Down
/// after. The transition happens exactly once on every exit path; the
/// session cannot leak past the scope that created it.
///
/// The session a test owns is registered explicitly at construction; the
/// failure hook captures diagnostics from that session and no other.
pub struct TestLifecycle<D: DriverOps> {
    test_name: String,
    session: Option<D>,
    sink: Arc<ReportSink>,
    config: HarnessConfig,
}

impl TestLifecycle<WdSession> {
    /// Provision a fresh session for one test and note the chosen
    /// configuration in the report.
    pub async fn launch(
        config: &HarnessConfig,
        sink: Arc<ReportSink>,
        test_name: &str,
    ) -> Result<Self> {
        info!(
            test = test_name,
            browser = %config.browser,
            headless = config.headless,
            remote = config.remote,
            "provisioning session"
        );
        let session = provisioner::provision(config).await?;

        let note = session.describe();
        if let Err(e) = sink.attach_text(test_name, "browser_configuration", &note) {
            warn!(test = test_name, "could not attach configuration note: {e}");
        }

        Ok(Self::with_session(session, config, sink, test_name))
    }
}

impl<D: DriverOps> TestLifecycle<D> {
    /// Register an already-provisioned session. The lifecycle owns it from
    /// here on and is the only place allowed to quit it.
    pub fn with_session(
        session: D,
        config: &HarnessConfig,
        sink: Arc<ReportSink>,
        test_name: &str,
    ) -> Self {
        Self {
            test_name: test_name.to_string(),
            session: Some(session),
            sink,
            config: config.clone(),
        }
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    pub fn session(&self) -> Result<&D> {
        self.session.as_ref().ok_or(HarnessError::SessionClosed)
    }

    pub fn page(&self) -> Result<Page<'_, D>> {
        Ok(Page::new(self.session()?, &self.config))
    }

    /// Capture diagnostics when the outcome calls for it, then release the
    /// session. Consumes the lifecycle: there is no way back to Active.
    pub async fn conclude(mut self, outcome: &TestOutcome) -> Result<()> {
        if outcome.needs_diagnostics() {
            if let Some(session) = self.session.as_ref() {
                capture_diagnostics(session, &self.sink, &self.test_name).await;
            }
        }
        self.teardown().await
    }

    async fn teardown(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            info!(test = %self.test_name, "tearing down session");
            session.quit().await?;
        }
        Ok(())
    }
}

/// Pull a screenshot and the current markup out of the still-open session
/// and attach both to the report. Best effort: every error here is logged
/// and swallowed so the test's own outcome stays untouched.
async fn capture_diagnostics<D: DriverOps>(session: &D, sink: &ReportSink, test_name: &str) {
    match session.screenshot_png().await {
        Ok(png) => {
            if let Err(e) = sink.attach_png(test_name, "failure_screenshot", &png) {
                warn!(test = test_name, "could not attach failure screenshot: {e}");
            }
        }
        Err(e) => warn!(test = test_name, "could not capture failure screenshot: {e}"),
    }
    match session.page_source().await {
        Ok(html) => {
            if let Err(e) = sink.attach_html(test_name, "page_source", &html) {
                warn!(test = test_name, "could not attach page source: {e}");
            }
        }
        Err(e) => warn!(test = test_name, "could not capture page source: {e}"),
    }
}

/// Drive a test body to completion under the scoped-session guarantee: the
/// session is quit whether the body passes, returns an error or panics.
/// Panics resume after teardown so the surrounding test framework still
/// records them.
///
/// The body borrows the lifecycle for its whole run, so it is taken as a
/// boxed future: `harness::run(lifecycle, |lc| async move { ... }.boxed())`.
pub async fn run<D>(
    lifecycle: TestLifecycle<D>,
    body: impl for<'a> FnOnce(&'a TestLifecycle<D>) -> BoxFuture<'a, Result<()>>,
) -> TestOutcome
where
    D: DriverOps,
{
    let result = AssertUnwindSafe(body(&lifecycle)).catch_unwind().await;
    let (outcome, panic_payload) = match result {
        Ok(Ok(())) => (TestOutcome::Passed, None),
        Ok(Err(e)) => (TestOutcome::Errored(e.to_string()), None),
        Err(payload) => (TestOutcome::Failed(panic_message(&payload)), Some(payload)),
    };

    if let Err(e) = lifecycle.conclude(&outcome).await {
        error!("session teardown failed: {e}");
    }

    if let Some(payload) = panic_payload {
        std::panic::resume_unwind(payload);
    }
    outcome
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "test panicked".to_string()
    }
}

/// Session shared across a whole suite. Provisioning and teardown follow the
/// same rules as the per-test lifecycle, but the browser survives between
/// tests: cheaper, and no isolation. Reach for this only when the suite is
/// known not to corrupt shared browser state.
pub struct SuiteLifecycle<D: DriverOps> {
    session: Option<D>,
    sink: Arc<ReportSink>,
    config: HarnessConfig,
}

impl SuiteLifecycle<WdSession> {
    pub async fn launch(config: &HarnessConfig, sink: Arc<ReportSink>) -> Result<Self> {
        info!(browser = %config.browser, "provisioning suite-wide session");
        let session = provisioner::provision(config).await?;
        Ok(Self::with_session(session, config, sink))
    }
}

impl<D: DriverOps> SuiteLifecycle<D> {
    pub fn with_session(session: D, config: &HarnessConfig, sink: Arc<ReportSink>) -> Self {
        Self {
            session: Some(session),
            sink,
            config: config.clone(),
        }
    }

    pub fn session(&self) -> Result<&D> {
        self.session.as_ref().ok_or(HarnessError::SessionClosed)
    }

    pub fn page(&self) -> Result<Page<'_, D>> {
        Ok(Page::new(self.session()?, &self.config))
    }

    /// Failure hook for one test within the suite; capture is best effort
    /// and the shared session stays open.
    pub async fn record_outcome(&self, test_name: &str, outcome: &TestOutcome) {
        if outcome.needs_diagnostics() {
            if let Some(session) = self.session.as_ref() {
                capture_diagnostics(session, &self.sink, test_name).await;
            }
        }
    }

    /// Quit the shared session once the whole suite is done.
    pub async fn finish(mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            info!("tearing down suite-wide session");
            session.quit().await?;
        }
        Ok(())
    }
}
