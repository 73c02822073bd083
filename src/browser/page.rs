use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::core::config::HarnessConfig;
use crate::core::driver::{DriverOps, Locator};
use crate::errors::{HarnessError, Result};
use crate::utils::artifacts;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const SCROLL_SETTLE: Duration = Duration::from_millis(500);

/// Bounded-wait element interaction over a driver session.
///
/// Every operation treats "not there yet" as transient and polls until the
/// condition holds or the wait elapses. Two families of operations exist and
/// keep distinct signatures:
///
/// - acquisitions (`find_element`, `click`, `element_text`, ...) return a
///   typed error after the wait elapses, attempting a diagnostic screenshot
///   first, because absence makes the caller's intended action impossible;
/// - probes (`is_visible`, `is_present`, `wait_for_element_gone`) answer a
///   yes/no question, so timing out is their normal negative result and
///   yields `Ok(false)`.
pub struct Page<'d, D: DriverOps> {
    driver: &'d D,
    timeout: Duration,
    screenshot_dir: PathBuf,
}

impl<'d, D: DriverOps> Page<'d, D> {
    pub fn new(driver: &'d D, config: &HarnessConfig) -> Self {
        Self {
            driver,
            timeout: config.default_timeout,
            screenshot_dir: config.screenshot_dir.clone(),
        }
    }

    /// Replace the instance-wide bounded-wait duration.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn driver(&self) -> &D {
        self.driver
    }

    /// Poll `probe` until it yields a value or `timeout` elapses. The first
    /// probe runs before any sleep, so an already-satisfied condition
    /// returns without delay.
    async fn poll_until<T, F, Fut>(&self, timeout: Duration, mut probe: F) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(found) = probe().await? {
                return Ok(Some(found));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Best-effort diagnostic screenshot; failures are logged, never raised,
    /// so the original error stays the one reported.
    async fn capture_failure(&self, label: &str) {
        match self.take_screenshot(label).await {
            Ok(path) => debug!("failure screenshot saved to {}", path.display()),
            Err(e) => warn!("could not capture failure screenshot: {e}"),
        }
    }

    // ---- element acquisition ----

    /// Wait for the first element matching `locator` to be present.
    pub async fn find_element(&self, locator: &Locator) -> Result<D::Element> {
        let driver = self.driver;
        let found = self
            .poll_until(self.timeout, move || async move {
                driver.find_one(locator).await
            })
            .await?;
        match found {
            Some(element) => Ok(element),
            None => {
                self.capture_failure(&format!("element_not_found_{}", locator.value()))
                    .await;
                Err(HarnessError::ElementNotFound(locator.to_string()))
            }
        }
    }

    /// Wait for at least one match, returning all of them; an empty vec is
    /// the answer when nothing shows up within the wait.
    pub async fn find_elements(&self, locator: &Locator) -> Result<Vec<D::Element>> {
        let driver = self.driver;
        let found = self
            .poll_until(self.timeout, move || async move {
                let all = driver.find_all(locator).await?;
                Ok(if all.is_empty() { None } else { Some(all) })
            })
            .await?;
        Ok(found.unwrap_or_default())
    }

    // ---- interactions ----

    /// Wait until the element is clickable (present, displayed and enabled),
    /// then click it once. No automatic re-click: a click that fails after
    /// the element became available is reported as-is.
    pub async fn click(&self, locator: &Locator) -> Result<()> {
        let driver = self.driver;
        let clickable = self
            .poll_until(self.timeout, move || async move {
                match driver.find_one(locator).await? {
                    Some(element) => {
                        if driver.is_displayed(&element).await? && driver.is_enabled(&element).await?
                        {
                            Ok(Some(element))
                        } else {
                            Ok(None)
                        }
                    }
                    None => Ok(None),
                }
            })
            .await?;

        let element = match clickable {
            Some(element) => element,
            None => {
                self.capture_failure(&format!("click_failed_{}", locator.value()))
                    .await;
                // One last look to tell the caller what was in the way.
                let cause = match driver.find_one(locator).await? {
                    None => HarnessError::ElementNotFound(locator.to_string()),
                    Some(element) => {
                        if driver.is_displayed(&element).await? {
                            HarnessError::Timeout(
                                self.timeout,
                                format!("{locator} to become enabled"),
                            )
                        } else {
                            HarnessError::ElementNotVisible(locator.to_string())
                        }
                    }
                };
                return Err(HarnessError::Interaction {
                    locator: locator.to_string(),
                    source: Box::new(cause),
                });
            }
        };

        if let Err(cause) = driver.click_element(&element).await {
            self.capture_failure(&format!("click_failed_{}", locator.value()))
                .await;
            return Err(HarnessError::Interaction {
                locator: locator.to_string(),
                source: Box::new(cause),
            });
        }
        Ok(())
    }

    /// Type into an input, clearing the existing value first unless the
    /// caller opts out.
    pub async fn type_text(&self, locator: &Locator, text: &str, clear_first: bool) -> Result<()> {
        let element = self.find_element(locator).await?;
        if clear_first {
            self.driver.clear_element(&element).await?;
        }
        self.driver.send_keys(&element, text).await
    }

    pub async fn element_text(&self, locator: &Locator) -> Result<String> {
        let element = self.find_element(locator).await?;
        self.driver.text_of(&element).await
    }

    // ---- boolean probes ----

    /// Whether the element becomes visible within the wait (instance default
    /// unless overridden per call).
    pub async fn is_visible(&self, locator: &Locator, timeout: Option<Duration>) -> Result<bool> {
        let driver = self.driver;
        let hit = self
            .poll_until(timeout.unwrap_or(self.timeout), move || async move {
                match driver.find_one(locator).await? {
                    Some(element) => Ok(driver.is_displayed(&element).await?.then_some(())),
                    None => Ok(None),
                }
            })
            .await?;
        Ok(hit.is_some())
    }

    /// Whether the element becomes present in the DOM within the wait.
    pub async fn is_present(&self, locator: &Locator, timeout: Option<Duration>) -> Result<bool> {
        let driver = self.driver;
        let hit = self
            .poll_until(timeout.unwrap_or(self.timeout), move || async move {
                Ok(driver.find_one(locator).await?.map(|_| ()))
            })
            .await?;
        Ok(hit.is_some())
    }

    /// Wait for the element to leave the DOM; `false` when it is still there
    /// after the wait.
    pub async fn wait_for_element_gone(
        &self,
        locator: &Locator,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        let driver = self.driver;
        let gone = self
            .poll_until(timeout.unwrap_or(self.timeout), move || async move {
                Ok(driver.find_one(locator).await?.is_none().then_some(()))
            })
            .await?;
        Ok(gone.is_some())
    }

    // ---- dropdowns ----

    pub async fn select_by_text(&self, locator: &Locator, text: &str) -> Result<()> {
        let element = self.find_element(locator).await?;
        self.driver.select_by_visible_text(&element, text).await
    }

    pub async fn select_by_value(&self, locator: &Locator, value: &str) -> Result<()> {
        let element = self.find_element(locator).await?;
        self.driver.select_by_value(&element, value).await
    }

    pub async fn select_by_index(&self, locator: &Locator, index: u32) -> Result<()> {
        let element = self.find_element(locator).await?;
        self.driver.select_by_index(&element, index).await
    }

    pub async fn selected_option_text(&self, locator: &Locator) -> Result<String> {
        let element = self.find_element(locator).await?;
        self.driver.selected_option_text(&element).await
    }

    // ---- pointer actions ----

    pub async fn hover(&self, locator: &Locator) -> Result<()> {
        let element = self.find_element(locator).await?;
        self.driver.hover(&element).await
    }

    pub async fn double_click(&self, locator: &Locator) -> Result<()> {
        let element = self.find_element(locator).await?;
        self.driver.double_click(&element).await
    }

    pub async fn right_click(&self, locator: &Locator) -> Result<()> {
        let element = self.find_element(locator).await?;
        self.driver.context_click(&element).await
    }

    pub async fn drag_and_drop(&self, source: &Locator, target: &Locator) -> Result<()> {
        let from = self.find_element(source).await?;
        let to = self.find_element(target).await?;
        self.driver.drag_and_drop(&from, &to).await
    }

    // ---- scrolling ----

    pub async fn scroll_to_element(&self, locator: &Locator) -> Result<()> {
        let element = self.find_element(locator).await?;
        self.driver.scroll_into_view(&element).await?;
        // Let the page settle before the caller interacts with what moved.
        sleep(SCROLL_SETTLE).await;
        Ok(())
    }

    pub async fn scroll_to_top(&self) -> Result<()> {
        self.driver
            .execute_script("window.scrollTo(0, 0);", Vec::new())
            .await?;
        Ok(())
    }

    pub async fn scroll_to_bottom(&self) -> Result<()> {
        self.driver
            .execute_script("window.scrollTo(0, document.body.scrollHeight);", Vec::new())
            .await?;
        Ok(())
    }

    // ---- page state ----

    /// Block until `document.readyState` reports complete. Unlike the
    /// probes this raises on timeout: callers use it as a gate, not a check.
    pub async fn wait_for_page_ready(&self, timeout: Option<Duration>) -> Result<()> {
        let wait = timeout.unwrap_or(self.timeout);
        let driver = self.driver;
        let ready = self
            .poll_until(wait, move || async move {
                let state = driver
                    .execute_script("return document.readyState;", Vec::new())
                    .await?;
                Ok((state.as_str() == Some("complete")).then_some(()))
            })
            .await?;
        ready.ok_or_else(|| HarnessError::Timeout(wait, "page ready state".to_string()))
    }

    pub async fn open(&self, url: &str) -> Result<()> {
        self.driver.goto(url).await
    }

    pub async fn page_url(&self) -> Result<String> {
        self.driver.current_url().await
    }

    pub async fn page_title(&self) -> Result<String> {
        self.driver.title().await
    }

    pub async fn refresh(&self) -> Result<()> {
        self.driver.refresh().await?;
        self.wait_for_page_ready(None).await
    }

    // ---- alerts ----

    async fn wait_for_alert(&self) -> Result<()> {
        let driver = self.driver;
        let present = self
            .poll_until(self.timeout, move || async move {
                Ok(driver.alert_text().await.ok().map(|_| ()))
            })
            .await?;
        present.ok_or_else(|| HarnessError::Timeout(self.timeout, "an alert to appear".to_string()))
    }

    pub async fn accept_alert(&self) -> Result<()> {
        self.wait_for_alert().await?;
        self.driver.accept_alert().await
    }

    pub async fn dismiss_alert(&self) -> Result<()> {
        self.wait_for_alert().await?;
        self.driver.dismiss_alert().await
    }

    pub async fn alert_text(&self) -> Result<String> {
        self.wait_for_alert().await?;
        self.driver.alert_text().await
    }

    // ---- frames ----

    pub async fn switch_to_frame(&self, locator: &Locator) -> Result<()> {
        let element = self.find_element(locator).await?;
        self.driver.enter_frame(element).await
    }

    pub async fn switch_to_default_content(&self) -> Result<()> {
        self.driver.enter_default_frame().await
    }

    // ---- scripting and diagnostics ----

    pub async fn execute_script(&self, script: &str) -> Result<Value> {
        self.driver.execute_script(script, Vec::new()).await
    }

    /// Capture a screenshot named `<label>_<timestamp>.png` under the
    /// configured screenshot directory, creating it if needed.
    pub async fn take_screenshot(&self, label: &str) -> Result<PathBuf> {
        let png = self.driver.screenshot_png().await?;
        artifacts::write_screenshot(&self.screenshot_dir, label, &png).await
    }
}
