//! Test-support doubles for the harness's own test suite.
//!
//! `MockDriver` implements the driver seam with scripted elements so wait
//! timing, lifecycle and failure-capture behavior can be exercised without a
//! live browser.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use crate::core::config::HarnessConfig;
use crate::core::driver::{DriverOps, Locator};
use crate::errors::{HarnessError, Result};

/// A scripted DOM element.
#[derive(Debug, Clone)]
pub struct MockElement {
    key: String,
    pub text: String,
    pub visible: bool,
    pub enabled: bool,
    pub options: Vec<String>,
    pub click_fails: bool,
}

impl MockElement {
    pub fn new() -> Self {
        Self {
            key: String::new(),
            text: String::new(),
            visible: true,
            enabled: true,
            options: Vec::new(),
            click_fails: false,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Make clicks on this element fail even though it is clickable, like an
    /// overlay intercepting the click.
    pub fn click_intercepted(mut self) -> Self {
        self.click_fails = true;
        self
    }
}

impl Default for MockElement {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    elements: Vec<MockElement>,
    available_after: Duration,
}

/// Scripted driver. Elements are registered per locator, optionally with an
/// appearance delay measured from driver construction; every interaction is
/// recorded for assertions.
pub struct MockDriver {
    started: Instant,
    entries: Mutex<HashMap<String, Entry>>,
    clicks: Mutex<Vec<String>>,
    cleared: Mutex<Vec<String>>,
    typed: Mutex<Vec<(String, String)>>,
    selections: Mutex<Vec<(String, String)>>,
    actions: Mutex<Vec<String>>,
    scripts: Mutex<Vec<String>>,
    alert: Mutex<Option<String>>,
    ready_state: Mutex<String>,
    url: Mutex<String>,
    timeouts: Mutex<Option<(Duration, Duration)>>,
    quit_calls: Arc<AtomicUsize>,
    pub screenshot: Vec<u8>,
    pub source: String,
    pub title: String,
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            entries: Mutex::new(HashMap::new()),
            clicks: Mutex::new(Vec::new()),
            cleared: Mutex::new(Vec::new()),
            typed: Mutex::new(Vec::new()),
            selections: Mutex::new(Vec::new()),
            actions: Mutex::new(Vec::new()),
            scripts: Mutex::new(Vec::new()),
            alert: Mutex::new(None),
            ready_state: Mutex::new("complete".to_string()),
            url: Mutex::new("about:blank".to_string()),
            timeouts: Mutex::new(None),
            quit_calls: Arc::new(AtomicUsize::new(0)),
            screenshot: b"\x89PNG\r\n\x1a\nmock".to_vec(),
            source: "<html><body>mock page</body></html>".to_string(),
            title: "Mock Page".to_string(),
        }
    }

    fn key(locator: &Locator) -> String {
        locator.to_string()
    }

    pub fn with_element(self, locator: &Locator, element: MockElement) -> Self {
        self.with_elements(locator, vec![element])
    }

    pub fn with_elements(self, locator: &Locator, elements: Vec<MockElement>) -> Self {
        self.insert(locator, elements, Duration::ZERO);
        self
    }

    /// Register an element that only starts matching after `delay`.
    pub fn with_element_appearing_after(
        self,
        locator: &Locator,
        element: MockElement,
        delay: Duration,
    ) -> Self {
        self.insert(locator, vec![element], delay);
        self
    }

    pub fn with_alert(self, text: &str) -> Self {
        *self.alert.lock().expect("mock state") = Some(text.to_string());
        self
    }

    pub fn with_ready_state(self, state: &str) -> Self {
        *self.ready_state.lock().expect("mock state") = state.to_string();
        self
    }

    fn insert(&self, locator: &Locator, mut elements: Vec<MockElement>, delay: Duration) {
        let key = Self::key(locator);
        for element in &mut elements {
            element.key = key.clone();
        }
        self.entries.lock().expect("mock state").insert(
            key,
            Entry {
                elements,
                available_after: delay,
            },
        );
    }

    fn live_elements(&self, locator: &Locator) -> Vec<MockElement> {
        let entries = self.entries.lock().expect("mock state");
        match entries.get(&Self::key(locator)) {
            Some(entry) if self.started.elapsed() >= entry.available_after => {
                entry.elements.clone()
            }
            _ => Vec::new(),
        }
    }

    // ---- assertion accessors ----

    /// Shared handle to the quit counter, usable after the driver has been
    /// consumed by a lifecycle.
    pub fn quit_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.quit_calls)
    }

    pub fn quit_count(&self) -> usize {
        self.quit_calls.load(Ordering::SeqCst)
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().expect("mock state").clone()
    }

    pub fn cleared(&self) -> Vec<String> {
        self.cleared.lock().expect("mock state").clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.typed.lock().expect("mock state").clone()
    }

    pub fn selections(&self) -> Vec<(String, String)> {
        self.selections.lock().expect("mock state").clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().expect("mock state").clone()
    }

    pub fn script_count(&self) -> usize {
        self.scripts.lock().expect("mock state").len()
    }

    pub fn applied_timeouts(&self) -> Option<(Duration, Duration)> {
        *self.timeouts.lock().expect("mock state")
    }

    fn record_action(&self, what: &str, element: &MockElement) {
        self.actions
            .lock()
            .expect("mock state")
            .push(format!("{what}:{}", element.key));
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriverOps for MockDriver {
    type Element = MockElement;

    async fn goto(&self, url: &str) -> Result<()> {
        *self.url.lock().expect("mock state") = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url.lock().expect("mock state").clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.title.clone())
    }

    async fn refresh(&self) -> Result<()> {
        Ok(())
    }

    async fn find_one(&self, locator: &Locator) -> Result<Option<MockElement>> {
        Ok(self.live_elements(locator).into_iter().next())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<MockElement>> {
        Ok(self.live_elements(locator))
    }

    async fn is_displayed(&self, element: &MockElement) -> Result<bool> {
        Ok(element.visible)
    }

    async fn is_enabled(&self, element: &MockElement) -> Result<bool> {
        Ok(element.enabled)
    }

    async fn text_of(&self, element: &MockElement) -> Result<String> {
        Ok(element.text.clone())
    }

    async fn click_element(&self, element: &MockElement) -> Result<()> {
        if element.click_fails {
            return Err(HarnessError::Command(format!(
                "click intercepted: {}",
                element.key
            )));
        }
        self.clicks
            .lock()
            .expect("mock state")
            .push(element.key.clone());
        Ok(())
    }

    async fn clear_element(&self, element: &MockElement) -> Result<()> {
        self.cleared
            .lock()
            .expect("mock state")
            .push(element.key.clone());
        Ok(())
    }

    async fn send_keys(&self, element: &MockElement, text: &str) -> Result<()> {
        self.typed
            .lock()
            .expect("mock state")
            .push((element.key.clone(), text.to_string()));
        Ok(())
    }

    async fn select_by_visible_text(&self, element: &MockElement, text: &str) -> Result<()> {
        if !element.options.iter().any(|o| o == text) {
            return Err(HarnessError::Command(format!(
                "no option with text {text:?} in {}",
                element.key
            )));
        }
        self.selections
            .lock()
            .expect("mock state")
            .push((element.key.clone(), text.to_string()));
        Ok(())
    }

    async fn select_by_value(&self, element: &MockElement, value: &str) -> Result<()> {
        // Options double as values in the mock.
        self.select_by_visible_text(element, value).await
    }

    async fn select_by_index(&self, element: &MockElement, index: u32) -> Result<()> {
        match element.options.get(index as usize) {
            Some(option) => {
                self.selections
                    .lock()
                    .expect("mock state")
                    .push((element.key.clone(), option.clone()));
                Ok(())
            }
            None => Err(HarnessError::Command(format!(
                "option index {index} out of range in {}",
                element.key
            ))),
        }
    }

    async fn selected_option_text(&self, element: &MockElement) -> Result<String> {
        let selections = self.selections.lock().expect("mock state");
        if let Some((_, choice)) = selections.iter().rev().find(|(key, _)| *key == element.key) {
            return Ok(choice.clone());
        }
        element
            .options
            .first()
            .cloned()
            .ok_or_else(|| HarnessError::Command(format!("{} has no options", element.key)))
    }

    async fn hover(&self, element: &MockElement) -> Result<()> {
        self.record_action("hover", element);
        Ok(())
    }

    async fn double_click(&self, element: &MockElement) -> Result<()> {
        self.record_action("double_click", element);
        Ok(())
    }

    async fn context_click(&self, element: &MockElement) -> Result<()> {
        self.record_action("context_click", element);
        Ok(())
    }

    async fn drag_and_drop(&self, source: &MockElement, target: &MockElement) -> Result<()> {
        self.actions
            .lock()
            .expect("mock state")
            .push(format!("drag:{}->{}", source.key, target.key));
        Ok(())
    }

    async fn scroll_into_view(&self, element: &MockElement) -> Result<()> {
        self.record_action("scroll", element);
        Ok(())
    }

    async fn execute_script(&self, script: &str, _args: Vec<Value>) -> Result<Value> {
        self.scripts
            .lock()
            .expect("mock state")
            .push(script.to_string());
        if script.contains("readyState") {
            return Ok(Value::String(
                self.ready_state.lock().expect("mock state").clone(),
            ));
        }
        Ok(Value::Null)
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        Ok(self.screenshot.clone())
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.source.clone())
    }

    async fn accept_alert(&self) -> Result<()> {
        self.alert
            .lock()
            .expect("mock state")
            .take()
            .map(|_| ())
            .ok_or_else(|| HarnessError::Command("no alert present".to_string()))
    }

    async fn dismiss_alert(&self) -> Result<()> {
        self.alert
            .lock()
            .expect("mock state")
            .take()
            .map(|_| ())
            .ok_or_else(|| HarnessError::Command("no alert present".to_string()))
    }

    async fn alert_text(&self) -> Result<String> {
        self.alert
            .lock()
            .expect("mock state")
            .clone()
            .ok_or_else(|| HarnessError::Command("no alert present".to_string()))
    }

    async fn enter_frame(&self, element: MockElement) -> Result<()> {
        self.record_action("enter_frame", &element);
        Ok(())
    }

    async fn enter_default_frame(&self) -> Result<()> {
        self.actions
            .lock()
            .expect("mock state")
            .push("default_frame".to_string());
        Ok(())
    }

    async fn set_timeouts(&self, page_load: Duration, implicit: Duration) -> Result<()> {
        *self.timeouts.lock().expect("mock state") = Some((page_load, implicit));
        Ok(())
    }

    async fn quit(&mut self) -> Result<()> {
        self.quit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Harness configuration rooted under a scratch directory, with a short
/// default wait so timeout paths run quickly.
pub fn harness_config_in(root: &Path) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.default_timeout = Duration::from_millis(400);
    config.screenshot_dir = root.join("screenshots");
    config.log_dir = root.join("logs");
    config.download_dir = root.join("downloads");
    config.report_dir = root.join("report");
    config
}
