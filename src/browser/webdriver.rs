use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thirtyfour::components::SelectElement;
use thirtyfour::prelude::*;
use tokio::process::Child;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::config::BrowserKind;
use crate::core::driver::{DriverOps, Locator};
use crate::errors::{HarnessError, Result};

/// One live browser, driven over the WebDriver protocol. Owns the remote
/// session and, when the harness spawned the driver binary itself, the
/// driver child process. Exclusively owned by a single lifecycle scope;
/// `quit` releases both resources and is guarded so a second call is a
/// no-op.
pub struct WdSession {
    driver: Option<WebDriver>,
    child: Option<Child>,
    session_id: String,
    pub kind: BrowserKind,
    pub headless: bool,
    pub remote: bool,
}

impl WdSession {
    pub(crate) fn new(
        driver: WebDriver,
        child: Option<Child>,
        kind: BrowserKind,
        headless: bool,
        remote: bool,
    ) -> Self {
        Self {
            driver: Some(driver),
            child,
            session_id: Uuid::new_v4().to_string(),
            kind,
            headless,
            remote,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn describe(&self) -> String {
        format!(
            "Browser: {}\nHeadless: {}\nRemote: {}",
            self.kind, self.headless, self.remote
        )
    }

    fn handle(&self) -> Result<&WebDriver> {
        self.driver.as_ref().ok_or(HarnessError::SessionClosed)
    }
}

fn to_by(locator: &Locator) -> By {
    match locator {
        Locator::Id(v) => By::Id(v.as_str()),
        Locator::Css(v) => By::Css(v.as_str()),
        Locator::XPath(v) => By::XPath(v.as_str()),
        Locator::Name(v) => By::Name(v.as_str()),
        Locator::LinkText(v) => By::LinkText(v.as_str()),
        Locator::ClassName(v) => By::ClassName(v.as_str()),
        Locator::Tag(v) => By::Tag(v.as_str()),
    }
}

#[async_trait]
impl DriverOps for WdSession {
    type Element = WebElement;

    async fn goto(&self, url: &str) -> Result<()> {
        self.handle()?.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.handle()?.current_url().await?.to_string())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.handle()?.title().await?)
    }

    async fn refresh(&self) -> Result<()> {
        self.handle()?.refresh().await?;
        Ok(())
    }

    async fn find_one(&self, locator: &Locator) -> Result<Option<WebElement>> {
        match self.handle()?.find(to_by(locator)).await {
            Ok(element) => Ok(Some(element)),
            Err(thirtyfour::error::WebDriverError::NoSuchElement(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<WebElement>> {
        Ok(self.handle()?.find_all(to_by(locator)).await?)
    }

    async fn is_displayed(&self, element: &WebElement) -> Result<bool> {
        Ok(element.is_displayed().await?)
    }

    async fn is_enabled(&self, element: &WebElement) -> Result<bool> {
        Ok(element.is_enabled().await?)
    }

    async fn text_of(&self, element: &WebElement) -> Result<String> {
        Ok(element.text().await?)
    }

    async fn click_element(&self, element: &WebElement) -> Result<()> {
        element.click().await?;
        Ok(())
    }

    async fn clear_element(&self, element: &WebElement) -> Result<()> {
        element.clear().await?;
        Ok(())
    }

    async fn send_keys(&self, element: &WebElement, text: &str) -> Result<()> {
        element.send_keys(text).await?;
        Ok(())
    }

    async fn select_by_visible_text(&self, element: &WebElement, text: &str) -> Result<()> {
        let select = SelectElement::new(element).await?;
        select.select_by_exact_text(text).await?;
        Ok(())
    }

    async fn select_by_value(&self, element: &WebElement, value: &str) -> Result<()> {
        let select = SelectElement::new(element).await?;
        select.select_by_value(value).await?;
        Ok(())
    }

    async fn select_by_index(&self, element: &WebElement, index: u32) -> Result<()> {
        let select = SelectElement::new(element).await?;
        select.select_by_index(index as _).await?;
        Ok(())
    }

    async fn selected_option_text(&self, element: &WebElement) -> Result<String> {
        let select = SelectElement::new(element).await?;
        let option = select.first_selected_option().await?;
        Ok(option.text().await?)
    }

    async fn hover(&self, element: &WebElement) -> Result<()> {
        self.handle()?
            .action_chain()
            .move_to_element_center(element)
            .perform()
            .await?;
        Ok(())
    }

    async fn double_click(&self, element: &WebElement) -> Result<()> {
        self.handle()?
            .action_chain()
            .double_click_element(element)
            .perform()
            .await?;
        Ok(())
    }

    async fn context_click(&self, element: &WebElement) -> Result<()> {
        self.handle()?
            .action_chain()
            .context_click_element(element)
            .perform()
            .await?;
        Ok(())
    }

    async fn drag_and_drop(&self, source: &WebElement, target: &WebElement) -> Result<()> {
        self.handle()?
            .action_chain()
            .drag_and_drop_element(source, target)
            .perform()
            .await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &WebElement) -> Result<()> {
        element.scroll_into_view().await?;
        Ok(())
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let ret = self.handle()?.execute(script, args).await?;
        Ok(ret.json().clone())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        Ok(self.handle()?.screenshot_as_png().await?)
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.handle()?.source().await?)
    }

    async fn accept_alert(&self) -> Result<()> {
        self.handle()?.accept_alert().await?;
        Ok(())
    }

    async fn dismiss_alert(&self) -> Result<()> {
        self.handle()?.dismiss_alert().await?;
        Ok(())
    }

    async fn alert_text(&self) -> Result<String> {
        Ok(self.handle()?.get_alert_text().await?)
    }

    async fn enter_frame(&self, element: WebElement) -> Result<()> {
        element.enter_frame().await?;
        Ok(())
    }

    async fn enter_default_frame(&self) -> Result<()> {
        self.handle()?.enter_default_frame().await?;
        Ok(())
    }

    async fn set_timeouts(&self, page_load: Duration, implicit: Duration) -> Result<()> {
        let timeouts = TimeoutConfiguration::new(None, Some(page_load), Some(implicit));
        self.handle()?.update_timeouts(timeouts).await?;
        Ok(())
    }

    async fn quit(&mut self) -> Result<()> {
        let quit_result = match self.driver.take() {
            Some(driver) => {
                debug!(session = %self.session_id, "quitting webdriver session");
                driver.quit().await.map_err(HarnessError::from)
            }
            None => Ok(()),
        };
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!(session = %self.session_id, "could not stop driver process: {e}");
            }
        }
        quit_result
    }
}

impl Drop for WdSession {
    fn drop(&mut self) {
        if self.driver.is_some() {
            warn!(
                session = %self.session_id,
                "session dropped without quit; the browser may be left running"
            );
        }
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
    }
}
