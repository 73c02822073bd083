use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;

/// Strategy + value pair identifying zero or more elements in the current
/// document. Locators are cheap, immutable and re-resolved on every wait
/// iteration; element handles are never cached across polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(String),
    Css(String),
    XPath(String),
    Name(String),
    LinkText(String),
    ClassName(String),
    Tag(String),
}

impl Locator {
    pub fn id(value: impl Into<String>) -> Self {
        Locator::Id(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Locator::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Locator::XPath(value.into())
    }

    pub fn name(value: impl Into<String>) -> Self {
        Locator::Name(value.into())
    }

    pub fn link_text(value: impl Into<String>) -> Self {
        Locator::LinkText(value.into())
    }

    pub fn class_name(value: impl Into<String>) -> Self {
        Locator::ClassName(value.into())
    }

    pub fn tag(value: impl Into<String>) -> Self {
        Locator::Tag(value.into())
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            Locator::Id(_) => "id",
            Locator::Css(_) => "css",
            Locator::XPath(_) => "xpath",
            Locator::Name(_) => "name",
            Locator::LinkText(_) => "link-text",
            Locator::ClassName(_) => "class",
            Locator::Tag(_) => "tag",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Locator::Id(v)
            | Locator::Css(v)
            | Locator::XPath(v)
            | Locator::Name(v)
            | Locator::LinkText(v)
            | Locator::ClassName(v)
            | Locator::Tag(v) => v,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

/// The remote-control protocol boundary. The wait/interact layer and the
/// lifecycle manager only talk to this trait; production uses the WebDriver
/// client, the crate's own tests use a scripted double.
///
/// Lookup absence is a normal result (`None` / empty vec), not an error;
/// turning absence into a timeout is the wait layer's job.
#[async_trait]
pub trait DriverOps: Send + Sync {
    type Element: Send + Sync;

    async fn goto(&self, url: &str) -> Result<()>;
    async fn current_url(&self) -> Result<String>;
    async fn title(&self) -> Result<String>;
    async fn refresh(&self) -> Result<()>;

    async fn find_one(&self, locator: &Locator) -> Result<Option<Self::Element>>;
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element>>;

    async fn is_displayed(&self, element: &Self::Element) -> Result<bool>;
    async fn is_enabled(&self, element: &Self::Element) -> Result<bool>;
    async fn text_of(&self, element: &Self::Element) -> Result<String>;

    async fn click_element(&self, element: &Self::Element) -> Result<()>;
    async fn clear_element(&self, element: &Self::Element) -> Result<()>;
    async fn send_keys(&self, element: &Self::Element, text: &str) -> Result<()>;

    async fn select_by_visible_text(&self, element: &Self::Element, text: &str) -> Result<()>;
    async fn select_by_value(&self, element: &Self::Element, value: &str) -> Result<()>;
    async fn select_by_index(&self, element: &Self::Element, index: u32) -> Result<()>;
    async fn selected_option_text(&self, element: &Self::Element) -> Result<String>;

    async fn hover(&self, element: &Self::Element) -> Result<()>;
    async fn double_click(&self, element: &Self::Element) -> Result<()>;
    async fn context_click(&self, element: &Self::Element) -> Result<()>;
    async fn drag_and_drop(&self, source: &Self::Element, target: &Self::Element) -> Result<()>;
    async fn scroll_into_view(&self, element: &Self::Element) -> Result<()>;

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value>;
    async fn screenshot_png(&self) -> Result<Vec<u8>>;
    async fn page_source(&self) -> Result<String>;

    /// Alert operations fail when no alert is currently present.
    async fn accept_alert(&self) -> Result<()>;
    async fn dismiss_alert(&self) -> Result<()>;
    async fn alert_text(&self) -> Result<String>;

    async fn enter_frame(&self, element: Self::Element) -> Result<()>;
    async fn enter_default_frame(&self) -> Result<()>;

    async fn set_timeouts(&self, page_load: Duration, implicit: Duration) -> Result<()>;

    /// Release the underlying browser. Safe to call at most once; the
    /// lifecycle manager owns that guarantee.
    async fn quit(&mut self) -> Result<()>;
}
