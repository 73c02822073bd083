use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Driver provisioning failed: {0}")]
    Provisioning(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element not visible: {0}")]
    ElementNotVisible(String),

    #[error("Interaction failed on {locator}: {source}")]
    Interaction {
        locator: String,
        #[source]
        source: Box<HarnessError>,
    },

    #[error("Timed out after {0:?} waiting for {1}")]
    Timeout(Duration, String),

    #[error("Session already closed")]
    SessionClosed,

    #[error("Driver command failed: {0}")]
    Command(String),

    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
