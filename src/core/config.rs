use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{HarnessError, Result};

/// Browsers the provisioner knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrowserKind {
    Chrome,
    Firefox,
    Edge,
    Safari,
}

impl FromStr for BrowserKind {
    type Err = HarnessError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "chrome" => Ok(BrowserKind::Chrome),
            "firefox" => Ok(BrowserKind::Firefox),
            "edge" => Ok(BrowserKind::Edge),
            "safari" => Ok(BrowserKind::Safari),
            other => Err(HarnessError::Configuration(format!(
                "Unsupported browser: {other}"
            ))),
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Edge => "edge",
            BrowserKind::Safari => "safari",
        };
        f.write_str(name)
    }
}

/// Deployment the suites run against. Each environment has a well-known base
/// URL; `BASE_URL` overrides the table entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestEnvironment {
    Dev,
    Staging,
    Prod,
}

impl TestEnvironment {
    pub fn base_url(self) -> &'static str {
        match self {
            TestEnvironment::Dev => "https://dev.example.com",
            TestEnvironment::Staging => "https://staging.example.com",
            TestEnvironment::Prod => "https://www.example.com",
        }
    }
}

impl FromStr for TestEnvironment {
    type Err = HarnessError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "dev" => Ok(TestEnvironment::Dev),
            "staging" => Ok(TestEnvironment::Staging),
            "prod" => Ok(TestEnvironment::Prod),
            other => Err(HarnessError::Configuration(format!(
                "Unknown test environment: {other}"
            ))),
        }
    }
}

impl fmt::Display for TestEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestEnvironment::Dev => "dev",
            TestEnvironment::Staging => "staging",
            TestEnvironment::Prod => "prod",
        };
        f.write_str(name)
    }
}

/// Immutable run configuration. Built once at process start (`from_env`) and
/// passed into the provisioner, page layer and lifecycle manager; nothing
/// else reads the process environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub browser: BrowserKind,
    pub headless: bool,
    pub remote: bool,
    pub remote_url: String,
    /// Prefer spawning the driver binary over connecting to one that is
    /// already running.
    pub manage_driver: bool,
    pub default_timeout: Duration,
    pub page_load_timeout: Duration,
    pub implicit_wait: Duration,
    pub environment: TestEnvironment,
    pub base_url_override: Option<String>,
    pub screenshot_dir: PathBuf,
    pub log_dir: PathBuf,
    pub download_dir: PathBuf,
    pub report_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chrome,
            headless: false,
            remote: false,
            remote_url: "http://localhost:4444/wd/hub".to_string(),
            manage_driver: false,
            default_timeout: Duration::from_secs(10),
            page_load_timeout: Duration::from_secs(30),
            implicit_wait: Duration::from_secs(5),
            environment: TestEnvironment::Dev,
            base_url_override: None,
            screenshot_dir: PathBuf::from("screenshots"),
            log_dir: PathBuf::from("logs"),
            download_dir: PathBuf::from("downloads"),
            report_dir: PathBuf::from("report"),
        }
    }
}

impl HarnessConfig {
    /// Layer environment variables over the defaults. Invalid values fail
    /// here, before anything is launched.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("BROWSER") {
            config.browser = raw.parse()?;
        }
        if let Ok(raw) = env::var("HEADLESS") {
            config.headless = parse_bool(&raw);
        }
        if let Ok(raw) = env::var("USE_REMOTE") {
            config.remote = parse_bool(&raw);
        }
        if let Ok(raw) = env::var("REMOTE_URL") {
            config.remote_url = parse_url("REMOTE_URL", raw)?;
        }
        if let Ok(raw) = env::var("MANAGE_DRIVER") {
            config.manage_driver = parse_bool(&raw);
        }
        if let Ok(raw) = env::var("DEFAULT_TIMEOUT") {
            config.default_timeout = parse_seconds("DEFAULT_TIMEOUT", &raw)?;
        }
        if let Ok(raw) = env::var("PAGE_LOAD_TIMEOUT") {
            config.page_load_timeout = parse_seconds("PAGE_LOAD_TIMEOUT", &raw)?;
        }
        if let Ok(raw) = env::var("IMPLICIT_WAIT") {
            config.implicit_wait = parse_seconds("IMPLICIT_WAIT", &raw)?;
        }
        if let Ok(raw) = env::var("TEST_ENV") {
            config.environment = raw.parse()?;
        }
        if let Ok(raw) = env::var("BASE_URL") {
            config.base_url_override = Some(parse_url("BASE_URL", raw)?);
        }
        if let Ok(raw) = env::var("REPORT_DIR") {
            config.report_dir = PathBuf::from(raw);
        }

        Ok(config)
    }

    /// Base URL for the configured environment, honoring the explicit
    /// override.
    pub fn base_url(&self) -> &str {
        self.base_url_override
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

fn parse_seconds(key: &str, raw: &str) -> Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| {
            HarnessError::Configuration(format!("{key} must be a whole number of seconds: {raw}"))
        })
}

fn parse_url(key: &str, raw: String) -> Result<String> {
    Url::parse(&raw)
        .map_err(|e| HarnessError::Configuration(format!("{key} is not a valid URL: {e}")))?;
    Ok(raw)
}
