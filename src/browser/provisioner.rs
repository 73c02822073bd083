use std::process::Stdio;
use std::time::Duration;

use thirtyfour::common::capabilities::desiredcapabilities::Capabilities;
use thirtyfour::prelude::*;
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::browser::webdriver::WdSession;
use crate::core::config::{BrowserKind, HarnessConfig};
use crate::core::driver::DriverOps;
use crate::errors::{HarnessError, Result};

const SPAWN_CONNECT_ATTEMPTS: u32 = 10;
const SPAWN_CONNECT_DELAY: Duration = Duration::from_millis(300);

/// Provision a ready-to-use session for the configured browser.
///
/// Remote mode connects to the hub endpoint. Local mode tries two launch
/// strategies (spawning the driver binary found on PATH, or connecting to a
/// driver that is already running), falling back from the preferred one to
/// the other exactly once. Page-load and implicit-wait timeouts are applied
/// before the session is handed out.
pub async fn provision(config: &HarnessConfig) -> Result<WdSession> {
    let caps = build_capabilities(config.browser, config.headless)?;

    let (driver, child) = if config.remote {
        info!(browser = %config.browser, url = %config.remote_url, "connecting to remote hub");
        let driver = WebDriver::new(&config.remote_url, caps).await.map_err(|e| {
            HarnessError::Provisioning(format!(
                "remote hub {} refused the session: {e}",
                config.remote_url
            ))
        })?;
        (driver, None)
    } else {
        launch_local(config, caps).await?
    };

    let session = WdSession::new(driver, child, config.browser, config.headless, config.remote);
    session
        .set_timeouts(config.page_load_timeout, config.implicit_wait)
        .await?;
    info!(
        session = %session.session_id(),
        browser = %config.browser,
        "session ready"
    );
    Ok(session)
}

fn build_capabilities(kind: BrowserKind, headless: bool) -> Result<Capabilities> {
    match kind {
        BrowserKind::Chrome => {
            let mut caps = DesiredCapabilities::chrome();
            if headless {
                caps.add_arg("--headless=new")?;
            }
            caps.add_arg("--start-maximized")?;
            caps.add_arg("--disable-extensions")?;
            caps.add_arg("--disable-popup-blocking")?;
            Ok(caps.into())
        }
        BrowserKind::Firefox => {
            let mut caps = DesiredCapabilities::firefox();
            if headless {
                caps.add_arg("-headless")?;
            }
            Ok(caps.into())
        }
        BrowserKind::Edge => {
            let mut caps = DesiredCapabilities::edge();
            if headless {
                caps.add_arg("--headless")?;
            }
            caps.add_arg("--start-maximized")?;
            Ok(caps.into())
        }
        // Safari has no headless mode; the flag is accepted and ignored.
        BrowserKind::Safari => Ok(DesiredCapabilities::safari().into()),
    }
}

fn driver_binary(kind: BrowserKind) -> &'static str {
    match kind {
        BrowserKind::Chrome => "chromedriver",
        BrowserKind::Firefox => "geckodriver",
        BrowserKind::Edge => "msedgedriver",
        BrowserKind::Safari => "safaridriver",
    }
}

fn driver_port(kind: BrowserKind) -> u16 {
    match kind {
        BrowserKind::Chrome => 9515,
        BrowserKind::Firefox => 4444,
        BrowserKind::Edge => 9516,
        BrowserKind::Safari => 4445,
    }
}

fn local_endpoint(kind: BrowserKind) -> String {
    format!("http://localhost:{}", driver_port(kind))
}

async fn launch_local(
    config: &HarnessConfig,
    caps: Capabilities,
) -> Result<(WebDriver, Option<Child>)> {
    let endpoint = local_endpoint(config.browser);

    // safaridriver ships with the OS and is managed outside the harness.
    if config.browser == BrowserKind::Safari {
        return connect_external(&endpoint, caps).await.map_err(|e| {
            HarnessError::Provisioning(format!("safari driver at {endpoint} unavailable: {e}"))
        });
    }

    let prefer_managed = config.manage_driver;
    let first_result = if prefer_managed {
        spawn_managed(config.browser, &endpoint, caps.clone()).await
    } else {
        connect_external(&endpoint, caps.clone()).await
    };

    let first_err = match first_result {
        Ok(launched) => return Ok(launched),
        Err(e) => e,
    };
    warn!(
        browser = %config.browser,
        "preferred launch strategy failed ({first_err}); trying the other strategy once"
    );

    let second_result = if prefer_managed {
        connect_external(&endpoint, caps).await
    } else {
        spawn_managed(config.browser, &endpoint, caps).await
    };

    second_result.map_err(|second_err| {
        HarnessError::Provisioning(format!(
            "both local launch strategies failed for {}: {first_err}; then: {second_err}",
            config.browser
        ))
    })
}

/// Single connection attempt against a driver somebody else started.
async fn connect_external(
    endpoint: &str,
    caps: Capabilities,
) -> Result<(WebDriver, Option<Child>)> {
    let driver = WebDriver::new(endpoint, caps).await?;
    Ok((driver, None))
}

/// Spawn the driver binary from PATH and connect once it starts listening.
/// The child is killed again if the connection never comes up.
async fn spawn_managed(
    kind: BrowserKind,
    endpoint: &str,
    caps: Capabilities,
) -> Result<(WebDriver, Option<Child>)> {
    let binary = driver_binary(kind);
    let port = driver_port(kind);
    let mut child = Command::new(binary)
        .arg(format!("--port={port}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| HarnessError::Provisioning(format!("could not spawn {binary}: {e}")))?;

    let mut last_err = None;
    for _ in 0..SPAWN_CONNECT_ATTEMPTS {
        match WebDriver::new(endpoint, caps.clone()).await {
            Ok(driver) => return Ok((driver, Some(child))),
            Err(e) => {
                last_err = Some(e);
                tokio::time::sleep(SPAWN_CONNECT_DELAY).await;
            }
        }
    }

    let _ = child.start_kill();
    let detail = last_err
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no connection attempt was made".to_string());
    Err(HarnessError::Provisioning(format!(
        "{binary} never became reachable at {endpoint}: {detail}"
    )))
}
