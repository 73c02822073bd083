use std::fs;
use std::path::Path;

use serde_json::json;

use crate::core::config::HarnessConfig;
use crate::errors::Result;

/// Create the run's working directories and describe the environment the way
/// external report tooling expects to find it.
pub fn prepare_run_workspace(config: &HarnessConfig) -> Result<()> {
    for dir in [
        &config.screenshot_dir,
        &config.log_dir,
        &config.download_dir,
        &config.report_dir,
    ] {
        fs::create_dir_all(dir)?;
    }
    write_environment_files(config, &config.report_dir)
}

/// Write `environment.properties` (key=value lines) and `environment.json`
/// next to the report directory's attachments.
pub fn write_environment_files(config: &HarnessConfig, report_dir: &Path) -> Result<()> {
    let entries = [
        ("Harness.Version", env!("CARGO_PKG_VERSION").to_string()),
        (
            "Platform",
            format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
        ),
        ("Browser", config.browser.to_string()),
        ("Headless", config.headless.to_string()),
        ("Remote", config.remote.to_string()),
        ("Environment", config.environment.to_string()),
    ];

    let mut properties = String::new();
    for (key, value) in &entries {
        properties.push_str(key);
        properties.push('=');
        properties.push_str(value);
        properties.push('\n');
    }
    fs::write(report_dir.join("environment.properties"), properties)?;

    let payload = json!({
        "harness_version": env!("CARGO_PKG_VERSION"),
        "platform": format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
        "browser": config.browser.to_string(),
        "headless": config.headless,
        "remote": config.remote,
        "environment": config.environment.to_string(),
        "base_url": config.base_url(),
    });
    fs::write(
        report_dir.join("environment.json"),
        serde_json::to_string_pretty(&payload)?,
    )?;
    Ok(())
}
