use std::path::{Path, PathBuf};

use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::Result;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("sanitize pattern is valid"));

/// Reduce an arbitrary label (test name, locator value) to something safe in
/// a filename on every platform.
pub fn sanitize_label(raw: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(raw.trim(), "_");
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Timestamp suffix used to keep artifact names unique across concurrent
/// writers.
pub fn timestamp_slug() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Write a PNG screenshot as `<label>_<timestamp>.png`, creating the target
/// directory on first use. Returns the written path.
pub async fn write_screenshot(dir: &Path, label: &str, png: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let file_name = format!("{}_{}.png", sanitize_label(label), timestamp_slug());
    let path = dir.join(file_name);
    tokio::fs::write(&path, png).await?;
    Ok(path)
}
