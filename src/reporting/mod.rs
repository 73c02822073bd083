pub mod environment;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::Result;
use crate::utils::artifacts::sanitize_label;

/// What an attachment contains; decides the file extension external report
/// tooling sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Text,
    Html,
    Png,
}

impl AttachmentKind {
    fn extension(self) -> &'static str {
        match self {
            AttachmentKind::Text => "txt",
            AttachmentKind::Html => "html",
            AttachmentKind::Png => "png",
        }
    }
}

/// Filesystem report sink: named attachments keyed to a test land under
/// `<report-dir>/<test>/`. Written once, never mutated; external report
/// tooling picks the directory up after the run.
#[derive(Debug, Clone)]
pub struct ReportSink {
    dir: PathBuf,
}

impl ReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn attach_text(&self, test: &str, name: &str, body: &str) -> Result<PathBuf> {
        self.attach(test, name, AttachmentKind::Text, body.as_bytes())
    }

    pub fn attach_html(&self, test: &str, name: &str, body: &str) -> Result<PathBuf> {
        self.attach(test, name, AttachmentKind::Html, body.as_bytes())
    }

    pub fn attach_png(&self, test: &str, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.attach(test, name, AttachmentKind::Png, bytes)
    }

    pub fn attach(
        &self,
        test: &str,
        name: &str,
        kind: AttachmentKind,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        let test_dir = self.dir.join(sanitize_label(test));
        std::fs::create_dir_all(&test_dir)?;
        let path = test_dir.join(format!("{}.{}", sanitize_label(name), kind.extension()));
        std::fs::write(&path, bytes)?;
        debug!("attached {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}
