use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::StoreError;

/// Append-only plain-text log of applied changes, one block per run.
pub struct Changelog {
    path: PathBuf,
}

impl Changelog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a block headed by `at`. An empty `lines` still writes a block
    /// so every run leaves a trace.
    pub fn append_block(&self, at: DateTime<Utc>, lines: &[String]) -> Result<(), StoreError> {
        let mut block = format!("=== {} ===\n", at.to_rfc3339_opts(SecondsFormat::Secs, true));
        if lines.is_empty() {
            block.push_str("(no changes)\n");
        }
        for line in lines {
            block.push_str("- ");
            block.push_str(line);
            block.push('\n');
        }
        block.push('\n');

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        file.write_all(block.as_bytes())
            .map_err(|e| StoreError::io(&self.path, e))
    }
}
