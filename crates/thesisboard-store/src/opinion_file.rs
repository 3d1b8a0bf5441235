use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thesisboard_core::OpinionDocument;
use tracing::{info, warn};

use crate::StoreError;
use crate::json_file::{read_json, write_json_atomic};

/// The single pending opinion document awaiting approval.
pub struct OpinionFile {
    path: PathBuf,
}

impl OpinionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_pending(&self) -> bool {
        self.path.exists()
    }

    /// Stage a new opinion. Only one can be pending; an unapplied one is replaced.
    pub fn stage(&self, doc: &OpinionDocument) -> Result<(), StoreError> {
        if self.is_pending() {
            warn!(path = %self.path.display(), "replacing unapplied pending opinion");
        }
        write_json_atomic(&self.path, doc)?;
        info!(path = %self.path.display(), "staged opinion for approval");
        Ok(())
    }

    pub fn load(&self) -> Result<OpinionDocument, StoreError> {
        read_json(&self.path)
    }

    /// Move the pending document aside so it cannot be applied twice.
    /// Returns the archive path.
    pub fn archive(&self, at: DateTime<Utc>) -> Result<PathBuf, StoreError> {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".applied-{}", at.format("%Y%m%dT%H%M%SZ")));
        let target = self.path.with_file_name(name);
        std::fs::rename(&self.path, &target).map_err(|e| StoreError::io(&self.path, e))?;
        info!(path = %target.display(), "archived applied opinion");
        Ok(target)
    }
}
