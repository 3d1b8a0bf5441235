use std::path::{Path, PathBuf};

use serde_json::Value;
use thesisboard_core::StateBlob;
use tracing::{info, warn};

use crate::StoreError;
use crate::json_file::{read_json, write_json_atomic};

/// The persisted state document: read whole at cycle start, replaced whole at the end.
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Sections that do not fit the schema load as their defaults, with a
    /// warning each. Unreadable JSON is still an error.
    pub fn load(&self) -> Result<StateBlob, StoreError> {
        let raw: Value = read_json(&self.path)?;
        let (state, problems) =
            StateBlob::from_value_lenient(raw).map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })?;
        for problem in &problems {
            warn!(path = %self.path.display(), %problem, "state entry ignored");
        }
        info!(path = %self.path.display(), ignored = problems.len(), "loaded state");
        Ok(state)
    }

    /// Like [`load`](Self::load), but a missing file yields an empty state.
    /// Used by the fetch cycle so the first run can bootstrap the document.
    pub fn load_or_default(&self) -> Result<StateBlob, StoreError> {
        match self.load() {
            Err(StoreError::NotFound(path)) => {
                warn!(path = %path.display(), "state file missing, starting from empty state");
                Ok(StateBlob::default())
            }
            other => other,
        }
    }

    pub fn save(&self, state: &StateBlob) -> Result<(), StoreError> {
        write_json_atomic(&self.path, state)?;
        info!(path = %self.path.display(), "saved state");
        Ok(())
    }
}
