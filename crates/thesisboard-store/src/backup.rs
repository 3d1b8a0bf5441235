use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::StoreError;

/// Copies of a set of files taken before a multi-file write.
///
/// Each existing file is copied to `<name>.bak` beside it. Files that did not
/// exist are remembered so [`restore`](Self::restore) can remove whatever the
/// failed write created in their place.
#[derive(Debug)]
pub struct Backup {
    entries: Vec<BackupEntry>,
}

#[derive(Debug)]
struct BackupEntry {
    target: PathBuf,
    copy: Option<PathBuf>,
}

impl Backup {
    pub fn create(paths: &[&Path]) -> Result<Self, StoreError> {
        let mut entries = Vec::with_capacity(paths.len());
        for &path in paths {
            let copy = if path.exists() {
                let bak = backup_path(path);
                std::fs::copy(path, &bak).map_err(|e| StoreError::io(&bak, e))?;
                Some(bak)
            } else {
                None
            };
            entries.push(BackupEntry {
                target: path.to_path_buf(),
                copy,
            });
        }
        info!(files = entries.len(), "backed up files before write");
        Ok(Self { entries })
    }

    /// Put every file back the way it was at [`create`](Self::create) time.
    ///
    /// Attempts every file even if one fails, and reports the first failure.
    pub fn restore(&self) -> Result<(), StoreError> {
        let mut first_err = None;
        for entry in &self.entries {
            let result = match &entry.copy {
                Some(bak) => std::fs::copy(bak, &entry.target)
                    .map(|_| ())
                    .map_err(|e| StoreError::io(&entry.target, e)),
                None if entry.target.exists() => std::fs::remove_file(&entry.target)
                    .map_err(|e| StoreError::io(&entry.target, e)),
                None => Ok(()),
            };
            match result {
                Ok(()) => info!(path = %entry.target.display(), "restored from backup"),
                Err(e) => {
                    warn!(path = %entry.target.display(), error = %e, "restore failed");
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}
