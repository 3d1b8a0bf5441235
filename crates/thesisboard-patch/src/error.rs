use std::path::PathBuf;

use thesisboard_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("no pending opinion at {0}")]
    NothingPending(PathBuf),

    #[error("reading {path}: {source}")]
    ReadPage {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The write failed and the backups were put back.
    #[error("write failed, restored from backup: {0}")]
    Restored(#[source] StoreError),

    /// The write failed and so did putting the backups back.
    #[error("write failed ({write}); restore also failed ({restore})")]
    RestoreFailed {
        write: StoreError,
        restore: StoreError,
    },
}
