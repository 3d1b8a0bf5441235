//! Storage layer: the state document, staged opinions, backups, changelog, and dedup history.
//!
//! Everything is a plain file. Writes replace whole files through a temporary
//! sibling that is renamed over the target, so readers never see half a document.

mod backup;
mod changelog;
mod error;
mod history;
mod json_file;
mod opinion_file;
mod state_file;

pub use backup::Backup;
pub use changelog::Changelog;
pub use error::StoreError;
pub use history::EventHistory;
pub use json_file::{read_json, write_json_atomic, write_text_atomic};
pub use opinion_file::OpinionFile;
pub use state_file::StateFile;
