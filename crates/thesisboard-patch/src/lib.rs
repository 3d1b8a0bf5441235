//! Approval & patch engine.
//!
//! [`apply`] is the pure part: opinion + state + page in, patched state +
//! page + audit lines out. [`approve`] wraps it with the file handling:
//! backups, whole-file writes, restore on failure, the changelog, and
//! archiving the consumed opinion.

mod apply;
mod approve;
mod category;
mod error;
pub mod html;
mod timeline;

pub use apply::{PatchOutcome, apply};
pub use approve::{ApprovalPaths, ApprovalReport, approve};
pub use category::{CATEGORIES, category_key};
pub use error::PatchError;
pub use timeline::{TIMELINE_CONTAINER_ID, render_event};
