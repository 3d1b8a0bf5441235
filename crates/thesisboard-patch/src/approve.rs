use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thesisboard_store::{
    Backup, Changelog, EventHistory, OpinionFile, StateFile, StoreError, write_text_atomic,
};
use tracing::{error, info};

use crate::PatchError;
use crate::apply::{PatchOutcome, apply};

/// Files touched by one approval.
#[derive(Debug, Clone)]
pub struct ApprovalPaths {
    pub state: PathBuf,
    pub page: PathBuf,
    pub history: PathBuf,
    pub changelog: PathBuf,
    pub opinion: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ApprovalReport {
    pub change_count: usize,
    pub audit: Vec<String>,
    pub new_events: usize,
    /// Where the consumed opinion was moved.
    pub archived_to: PathBuf,
}

/// Apply the pending opinion and persist the result.
///
/// State, page, and history are backed up before anything is written. If
/// any of those writes or the changelog append fails, the backups are put
/// back and the error returned. On success the opinion is archived, so it
/// cannot be applied again.
pub fn approve(paths: &ApprovalPaths, now: DateTime<Utc>) -> Result<ApprovalReport, PatchError> {
    let opinion = OpinionFile::new(&paths.opinion);
    if !opinion.is_pending() {
        return Err(PatchError::NothingPending(paths.opinion.clone()));
    }
    let doc = opinion.load()?;
    let state_file = StateFile::new(&paths.state);
    let state = state_file.load()?;
    let page = std::fs::read_to_string(&paths.page).map_err(|source| PatchError::ReadPage {
        path: paths.page.clone(),
        source,
    })?;
    let mut history = EventHistory::load(&paths.history)?;

    let outcome = apply(&doc, &state, &page, &history);
    for key in &outcome.new_keys {
        history.insert(key.clone());
    }

    let backup = Backup::create(&[
        paths.state.as_path(),
        paths.page.as_path(),
        paths.history.as_path(),
    ])?;
    let written = write_all(paths, &state_file, &outcome, &history, now);
    if let Err(write) = written {
        error!(error = %write, "approval write failed, restoring backups");
        return Err(match backup.restore() {
            Ok(()) => PatchError::Restored(write),
            Err(restore) => PatchError::RestoreFailed { write, restore },
        });
    }

    let archived_to = opinion.archive(now)?;
    info!(
        changes = outcome.change_count(),
        new_events = outcome.new_keys.len(),
        "approval applied"
    );
    Ok(ApprovalReport {
        change_count: outcome.change_count(),
        audit: outcome.audit,
        new_events: outcome.new_keys.len(),
        archived_to,
    })
}

fn write_all(
    paths: &ApprovalPaths,
    state_file: &StateFile,
    outcome: &PatchOutcome,
    history: &EventHistory,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    state_file.save(&outcome.state)?;
    write_text_atomic(&paths.page, &outcome.page)?;
    history.save()?;
    Changelog::new(&paths.changelog).append_block(now, &outcome.audit)
}
