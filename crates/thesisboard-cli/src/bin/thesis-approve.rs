//! Apply the pending opinion to the state document and the dashboard page.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use thesisboard_ai::{Level, Notifier, notify_best_effort};
use thesisboard_patch::{ApprovalPaths, approve};
use tracing::info;

use thesisboard_cli::{NotifyArgs, fail, init_tracing};

/// Audit lines included in the notification; the changelog has all of them.
const NOTIFY_MAX_LINES: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "thesis-approve", version, about = "Apply the staged opinion")]
struct Cli {
    #[arg(long, env = "THESIS_STATE_PATH", default_value = "data/state.json")]
    state: PathBuf,

    #[arg(long, env = "THESIS_PAGE_PATH", default_value = "site/index.html")]
    page: PathBuf,

    #[arg(long, env = "THESIS_HISTORY_PATH", default_value = "data/event_history.json")]
    history: PathBuf,

    #[arg(long, env = "THESIS_CHANGELOG_PATH", default_value = "data/changelog.txt")]
    changelog: PathBuf,

    #[arg(long, env = "THESIS_OPINION_PATH", default_value = "data/pending_opinion.json")]
    opinion: PathBuf,

    #[command(flatten)]
    notify: NotifyArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let notifier = cli.notify.build();

    match run(&cli, notifier.as_ref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(notifier.as_ref(), "thesis-approve", &e).await,
    }
}

async fn run(cli: &Cli, notifier: &dyn Notifier) -> anyhow::Result<()> {
    let paths = ApprovalPaths {
        state: cli.state.clone(),
        page: cli.page.clone(),
        history: cli.history.clone(),
        changelog: cli.changelog.clone(),
        opinion: cli.opinion.clone(),
    };
    let report = approve(&paths, Utc::now()).context("applying opinion")?;
    info!(
        changes = report.change_count,
        archived = %report.archived_to.display(),
        "approval complete"
    );

    let mut body = report
        .audit
        .iter()
        .take(NOTIFY_MAX_LINES)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let more = report.audit.len().saturating_sub(NOTIFY_MAX_LINES);
    if more > 0 {
        body.push_str(&format!("\n... and {more} more"));
    }
    notify_best_effort(
        notifier,
        Level::Info,
        &format!("Opinion applied: {} changes", report.change_count),
        &body,
    )
    .await;
    Ok(())
}
