//! Ask the narrative model for an opinion on the current state and stage it
//! for approval.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::Parser;
use thesisboard_ai::{
    Level, MessagesClient, NarrativeConfig, NarrativeError, Notifier, generate_opinion,
    notify_best_effort,
};
use thesisboard_core::OpinionDocument;
use thesisboard_store::{OpinionFile, StateFile, write_text_atomic};
use tracing::{error, info};

use thesisboard_cli::{NotifyArgs, fail, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "thesis-analyze", version, about = "Generate and stage an opinion document")]
struct Cli {
    #[arg(long, env = "THESIS_STATE_PATH", default_value = "data/state.json")]
    state: PathBuf,

    #[arg(long, env = "THESIS_CONTEXT_PATH", default_value = "data/context.md")]
    context: PathBuf,

    #[arg(long, env = "THESIS_OPINION_PATH", default_value = "data/pending_opinion.json")]
    opinion: PathBuf,

    /// Raw model output is written here when it cannot be parsed.
    #[arg(long, env = "THESIS_DEBUG_PATH", default_value = "data/debug_last_response.txt")]
    debug_output: PathBuf,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_API_URL", default_value = "https://api.anthropic.com")]
    api_url: String,

    #[arg(long, env = "NARRATIVE_MODEL", default_value = "claude-3-5-sonnet-latest")]
    model: String,

    #[arg(long, env = "NARRATIVE_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: u32,

    #[arg(long, env = "NARRATIVE_TIMEOUT_SECS", default_value_t = 120)]
    timeout_secs: u64,

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
        Err(e) => fail(notifier.as_ref(), "thesis-analyze", &e).await,
    }
}

async fn run(cli: &Cli, notifier: &dyn Notifier) -> anyhow::Result<()> {
    let Some(api_key) = cli.api_key.clone() else {
        bail!("ANTHROPIC_API_KEY is not set");
    };
    let state = StateFile::new(&cli.state).load().context("loading state")?;
    let context = std::fs::read_to_string(&cli.context)
        .with_context(|| format!("reading context document {}", cli.context.display()))?;

    let client = MessagesClient::new(NarrativeConfig {
        api_url: cli.api_url.clone(),
        api_key,
        model: cli.model.clone(),
        max_tokens: cli.max_tokens,
        timeout: Duration::from_secs(cli.timeout_secs),
    })
    .context("building narrative client")?;

    let mut doc = match generate_opinion(&client, &state, &context).await {
        Ok(doc) => doc,
        Err(NarrativeError::Contract { raw, source }) => {
            error!(error = %source, path = %cli.debug_output.display(), "unusable model response");
            write_text_atomic(&cli.debug_output, &raw).context("writing debug response")?;
            bail!(
                "model response rejected ({source}); raw text saved to {}",
                cli.debug_output.display()
            );
        }
        Err(e) => return Err(e).context("generating opinion"),
    };
    doc.generated_at = Some(Utc::now());

    OpinionFile::new(&cli.opinion)
        .stage(&doc)
        .context("staging opinion")?;
    info!(path = %cli.opinion.display(), "opinion staged for approval");

    notify_best_effort(notifier, Level::Info, "Opinion ready for review", &summary(&doc)).await;
    Ok(())
}

fn summary(doc: &OpinionDocument) -> String {
    let mut lines = Vec::new();
    if let Some(status) = doc.overall_status {
        lines.push(format!("Overall: {}", status.as_str()));
    }
    if let Some(score) = doc.thesis_score {
        lines.push(format!("Score: {score}"));
    }
    for delta in &doc.scorecard {
        lines.push(format!(
            "{}: {} -> {}",
            delta.category,
            delta.previous_status.map_or("?", |s| s.as_str()),
            delta.recommended_status.as_str()
        ));
    }
    lines.push(format!("Timeline events proposed: {}", doc.timeline_events.len()));
    lines.join("\n")
}
