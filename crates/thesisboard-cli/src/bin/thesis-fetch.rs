//! One fetch cycle: every source, reconcile, persist, escalate if degraded.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use thesisboard_ai::{Notifier, escalate_if_degraded};
use thesisboard_core::{DEFAULT_ESCALATION_THRESHOLD, HealthStatus, reconcile};
use thesisboard_sources::{Adapters, HttpFetcher, RetryPolicy, SourcesConfig, collect};
use thesisboard_store::StateFile;
use tracing::info;

use thesisboard_cli::{NotifyArgs, fail, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "thesis-fetch", version, about = "Refresh live data in the state document")]
struct Cli {
    #[arg(long, env = "THESIS_STATE_PATH", default_value = "data/state.json")]
    state: PathBuf,

    /// Failed sources in one cycle that trigger an alert. 0 disables.
    #[arg(long, env = "ESCALATION_THRESHOLD", default_value_t = DEFAULT_ESCALATION_THRESHOLD)]
    escalation_threshold: usize,

    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 15)]
    http_timeout_secs: u64,

    #[arg(long, env = "HTTP_RETRY_DELAY_SECS", default_value_t = 2)]
    http_retry_delay_secs: u64,

    #[arg(long, env = "COIN_ID", default_value = "ripple")]
    coin_id: String,

    #[arg(long, env = "FRED_API_KEY", hide_env_values = true)]
    fred_api_key: Option<String>,

    /// Pause between consecutive FRED series requests.
    #[arg(long, env = "FRED_DELAY_MS", default_value_t = 1000)]
    fred_delay_ms: u64,

    #[arg(long, env = "FLOWS_URL")]
    flows_url: Option<String>,

    #[arg(long, env = "LEDGER_RPC_URL", default_value = "https://xrplcluster.com")]
    ledger_rpc_url: String,

    /// Comma-separated accounts whose balances are summed.
    #[arg(long, env = "TRACKED_ACCOUNTS", value_delimiter = ',')]
    tracked_accounts: Vec<String>,

    #[arg(long, env = "CRYPTOPANIC_API_KEY", hide_env_values = true)]
    news_api_key: Option<String>,

    #[command(flatten)]
    notify: NotifyArgs,
}

impl Cli {
    fn sources_config(&self) -> SourcesConfig {
        SourcesConfig {
            coin_id: self.coin_id.clone(),
            fred_api_key: self.fred_api_key.clone(),
            fred_delay: Duration::from_millis(self.fred_delay_ms),
            flows_url: self.flows_url.clone(),
            ledger_rpc_url: self.ledger_rpc_url.clone(),
            tracked_accounts: self.tracked_accounts.clone(),
            news_api_key: self.news_api_key.clone(),
            ..SourcesConfig::default()
        }
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(self.http_timeout_secs),
            backoff: Duration::from_secs(self.http_retry_delay_secs),
            retries: 1,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let notifier = cli.notify.build();

    match run(&cli, notifier.as_ref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(notifier.as_ref(), "thesis-fetch", &e).await,
    }
}

async fn run(cli: &Cli, notifier: &dyn Notifier) -> anyhow::Result<()> {
    let store = StateFile::new(&cli.state);
    let previous = store.load_or_default().context("loading state")?;

    let http = HttpFetcher::new(cli.retry_policy()).context("building HTTP client")?;
    let adapters = Adapters::new(http, &cli.sources_config());
    let fresh = collect(&adapters, &previous).await;

    let next = reconcile(&previous, fresh, Utc::now());
    store.save(&next).context("saving state")?;

    let count = |status| next.health.values().filter(|h| h.status == status).count();
    info!(
        ok = count(HealthStatus::Ok),
        fail = count(HealthStatus::Fail),
        skip = count(HealthStatus::Skip),
        path = %cli.state.display(),
        "cycle complete"
    );

    escalate_if_degraded(&next.health, cli.escalation_threshold, notifier).await;
    Ok(())
}
