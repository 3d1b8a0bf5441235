//! Pay for a batch of paywalled resources within fixed spending limits.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use thesisboard_ai::{Level, Notifier, notify_best_effort};
use thesisboard_core::Drops;
use thesisboard_pay::{
    AgentConfig, Guardrails, HttpPaywall, JsonRpcLedger, Outcome, PaymentAgent, Wallet,
};
use tracing::info;

use thesisboard_cli::{NotifyArgs, fail, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "thesis-pay", version, about = "x402 payment demo")]
struct Cli {
    /// Comma-separated resource URLs.
    #[arg(long, env = "PAY_RESOURCES", value_delimiter = ',')]
    resources: Vec<String>,

    #[arg(long, env = "PAY_LEDGER_RPC_URL", default_value = "https://s.altnet.rippletest.net:51234")]
    ledger_rpc_url: String,

    #[arg(long, env = "PAY_NETWORK", default_value = "testnet")]
    network: String,

    #[arg(long, env = "PAY_WALLET_ACCOUNT")]
    account: Option<String>,

    /// Hex Ed25519 seed for the wallet.
    #[arg(long, env = "PAY_WALLET_SEED", hide_env_values = true)]
    seed: Option<String>,

    #[arg(long, env = "PAY_FEE_DROPS", default_value_t = 12)]
    fee_drops: i64,

    #[arg(long, env = "PAY_BALANCE_FLOOR_DROPS", default_value_t = 20_000_000)]
    balance_floor_drops: i64,

    #[arg(long, env = "PAY_PER_TX_CAP_DROPS", default_value_t = 1_000_000)]
    per_tx_cap_drops: i64,

    #[arg(long, env = "PAY_SESSION_CAP_DROPS", default_value_t = 5_000_000)]
    session_cap_drops: i64,

    #[arg(long, env = "PAY_TIMEOUT_SECS", default_value_t = 30)]
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
        Err(e) => fail(notifier.as_ref(), "thesis-pay", &e).await,
    }
}

async fn run(cli: &Cli, notifier: &dyn Notifier) -> anyhow::Result<()> {
    if cli.resources.is_empty() {
        bail!("PAY_RESOURCES is empty");
    }
    let (Some(account), Some(seed)) = (&cli.account, &cli.seed) else {
        bail!("PAY_WALLET_ACCOUNT and PAY_WALLET_SEED are required");
    };
    let wallet = Wallet::from_seed_hex(account.clone(), seed).context("loading wallet")?;
    let timeout = Duration::from_secs(cli.timeout_secs);
    let transport = HttpPaywall::new(timeout).context("building paywall client")?;
    let ledger = JsonRpcLedger::new(cli.ledger_rpc_url.clone(), timeout)
        .context("building ledger client")?;

    let config = AgentConfig {
        network: cli.network.clone(),
        fee: Drops::new(i128::from(cli.fee_drops)),
        guardrails: Guardrails {
            balance_floor: Drops::new(i128::from(cli.balance_floor_drops)),
            per_tx_cap: Drops::new(i128::from(cli.per_tx_cap_drops)),
            session_cap: Drops::new(i128::from(cli.session_cap_drops)),
            ..Guardrails::default()
        },
    };
    info!(
        account = %wallet.account(),
        resources = cli.resources.len(),
        network = %config.network,
        "payment run started"
    );

    let mut agent = PaymentAgent::new(&transport, &ledger, &wallet, config);
    let outcomes = agent.run_batch(&cli.resources).await;

    let lines: Vec<String> = outcomes
        .iter()
        .map(|(url, outcome)| match outcome {
            Outcome::Free { .. } => format!("{url}: free"),
            Outcome::Settled { receipt, .. } => {
                format!("{url}: settled ({})", receipt.ledger_tx_hash)
            }
            Outcome::Rejected { reason } => format!("{url}: rejected ({reason})"),
        })
        .collect();
    info!(spent = %agent.session_spent(), "payment run finished");

    notify_best_effort(
        notifier,
        Level::Info,
        &format!("Payment run: {} spent", agent.session_spent()),
        &lines.join("\n"),
    )
    .await;
    Ok(())
}
