//! Plumbing shared by the `thesis-*` binaries: logging setup, the
//! notification channel, and the fatal-exit path.

use std::process::ExitCode;

use clap::Args;
use thesisboard_ai::{Level, LogNotifier, Notifier, TelegramNotifier, notify_best_effort};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Install the `fmt` subscriber. `RUST_LOG` overrides the default `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Operator notification channel. Without both Telegram settings,
/// notifications go to the log.
#[derive(Args, Debug, Clone)]
pub struct NotifyArgs {
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub telegram_api_url: String,
}

impl NotifyArgs {
    pub fn build(&self) -> Box<dyn Notifier> {
        let (Some(token), Some(chat)) = (&self.telegram_bot_token, &self.telegram_chat_id) else {
            return Box::new(LogNotifier);
        };
        match TelegramNotifier::new(&self.telegram_api_url, token.clone(), chat.clone()) {
            Ok(n) => Box::new(n),
            Err(e) => {
                warn!(error = %e, "telegram client unavailable, notifying through the log");
                Box::new(LogNotifier)
            }
        }
    }
}

/// Log the error chain, send a best-effort CRIT, and return exit status 1.
pub async fn fail(notifier: &dyn Notifier, command: &str, err: &anyhow::Error) -> ExitCode {
    error!(command, error = %format!("{err:#}"), "fatal");
    notify_best_effort(
        notifier,
        Level::Crit,
        &format!("{command} failed"),
        &format!("{err:#}"),
    )
    .await;
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        notify: NotifyArgs,
    }

    #[test]
    fn defaults_to_log_channel() {
        let cli = Cli::parse_from(["test"]);
        assert_eq!(cli.notify.telegram_api_url, "https://api.telegram.org");
        // Building never fails, with or without credentials.
        let _ = cli.notify.build();
    }

    #[tokio::test]
    async fn fatal_path_exits_one() {
        let err = anyhow::anyhow!("state file missing").context("loading state");
        let code = fail(&LogNotifier, "thesis-test", &err).await;
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::FAILURE));
    }
}
