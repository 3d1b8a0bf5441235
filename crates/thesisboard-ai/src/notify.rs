//! Operator notifications.
//!
//! Every notification is best-effort: a failed send is logged and the
//! pipeline carries on. [`notify_best_effort`] is the only entry point the
//! binaries use.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thesisboard_core::HealthLedger;
use thesisboard_core::health::{failed_sources, needs_escalation};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Crit,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Crit => "CRIT",
        }
    }
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
}

// Request URLs carry credentials (query keys, bot tokens). Strip them
// before the error is displayed or stored.
impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, level: Level, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Sends through the Telegram Bot API with HTML formatting.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

impl TelegramNotifier {
    pub fn new(
        api_url: &str,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }
}

/// `<b>[LEVEL] title</b>` followed by the body, both escaped.
fn format_message(level: Level, title: &str, body: &str) -> String {
    let head = format!("<b>[{}] {}</b>", level.as_str(), escape_html(title));
    if body.is_empty() {
        head
    } else {
        format!("{head}\n{}", escape_html(body))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, level: Level, title: &str, body: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);
        let text = format_message(level, title, body);
        let resp = self
            .client
            .post(&url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text: &text,
                parse_mode: "HTML",
                disable_web_page_preview: true,
            })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Used when no channel is configured. Writes the notification to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, level: Level, title: &str, body: &str) -> Result<(), NotifyError> {
        match level {
            Level::Info => info!(level = level.as_str(), %title, %body, "notification"),
            Level::Warn => warn!(level = level.as_str(), %title, %body, "notification"),
            Level::Crit => error!(level = level.as_str(), %title, %body, "notification"),
        }
        Ok(())
    }
}

/// Send, logging instead of propagating failure. Returns whether it was delivered.
pub async fn notify_best_effort(
    notifier: &dyn Notifier,
    level: Level,
    title: &str,
    body: &str,
) -> bool {
    match notifier.notify(level, title, body).await {
        Ok(()) => true,
        Err(e) => {
            warn!(level = level.as_str(), %title, error = %e, "notification not delivered");
            false
        }
    }
}

/// Send one WARN notification when `threshold` or more sources failed this
/// cycle. Returns whether the threshold was reached.
pub async fn escalate_if_degraded(
    ledger: &HealthLedger,
    threshold: usize,
    notifier: &dyn Notifier,
) -> bool {
    if !needs_escalation(ledger, threshold) {
        return false;
    }
    let failed = failed_sources(ledger);
    let body = failed
        .iter()
        .map(|name| {
            let reason = ledger
                .get(*name)
                .and_then(|e| e.error.as_deref())
                .unwrap_or("unknown error");
            format!("{name}: {reason}")
        })
        .collect::<Vec<_>>()
        .join("\n");
    let title = format!("{} of {} sources failing", failed.len(), ledger.len());
    notify_best_effort(notifier, Level::Warn, &title, &body).await;
    true
}

/// Escape the three characters Telegram's HTML mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use thesisboard_core::HealthEntry;

    use super::*;

    #[derive(Default)]
    struct Recording(Mutex<Vec<(Level, String, String)>>);

    #[async_trait]
    impl Notifier for Recording {
        async fn notify(&self, level: Level, title: &str, body: &str) -> Result<(), NotifyError> {
            self.0
                .lock()
                .unwrap()
                .push((level, title.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn ledger(failures: usize) -> HealthLedger {
        let at = Utc::now();
        let mut ledger = HealthLedger::new();
        for name in ["flows", "fx", "ledger", "news", "price", "sentiment", "yields"]
            .iter()
            .take(failures)
        {
            ledger.insert(name.to_string(), HealthEntry::fail(at, "timed out"));
        }
        ledger.insert("zz_ok".into(), HealthEntry::ok(at));
        ledger.insert("zz_skip".into(), HealthEntry::skip(at, "no key"));
        ledger
    }

    #[tokio::test]
    async fn three_failures_send_exactly_one_warning() {
        let rec = Recording::default();
        assert!(escalate_if_degraded(&ledger(3), 3, &rec).await);

        let sent = rec.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (level, title, body) = &sent[0];
        assert_eq!(*level, Level::Warn);
        assert_eq!(title, "3 of 5 sources failing");
        assert_eq!(body.lines().count(), 3);
        assert!(body.contains("fx: timed out"));
    }

    #[tokio::test]
    async fn below_threshold_is_silent() {
        let rec = Recording::default();
        assert!(!escalate_if_degraded(&ledger(2), 3, &rec).await);
        assert!(rec.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_threshold_disables_escalation() {
        let rec = Recording::default();
        assert!(!escalate_if_degraded(&ledger(7), 0, &rec).await);
        assert!(rec.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_channel_is_not_fatal() {
        let notifier = TelegramNotifier::new("http://127.0.0.1:9", "token", "42").unwrap();
        assert!(!notify_best_effort(&notifier, Level::Warn, "t", "b").await);
    }

    #[tokio::test]
    async fn delivery_error_hides_bot_token() {
        let notifier =
            TelegramNotifier::new("http://127.0.0.1:9", "123456:SECRETBOTTOKEN", "42").unwrap();
        let err = notifier.notify(Level::Warn, "t", "b").await.unwrap_err();
        assert!(matches!(err, NotifyError::Http(_)));
        assert!(!err.to_string().contains("SECRETBOTTOKEN"), "{err}");
    }

    #[tokio::test]
    async fn log_notifier_always_delivers() {
        assert!(notify_best_effort(&LogNotifier, Level::Info, "t", "b").await);
    }

    #[test]
    fn message_is_escaped() {
        assert_eq!(
            format_message(Level::Warn, "a < b", "x & y"),
            "<b>[WARN] a &lt; b</b>\nx &amp; y"
        );
        assert_eq!(format_message(Level::Info, "t", ""), "<b>[INFO] t</b>");
    }
}
