//! Outbound text services: the narrative generator and the operator notification channel.

pub mod narrative;
pub mod notify;

pub use narrative::{
    MessagesClient, NarrativeConfig, NarrativeError, SYSTEM_PROMPT, TextGenerator,
    build_user_prompt, generate_opinion,
};
pub use notify::{
    Level, LogNotifier, NotifyError, Notifier, TelegramNotifier, escalate_if_degraded,
    escape_html, notify_best_effort,
};
