//! Per-source health ledger, rebuilt from scratch every fetch cycle.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of failed sources in one cycle that warrants an operator alert.
pub const DEFAULT_ESCALATION_THRESHOLD: usize = 3;

/// Outcome of one source fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Fail,
    /// Not attempted, usually because a credential is not configured.
    #[default]
    Skip,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Fail => "fail",
            Self::Skip => "skip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthEntry {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthEntry {
    pub fn ok(at: DateTime<Utc>) -> Self {
        Self {
            status: HealthStatus::Ok,
            timestamp: at,
            error: None,
        }
    }

    pub fn fail(at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Fail,
            timestamp: at,
            error: Some(error.into()),
        }
    }

    pub fn skip(at: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Skip,
            timestamp: at,
            error: Some(reason.into()),
        }
    }
}

/// Source name → health of its most recent fetch.
pub type HealthLedger = BTreeMap<String, HealthEntry>;

/// Names of the sources whose last fetch failed, in name order.
pub fn failed_sources(ledger: &HealthLedger) -> Vec<&str> {
    ledger
        .iter()
        .filter(|(_, entry)| entry.status == HealthStatus::Fail)
        .map(|(name, _)| name.as_str())
        .collect()
}

/// Whether the cycle's failures reach the alerting threshold.
///
/// Skipped sources are not failures.
pub fn needs_escalation(ledger: &HealthLedger, threshold: usize) -> bool {
    threshold > 0 && failed_sources(ledger).len() >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(entries: &[(&str, HealthStatus)]) -> HealthLedger {
        let at = Utc::now();
        entries
            .iter()
            .map(|(name, status)| {
                let entry = match status {
                    HealthStatus::Ok => HealthEntry::ok(at),
                    HealthStatus::Fail => HealthEntry::fail(at, "timeout"),
                    HealthStatus::Skip => HealthEntry::skip(at, "no api key"),
                };
                (name.to_string(), entry)
            })
            .collect()
    }

    #[test]
    fn three_failures_escalate() {
        let l = ledger(&[
            ("price", HealthStatus::Ok),
            ("fx", HealthStatus::Fail),
            ("news", HealthStatus::Fail),
            ("yields", HealthStatus::Fail),
        ]);
        assert_eq!(failed_sources(&l), vec!["fx", "news", "yields"]);
        assert!(needs_escalation(&l, DEFAULT_ESCALATION_THRESHOLD));
    }

    #[test]
    fn skips_do_not_count_as_failures() {
        let l = ledger(&[
            ("fx", HealthStatus::Fail),
            ("news", HealthStatus::Skip),
            ("yields", HealthStatus::Skip),
            ("flows", HealthStatus::Fail),
        ]);
        assert!(!needs_escalation(&l, 3));
    }

    #[test]
    fn zero_threshold_disables_escalation() {
        let l = ledger(&[("fx", HealthStatus::Fail)]);
        assert!(!needs_escalation(&l, 0));
    }

    #[test]
    fn status_serializes_lowercase() {
        let entry = HealthEntry::fail(Utc::now(), "HTTP 503");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "fail");
        assert_eq!(json["error"], "HTTP 503");

        let ok = serde_json::to_value(HealthEntry::ok(Utc::now())).unwrap();
        assert!(ok.get("error").is_none());
    }
}
