//! The persisted state document and its per-owner sections.
//!
//! Every top-level section has exactly one writer:
//!
//! - live metric slots (`price`, `sentiment`, ...) belong to their source adapter
//! - `manual` belongs to the operator
//! - `editorial` belongs to the approval step
//! - `derived` and `health` are rebuilt by reconciliation every cycle
//!
//! Unknown top-level keys are kept in [`StateBlob::extra`] so a retired
//! adapter's last values survive until someone removes them by hand.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::amount::Drops;
use crate::health::{HealthLedger, HealthStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateBlob {
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub price: LiveMetric<PriceRecord>,
    #[serde(default)]
    pub sentiment: LiveMetric<SentimentRecord>,
    #[serde(default)]
    pub fx: LiveMetric<FxRecord>,
    #[serde(default)]
    pub yields: LiveMetric<YieldRecord>,
    #[serde(default)]
    pub flows: LiveMetric<FlowRecord>,
    #[serde(default)]
    pub ledger: LiveMetric<LedgerRecord>,
    #[serde(default)]
    pub news: LiveMetric<NewsRecord>,
    #[serde(default)]
    pub manual: ManualFields,
    #[serde(default)]
    pub editorial: EditorialFields,
    #[serde(default)]
    pub derived: DerivedFields,
    #[serde(default)]
    pub health: HealthLedger,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl StateBlob {
    /// Build a state from a parsed document one section at a time.
    ///
    /// A section that does not fit the schema becomes its default, and an
    /// editorial entry that does not fit is dropped. Each such problem is
    /// returned so the caller can log it; the rest of the document loads
    /// normally. Only a document that is not a JSON object is an error.
    pub fn from_value_lenient(value: Value) -> Result<(Self, Vec<String>), serde_json::Error> {
        let Value::Object(mut map) = value else {
            return Err(serde::de::Error::custom("state document is not a JSON object"));
        };
        let mut problems = Vec::new();
        let p = &mut problems;
        let editorial = match map.remove("editorial") {
            Some(raw) => EditorialFields::from_value_lenient(raw, p),
            None => EditorialFields::default(),
        };
        let state = StateBlob {
            updated: take(&mut map, "", "updated", p),
            price: take(&mut map, "", "price", p),
            sentiment: take(&mut map, "", "sentiment", p),
            fx: take(&mut map, "", "fx", p),
            yields: take(&mut map, "", "yields", p),
            flows: take(&mut map, "", "flows", p),
            ledger: take(&mut map, "", "ledger", p),
            news: take(&mut map, "", "news", p),
            manual: take(&mut map, "", "manual", p),
            editorial,
            derived: take(&mut map, "", "derived", p),
            health: take(&mut map, "", "health", p),
            extra: map.into_iter().collect(),
        };
        Ok((state, problems))
    }
}

/// Remove `key` from `map` and parse it, falling back to the default.
fn take<T: DeserializeOwned + Default>(
    map: &mut Map<String, Value>,
    path: &str,
    key: &str,
    problems: &mut Vec<String>,
) -> T {
    let Some(raw) = map.remove(key).filter(|v| !v.is_null()) else {
        return T::default();
    };
    serde_json::from_value(raw).unwrap_or_else(|e| {
        problems.push(format!("{path}{key}: {e}"));
        T::default()
    })
}

/// One source's values plus provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveMetric<T> {
    #[serde(flatten)]
    pub value: T,
    /// Which endpoint in the adapter chain produced `value`.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub last_fetched: Option<DateTime<Utc>>,
    #[serde(default)]
    pub health: HealthStatus,
}

impl<T: Clone> LiveMetric<T> {
    /// The previous record's values, relabelled with this cycle's outcome.
    pub fn carried_forward(previous: &LiveMetric<T>, health: HealthStatus) -> Self {
        Self {
            value: previous.value.clone(),
            source: previous.source.clone(),
            last_fetched: previous.last_fetched,
            health,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceRecord {
    pub usd: Option<f64>,
    pub change_24h_pct: Option<f64>,
    pub market_cap_usd: Option<f64>,
    pub volume_24h_usd: Option<f64>,
}

/// Fear & greed style index, 0 (extreme fear) to 100 (extreme greed).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentRecord {
    pub value: Option<u8>,
    pub classification: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxRecord {
    pub usd_jpy: Option<f64>,
    pub eur_usd: Option<f64>,
}

/// Treasury constant-maturity yields, in percent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldRecord {
    pub us_2y: Option<f64>,
    pub us_10y: Option<f64>,
    pub us_30y: Option<f64>,
    pub observed_on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDay {
    pub date: String,
    pub net_flow_usd: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowRecord {
    /// Newest first.
    pub days: Vec<FlowDay>,
    /// Latest daily payment-corridor volume, USD.
    pub currency_volume_usd: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerRecord {
    pub total_coins_drops: Option<Drops>,
    /// Sum of the balances of the tracked accounts.
    pub tracked_balance_drops: Option<Drops>,
    pub ledger_index: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsRecord {
    pub headlines: Vec<Headline>,
}

// ── Operator-owned ──

/// Operator-entered values. Free-form keys; only absent keys are ever filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManualFields(pub BTreeMap<String, Value>);

impl ManualFields {
    /// Documented defaults for keys the dashboard reads.
    pub fn defaults() -> [(&'static str, Value); 3] {
        [
            ("volume_target_usd", json!(1_000_000_000)),
            ("volume_achieved_usd", json!(0)),
            ("notes", json!("")),
        ]
    }

    /// Fill absent keys from [`defaults`](Self::defaults). Present keys,
    /// including explicit nulls, are left alone.
    pub fn with_defaults(mut self) -> Self {
        for (key, value) in Self::defaults() {
            self.0.entry(key.to_string()).or_insert(value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }
}

// ── Approval-owned ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    Confirmed,
    OnTrack,
    Pending,
    AtRisk,
    Failed,
}

impl ScoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::OnTrack => "on_track",
            Self::Pending => "pending",
            Self::AtRisk => "at_risk",
            Self::Failed => "failed",
        }
    }
}

/// Scenario weights in percent. Expected to sum to roughly 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub bull: f64,
    pub base: f64,
    pub bear: f64,
    pub tail: f64,
}

impl Probabilities {
    pub fn total(&self) -> f64 {
        self.bull + self.base + self.bear + self.tail
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorialFields {
    #[serde(default)]
    pub scorecard: BTreeMap<String, ScoreStatus>,
    #[serde(default)]
    pub probabilities: Option<Probabilities>,
    #[serde(default)]
    pub thesis_score: Option<f64>,
    #[serde(default)]
    pub overall_status: Option<ScoreStatus>,
    /// Element id → text last written into the static page.
    #[serde(default)]
    pub narrative: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl EditorialFields {
    fn from_value_lenient(value: Value, problems: &mut Vec<String>) -> Self {
        let Value::Object(mut map) = value else {
            if !value.is_null() {
                problems.push("editorial: not an object".into());
            }
            return Self::default();
        };
        let scorecard = entries(&mut map, "scorecard", problems);
        let narrative = entries(&mut map, "narrative", problems);
        Self {
            scorecard,
            probabilities: take(&mut map, "editorial.", "probabilities", problems),
            thesis_score: take(&mut map, "editorial.", "thesis_score", problems),
            overall_status: take(&mut map, "editorial.", "overall_status", problems),
            narrative,
            extra: map.into_iter().collect(),
        }
    }
}

/// Parse an editorial map entry by entry, dropping the entries that do not fit.
fn entries<T: DeserializeOwned>(
    map: &mut Map<String, Value>,
    key: &str,
    problems: &mut Vec<String>,
) -> BTreeMap<String, T> {
    match map.remove(key) {
        Some(Value::Object(raw)) => raw
            .into_iter()
            .filter_map(|(name, v)| match serde_json::from_value(v) {
                Ok(parsed) => Some((name, parsed)),
                Err(e) => {
                    problems.push(format!("editorial.{key}.{name}: {e}"));
                    None
                }
            })
            .collect(),
        None | Some(Value::Null) => BTreeMap::new(),
        Some(_) => {
            problems.push(format!("editorial.{key}: not an object"));
            BTreeMap::new()
        }
    }
}

// ── Recomputed every cycle ──

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivedFields {
    pub flow_sum_7d_usd: Option<f64>,
    pub flow_sum_30d_usd: Option<f64>,
    pub flow_sum_7d_native: Option<f64>,
    pub currency_volume_native: Option<f64>,
    pub burned_drops: Option<Drops>,
    pub burned_native: Option<f64>,
    pub tracked_pct_of_supply: Option<f64>,
    pub volume_progress_pct: Option<f64>,
    pub yield_spread_10y_2y: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_loads_with_defaults() {
        let state: StateBlob = serde_json::from_str("{}").unwrap();
        assert_eq!(state, StateBlob::default());
        assert_eq!(state.price.health, HealthStatus::Skip);
    }

    #[test]
    fn live_metric_flattens_values() {
        let json = r#"{
            "price": {
                "usd": 2.41,
                "change_24h_pct": -1.2,
                "source": "coingecko",
                "last_fetched": "2026-10-17T06:00:00Z",
                "health": "ok"
            }
        }"#;
        let state: StateBlob = serde_json::from_str(json).unwrap();
        assert_eq!(state.price.value.usd, Some(2.41));
        assert_eq!(state.price.value.market_cap_usd, None);
        assert_eq!(state.price.source.as_deref(), Some("coingecko"));
        assert_eq!(state.price.health, HealthStatus::Ok);

        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["price"]["usd"], 2.41);
        assert_eq!(back["price"]["source"], "coingecko");
    }

    #[test]
    fn unknown_top_level_keys_round_trip() {
        let json = r#"{"retired_feed": {"value": 7}, "schema_note": "v2"}"#;
        let state: StateBlob = serde_json::from_str(json).unwrap();
        assert_eq!(state.extra.len(), 2);
        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["retired_feed"]["value"], 7);
        assert_eq!(back["schema_note"], "v2");
    }

    #[test]
    fn manual_defaults_only_fill_absent_keys() {
        let mut manual = ManualFields::default();
        manual.0.insert("volume_target_usd".into(), json!(250));
        manual.0.insert("notes".into(), Value::Null);
        let manual = manual.with_defaults();
        assert_eq!(manual.get_f64("volume_target_usd"), Some(250.0));
        assert_eq!(manual.get("notes"), Some(&Value::Null));
        assert_eq!(manual.get_f64("volume_achieved_usd"), Some(0.0));
    }

    #[test]
    fn lenient_load_keeps_what_fits() {
        let doc = json!({
            "price": {"usd": 2.41, "source": "coingecko"},
            "fx": {"usd_jpy": "not a number"},
            "manual": {"targetA": 500},
            "editorial": {
                "scorecard": {"etf": "watch", "custody": "on_track"},
                "probabilities": {"bull": 30, "base": 50, "bear": 20},
                "thesis_score": 61,
                "legacy_flag": true
            },
            "retired_feed": {"value": 7}
        });
        let (state, problems) = StateBlob::from_value_lenient(doc).unwrap();

        assert_eq!(state.price.value.usd, Some(2.41));
        assert_eq!(state.fx, LiveMetric::default());
        assert_eq!(state.manual.get("targetA"), Some(&json!(500)));
        assert_eq!(state.editorial.scorecard.len(), 1);
        assert_eq!(state.editorial.scorecard["custody"], ScoreStatus::OnTrack);
        assert_eq!(state.editorial.probabilities, None);
        assert_eq!(state.editorial.thesis_score, Some(61.0));
        assert_eq!(state.editorial.extra["legacy_flag"], json!(true));
        assert_eq!(state.extra["retired_feed"]["value"], 7);

        assert_eq!(problems.len(), 3, "{problems:?}");
        assert!(problems.iter().any(|p| p.starts_with("fx:")));
        assert!(problems.iter().any(|p| p.starts_with("editorial.scorecard.etf:")));
        assert!(problems.iter().any(|p| p.starts_with("editorial.probabilities:")));
    }

    #[test]
    fn lenient_load_matches_strict_on_valid_documents() {
        let doc = json!({
            "updated": "2026-10-17T06:00:00Z",
            "price": {"usd": 2.41, "health": "ok"},
            "ledger": {"total_coins_drops": "99985687626634189"},
            "editorial": {"scorecard": {"etf": "on_track"}, "narrative": {"summary": "Holding."}},
            "schema_note": "v2"
        });
        let strict: StateBlob = serde_json::from_value(doc.clone()).unwrap();
        let (lenient, problems) = StateBlob::from_value_lenient(doc).unwrap();
        assert!(problems.is_empty(), "{problems:?}");
        assert_eq!(lenient, strict);
    }

    #[test]
    fn lenient_load_rejects_non_objects() {
        assert!(StateBlob::from_value_lenient(json!([1, 2])).is_err());
    }

    #[test]
    fn editorial_keeps_unknown_keys() {
        let json = r#"{"scorecard": {"etf": "on_track"}, "legacy_flag": true}"#;
        let editorial: EditorialFields = serde_json::from_str(json).unwrap();
        assert_eq!(editorial.scorecard["etf"], ScoreStatus::OnTrack);
        assert_eq!(editorial.extra["legacy_flag"], json!(true));
    }
}
