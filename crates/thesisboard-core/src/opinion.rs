//! Opinion document: the narrative generator's proposal, staged for approval.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{Probabilities, ScoreStatus};

#[derive(Error, Debug)]
pub enum OpinionError {
    #[error("response contains no JSON object")]
    NoJson,
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("thesis_score {0} outside 0..=100")]
    ScoreRange(f64),
    #[error("probability {name} = {value} outside 0..=100")]
    ProbabilityRange { name: &'static str, value: f64 },
    #[error("probabilities sum to {0}, expected roughly 100")]
    ProbabilitySum(f64),
    #[error("timeline event has an empty title")]
    EmptyTitle,
}

/// Accepted band for the probability total. Model output is rounded, so an
/// exact 100 is not required.
const PROBABILITY_SUM_RANGE: std::ops::RangeInclusive<f64> = 90.0..=110.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpinionDocument {
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub overall_status: Option<ScoreStatus>,
    #[serde(default)]
    pub thesis_score: Option<f64>,
    #[serde(default)]
    pub probabilities: Option<Probabilities>,
    #[serde(default)]
    pub scorecard: Vec<ScorecardDelta>,
    /// Narrative section name (`summary`, `market_context`, `outlook`, ...) → text.
    #[serde(default)]
    pub narrative: BTreeMap<String, String>,
    #[serde(default)]
    pub timeline_events: Vec<TimelineDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardDelta {
    pub category: String,
    #[serde(default)]
    pub previous_status: Option<ScoreStatus>,
    pub recommended_status: ScoreStatus,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDraft {
    pub date: String,
    pub category: String,
    pub severity: Severity,
    pub title: String,
    #[serde(default)]
    pub expanded: String,
}

impl OpinionDocument {
    /// Parse a model response. Prose or code fences around the JSON object
    /// are tolerated; the outermost `{...}` is what gets parsed.
    pub fn parse_response(text: &str) -> Result<Self, OpinionError> {
        let start = text.find('{').ok_or(OpinionError::NoJson)?;
        let end = text.rfind('}').ok_or(OpinionError::NoJson)?;
        if end < start {
            return Err(OpinionError::NoJson);
        }
        let doc: OpinionDocument = serde_json::from_str(&text[start..=end])?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn validate(&self) -> Result<(), OpinionError> {
        if let Some(score) = self.thesis_score
            && !(0.0..=100.0).contains(&score)
        {
            return Err(OpinionError::ScoreRange(score));
        }

        if let Some(p) = &self.probabilities {
            for (name, value) in [
                ("bull", p.bull),
                ("base", p.base),
                ("bear", p.bear),
                ("tail", p.tail),
            ] {
                if !(0.0..=100.0).contains(&value) {
                    return Err(OpinionError::ProbabilityRange { name, value });
                }
            }
            let total = p.total();
            if !PROBABILITY_SUM_RANGE.contains(&total) {
                return Err(OpinionError::ProbabilitySum(total));
            }
        }

        if self.timeline_events.iter().any(|e| e.title.trim().is_empty()) {
            return Err(OpinionError::EmptyTitle);
        }
        Ok(())
    }
}
