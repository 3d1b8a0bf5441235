use async_trait::async_trait;
use serde::Deserialize;
use thesisboard_core::{FlowDay, FlowRecord};

use crate::{FetchError, HttpFetcher, SourceAdapter, Sourced, SourcesConfig};

/// Daily fund flows and payment-corridor volume from a configured JSON feed.
///
/// The feed returns
/// `{"flows": [{"date": "YYYY-MM-DD", "net_flow_usd": n}, ...], "corridor_volume_usd": n}`
/// in any order; days are stored newest first.
pub struct FlowsAdapter {
    http: HttpFetcher,
    url: Option<String>,
}

impl FlowsAdapter {
    pub fn new(http: HttpFetcher, cfg: &SourcesConfig) -> Self {
        Self {
            http,
            url: cfg.flows_url.clone(),
        }
    }
}

#[async_trait]
impl SourceAdapter for FlowsAdapter {
    type Record = FlowRecord;

    fn name(&self) -> &'static str {
        "flows"
    }

    async fn try_fetch(&self) -> Result<Sourced<FlowRecord>, FetchError> {
        let url = self
            .url
            .as_deref()
            .ok_or(FetchError::NotConfigured("FLOWS_URL"))?;
        let body: FlowFeed = self.http.get_json(url).await?;
        Ok(Sourced::new(parse_feed(body)?, "flows-feed"))
    }
}

#[derive(Deserialize)]
struct FlowFeed {
    flows: Vec<FlowDay>,
    #[serde(default)]
    corridor_volume_usd: Option<f64>,
}

fn parse_feed(body: FlowFeed) -> Result<FlowRecord, FetchError> {
    if body.flows.is_empty() {
        return Err(FetchError::shape("flow feed has no days"));
    }
    if let Some(bad) = body.flows.iter().find(|d| !d.net_flow_usd.is_finite()) {
        return Err(FetchError::shape(format!("non-finite flow on {}", bad.date)));
    }
    let mut days = body.flows;
    // ISO dates sort lexicographically.
    days.sort_by(|a, b| b.date.cmp(&a.date));
    days.dedup_by(|a, b| a.date == b.date);
    Ok(FlowRecord {
        days,
        currency_volume_usd: body.corridor_volume_usd.filter(|v| v.is_finite()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_newest_first_and_dedupes() {
        let body = serde_json::from_str(
            r#"{"flows": [
                {"date": "2026-10-14", "net_flow_usd": 5.0},
                {"date": "2026-10-16", "net_flow_usd": -3.5},
                {"date": "2026-10-15", "net_flow_usd": 12.0},
                {"date": "2026-10-16", "net_flow_usd": 99.0}
            ], "corridor_volume_usd": 1.5e7}"#,
        )
        .unwrap();
        let rec = parse_feed(body).unwrap();
        let dates: Vec<&str> = rec.days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, ["2026-10-16", "2026-10-15", "2026-10-14"]);
        assert_eq!(rec.currency_volume_usd, Some(1.5e7));
    }

    #[test]
    fn empty_feed_is_shape_error() {
        let body = serde_json::from_str(r#"{"flows": []}"#).unwrap();
        assert!(matches!(parse_feed(body), Err(FetchError::Shape(_))));
    }
}
