//! Concrete adapters, one per state slot.

mod flows;
mod fx;
mod ledger;
mod news;
mod price;
mod sentiment;
mod yields;

pub use flows::FlowsAdapter;
pub use fx::FxAdapter;
pub use ledger::LedgerAdapter;
pub use news::NewsAdapter;
pub use price::PriceAdapter;
pub use sentiment::SentimentAdapter;
pub use yields::YieldsAdapter;

use tracing::warn;

use crate::FetchError;

/// Parse a decimal number that an API ships as a string.
fn parse_num(raw: &str, field: &str) -> Result<f64, FetchError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FetchError::shape(format!("{field}: not a number: {raw:?}")))
}

/// Record one failed link of an adapter chain and move on.
fn chain_failure(errors: &mut Vec<String>, adapter: &str, link: &str, err: FetchError) {
    warn!(source = adapter, link, error = %err, "chain link failed, trying next");
    errors.push(format!("{link}: {err}"));
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use thesisboard_core::{
        FlowDay, FlowRecord, FxRecord, HealthStatus, LedgerRecord, LiveMetric, NewsRecord,
        PriceRecord, SentimentRecord, YieldRecord,
    };

    use super::*;
    use crate::{HttpFetcher, RetryPolicy, SourceAdapter, SourcesConfig, fetch_with_fallback};

    const DEAD: &str = "http://127.0.0.1:9";

    #[test]
    fn parse_num_rejects_non_numbers() {
        assert_eq!(parse_num(" 2.41 ", "price").unwrap(), 2.41);
        assert!(parse_num("", "price").is_err());
        assert!(parse_num("NaN", "price").is_err());
        assert!(parse_num("inf", "price").is_err());
    }

    fn dead_config() -> SourcesConfig {
        SourcesConfig {
            coingecko_url: DEAD.into(),
            binance_url: DEAD.into(),
            kraken_url: DEAD.into(),
            sentiment_url: DEAD.into(),
            fx_primary_url: DEAD.into(),
            fx_secondary_url: DEAD.into(),
            fred_url: DEAD.into(),
            fred_api_key: Some("test-key".into()),
            fred_delay: Duration::ZERO,
            flows_url: Some(DEAD.into()),
            ledger_rpc_url: DEAD.into(),
            tracked_accounts: vec!["rTrackedAccount".into()],
            news_url: DEAD.into(),
            news_api_key: Some("test-key".into()),
            ..SourcesConfig::default()
        }
    }

    fn http() -> HttpFetcher {
        HttpFetcher::new(RetryPolicy {
            timeout: Duration::from_secs(2),
            backoff: Duration::ZERO,
            retries: 1,
        })
        .unwrap()
    }

    fn prev<T>(value: T) -> LiveMetric<T> {
        LiveMetric {
            value,
            source: Some("previous".into()),
            last_fetched: Some("2026-10-16T06:00:00Z".parse().unwrap()),
            health: HealthStatus::Ok,
        }
    }

    async fn assert_falls_back<A: SourceAdapter>(adapter: A, previous: LiveMetric<A::Record>)
    where
        A::Record: PartialEq + std::fmt::Debug,
    {
        let got = fetch_with_fallback(&adapter, &previous).await;
        assert_eq!(got.health.status, HealthStatus::Fail, "{}", adapter.name());
        assert_eq!(got.record.value, previous.value, "{}", adapter.name());
        assert_eq!(got.record.source, previous.source, "{}", adapter.name());
    }

    #[tokio::test]
    async fn every_adapter_falls_back_when_upstream_is_down() {
        let cfg = dead_config();
        let http = http();

        assert_falls_back(
            PriceAdapter::new(http.clone(), &cfg),
            prev(PriceRecord {
                usd: Some(2.0),
                ..Default::default()
            }),
        )
        .await;
        assert_falls_back(
            SentimentAdapter::new(http.clone(), &cfg),
            prev(SentimentRecord {
                value: Some(55),
                classification: Some("Greed".into()),
            }),
        )
        .await;
        assert_falls_back(
            FxAdapter::new(http.clone(), &cfg),
            prev(FxRecord {
                usd_jpy: Some(150.0),
                eur_usd: Some(1.08),
            }),
        )
        .await;
        assert_falls_back(
            YieldsAdapter::new(http.clone(), &cfg),
            prev(YieldRecord {
                us_10y: Some(4.1),
                ..Default::default()
            }),
        )
        .await;
        assert_falls_back(
            FlowsAdapter::new(http.clone(), &cfg),
            prev(FlowRecord {
                days: vec![FlowDay {
                    date: "2026-10-15".into(),
                    net_flow_usd: 1.0,
                }],
                currency_volume_usd: Some(5.0),
            }),
        )
        .await;
        assert_falls_back(
            LedgerAdapter::new(http.clone(), &cfg),
            prev(LedgerRecord {
                total_coins_drops: Some("99985687626634189".parse().unwrap()),
                ..Default::default()
            }),
        )
        .await;
        assert_falls_back(NewsAdapter::new(http, &cfg), prev(NewsRecord::default())).await;
    }

    #[tokio::test]
    async fn credentialed_adapters_skip_without_keys() {
        let cfg = SourcesConfig {
            fred_api_key: None,
            news_api_key: None,
            flows_url: None,
            ..dead_config()
        };
        let http = http();

        let y = fetch_with_fallback(&YieldsAdapter::new(http.clone(), &cfg), &LiveMetric::default()).await;
        let n = fetch_with_fallback(&NewsAdapter::new(http.clone(), &cfg), &LiveMetric::default()).await;
        let f = fetch_with_fallback(&FlowsAdapter::new(http, &cfg), &LiveMetric::default()).await;
        assert_eq!(y.health.status, HealthStatus::Skip);
        assert_eq!(n.health.status, HealthStatus::Skip);
        assert_eq!(f.health.status, HealthStatus::Skip);
    }

    #[tokio::test]
    async fn failure_message_never_carries_credentials() {
        let cfg = SourcesConfig {
            fred_url: format!("{DEAD}/fred"),
            fred_api_key: Some("SECRETKEY123".into()),
            news_url: format!("{DEAD}/posts/"),
            news_api_key: Some("NEWSTOKEN456".into()),
            ..dead_config()
        };
        let http = http();

        let y = fetch_with_fallback(&YieldsAdapter::new(http.clone(), &cfg), &LiveMetric::default()).await;
        let n = fetch_with_fallback(&NewsAdapter::new(http, &cfg), &LiveMetric::default()).await;
        assert_eq!(y.health.status, HealthStatus::Fail);
        assert_eq!(n.health.status, HealthStatus::Fail);

        let stored = serde_json::to_string(&[&y.health, &n.health]).unwrap();
        assert!(stored.contains("HTTP request failed"), "{stored}");
        assert!(!stored.contains("SECRETKEY123"), "{stored}");
        assert!(!stored.contains("NEWSTOKEN456"), "{stored}");
        assert!(!stored.contains("127.0.0.1"), "{stored}");
    }
}
