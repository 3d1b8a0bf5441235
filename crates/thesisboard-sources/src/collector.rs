//! Fan-out over all adapters for one fetch cycle.

use thesisboard_core::{FreshRecords, StateBlob};
use tracing::info;

use crate::adapters::{
    FlowsAdapter, FxAdapter, LedgerAdapter, NewsAdapter, PriceAdapter, SentimentAdapter,
    YieldsAdapter,
};
use crate::{HttpFetcher, SourcesConfig, fetch_with_fallback};

/// The full adapter set, sharing one HTTP client.
pub struct Adapters {
    pub price: PriceAdapter,
    pub sentiment: SentimentAdapter,
    pub fx: FxAdapter,
    pub yields: YieldsAdapter,
    pub flows: FlowsAdapter,
    pub ledger: LedgerAdapter,
    pub news: NewsAdapter,
}

impl Adapters {
    pub fn new(http: HttpFetcher, cfg: &SourcesConfig) -> Self {
        Self {
            price: PriceAdapter::new(http.clone(), cfg),
            sentiment: SentimentAdapter::new(http.clone(), cfg),
            fx: FxAdapter::new(http.clone(), cfg),
            yields: YieldsAdapter::new(http.clone(), cfg),
            flows: FlowsAdapter::new(http.clone(), cfg),
            ledger: LedgerAdapter::new(http.clone(), cfg),
            news: NewsAdapter::new(http, cfg),
        }
    }
}

/// Run every adapter concurrently and wait for all of them to settle.
///
/// Each adapter reads only its own slot of `previous` and returns its own
/// health entry, so nothing is shared between the futures. A slow or failing
/// adapter delays the result but never affects another adapter's record.
pub async fn collect(adapters: &Adapters, previous: &StateBlob) -> FreshRecords {
    info!("fetch cycle started");
    let (price, sentiment, fx, yields, flows, ledger, news) = futures::join!(
        fetch_with_fallback(&adapters.price, &previous.price),
        fetch_with_fallback(&adapters.sentiment, &previous.sentiment),
        fetch_with_fallback(&adapters.fx, &previous.fx),
        fetch_with_fallback(&adapters.yields, &previous.yields),
        fetch_with_fallback(&adapters.flows, &previous.flows),
        fetch_with_fallback(&adapters.ledger, &previous.ledger),
        fetch_with_fallback(&adapters.news, &previous.news),
    );
    info!("all sources settled");

    FreshRecords {
        price: Some(price),
        sentiment: Some(sentiment),
        fx: Some(fx),
        yields: Some(yields),
        flows: Some(flows),
        ledger: Some(ledger),
        news: Some(news),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use thesisboard_core::{HealthStatus, reconcile};

    use super::*;
    use crate::RetryPolicy;

    #[tokio::test]
    async fn dead_upstreams_still_produce_a_full_cycle() {
        let dead = "http://127.0.0.1:9".to_string();
        let cfg = SourcesConfig {
            coingecko_url: dead.clone(),
            binance_url: dead.clone(),
            kraken_url: dead.clone(),
            sentiment_url: dead.clone(),
            fx_primary_url: dead.clone(),
            fx_secondary_url: dead.clone(),
            ledger_rpc_url: dead,
            ..SourcesConfig::default()
        };
        let http = HttpFetcher::new(RetryPolicy {
            timeout: Duration::from_secs(2),
            backoff: Duration::ZERO,
            retries: 0,
        })
        .unwrap();

        let mut previous = StateBlob::default();
        previous.price.value.usd = Some(2.0);

        let fresh = collect(&Adapters::new(http, &cfg), &previous).await;
        let next = reconcile(&previous, fresh, chrono::Utc::now());

        assert_eq!(next.health.len(), 7);
        assert_eq!(next.health["price"].status, HealthStatus::Fail);
        assert_eq!(next.health["yields"].status, HealthStatus::Skip);
        assert_eq!(next.health["news"].status, HealthStatus::Skip);
        assert_eq!(next.price.value.usd, Some(2.0));
    }
}
