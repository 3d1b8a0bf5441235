use std::time::Duration;

/// Endpoints, credentials, and pacing for every adapter.
///
/// Defaults point at the public providers; the CLI overrides them from the
/// environment. Optional credentials left as `None` make the adapter skip.
#[derive(Debug, Clone)]
pub struct SourcesConfig {
    pub coin_id: String,
    pub coingecko_url: String,
    pub binance_url: String,
    pub binance_symbol: String,
    pub kraken_url: String,
    pub kraken_pair: String,
    pub sentiment_url: String,
    pub fx_primary_url: String,
    pub fx_secondary_url: String,
    pub fred_url: String,
    pub fred_api_key: Option<String>,
    /// Pause between consecutive FRED requests.
    pub fred_delay: Duration,
    pub flows_url: Option<String>,
    pub ledger_rpc_url: String,
    pub tracked_accounts: Vec<String>,
    pub news_url: String,
    pub news_api_key: Option<String>,
    pub news_limit: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            coin_id: "ripple".into(),
            coingecko_url: "https://api.coingecko.com/api/v3".into(),
            binance_url: "https://api.binance.com".into(),
            binance_symbol: "XRPUSDT".into(),
            kraken_url: "https://api.kraken.com".into(),
            kraken_pair: "XRPUSD".into(),
            sentiment_url: "https://api.alternative.me/fng/".into(),
            fx_primary_url: "https://open.er-api.com/v6/latest/USD".into(),
            fx_secondary_url: "https://api.frankfurter.app/latest?from=USD&to=JPY,EUR".into(),
            fred_url: "https://api.stlouisfed.org/fred/series/observations".into(),
            fred_api_key: None,
            fred_delay: Duration::from_secs(1),
            flows_url: None,
            ledger_rpc_url: "https://xrplcluster.com".into(),
            tracked_accounts: Vec::new(),
            news_url: "https://cryptopanic.com/api/v1/posts/".into(),
            news_api_key: None,
            news_limit: 10,
        }
    }
}
