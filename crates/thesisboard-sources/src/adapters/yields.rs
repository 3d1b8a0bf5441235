use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thesisboard_core::YieldRecord;
use tracing::debug;

use crate::{FetchError, HttpFetcher, SourceAdapter, Sourced, SourcesConfig};

/// FRED constant-maturity series, in the order they are requested.
const SERIES: [&str; 3] = ["DGS2", "DGS10", "DGS30"];

/// Observations requested per series. FRED marks holidays with ".", so a few
/// rows are needed to find the latest real value.
const LOOKBACK: usize = 10;

/// FRED regularly takes longer than other providers to answer.
const FRED_MIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Treasury yields from FRED.
///
/// All series share one rate-limited API key, so they are fetched one after
/// another with a fixed pause rather than concurrently.
pub struct YieldsAdapter {
    http: HttpFetcher,
    url: String,
    api_key: Option<String>,
    delay: Duration,
}

impl YieldsAdapter {
    pub fn new(http: HttpFetcher, cfg: &SourcesConfig) -> Self {
        let policy = http.policy();
        let timeout = policy.timeout.max(FRED_MIN_TIMEOUT);
        Self {
            http: http.with_policy(policy.with_timeout(timeout)),
            url: cfg.fred_url.clone(),
            api_key: cfg.fred_api_key.clone(),
            delay: cfg.fred_delay,
        }
    }

    async fn latest(&self, api_key: &str, series: &str) -> Result<(f64, String), FetchError> {
        let url = format!(
            "{}?series_id={series}&api_key={api_key}&file_type=json&sort_order=desc&limit={LOOKBACK}",
            self.url
        );
        let body: FredResponse = self.http.get_json(&url).await?;
        latest_observation(body, series)
    }
}

#[async_trait]
impl SourceAdapter for YieldsAdapter {
    type Record = YieldRecord;

    fn name(&self) -> &'static str {
        "yields"
    }

    async fn try_fetch(&self) -> Result<Sourced<YieldRecord>, FetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(FetchError::NotConfigured("FRED_API_KEY"))?;

        let mut values = Vec::with_capacity(SERIES.len());
        for (i, series) in SERIES.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.delay).await;
            }
            let (value, date) = self.latest(api_key, series).await?;
            debug!(series, value, date = %date, "yield observation");
            values.push((value, date));
        }

        let observed_on = values.iter().map(|(_, d)| d.clone()).max();
        Ok(Sourced::new(
            YieldRecord {
                us_2y: Some(values[0].0),
                us_10y: Some(values[1].0),
                us_30y: Some(values[2].0),
                observed_on,
            },
            "fred",
        ))
    }
}

#[derive(Deserialize)]
struct FredResponse {
    observations: Vec<FredObservation>,
}

#[derive(Deserialize)]
struct FredObservation {
    date: String,
    value: String,
}

/// Newest observation with a numeric value. Observations arrive newest first.
fn latest_observation(body: FredResponse, series: &str) -> Result<(f64, String), FetchError> {
    body.observations
        .into_iter()
        .find_map(|obs| {
            obs.value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| (v, obs.date))
        })
        .ok_or_else(|| FetchError::shape(format!("{series}: no numeric observation")))
}
