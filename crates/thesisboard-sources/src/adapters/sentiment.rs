use async_trait::async_trait;
use serde::Deserialize;
use thesisboard_core::SentimentRecord;

use super::parse_num;
use crate::{FetchError, HttpFetcher, SourceAdapter, Sourced, SourcesConfig};

/// Fear & greed index from alternative.me.
pub struct SentimentAdapter {
    http: HttpFetcher,
    url: String,
}

impl SentimentAdapter {
    pub fn new(http: HttpFetcher, cfg: &SourcesConfig) -> Self {
        Self {
            http,
            url: cfg.sentiment_url.clone(),
        }
    }
}

#[async_trait]
impl SourceAdapter for SentimentAdapter {
    type Record = SentimentRecord;

    fn name(&self) -> &'static str {
        "sentiment"
    }

    async fn try_fetch(&self) -> Result<Sourced<SentimentRecord>, FetchError> {
        let url = format!("{}?limit=1", self.url);
        let body: FearGreedResponse = self.http.get_json(&url).await?;
        Ok(Sourced::new(parse_fear_greed(body)?, "alternative.me"))
    }
}

#[derive(Deserialize)]
struct FearGreedResponse {
    data: Vec<FearGreedPoint>,
}

#[derive(Deserialize)]
struct FearGreedPoint {
    value: String,
    value_classification: String,
}

fn parse_fear_greed(body: FearGreedResponse) -> Result<SentimentRecord, FetchError> {
    let point = body
        .data
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::shape("empty data array"))?;
    let value = parse_num(&point.value, "value")?;
    if !(0.0..=100.0).contains(&value) {
        return Err(FetchError::shape(format!("index {value} outside 0..=100")));
    }
    Ok(SentimentRecord {
        value: Some(value.round() as u8),
        classification: Some(point.value_classification),
    })
}
