use async_trait::async_trait;
use serde::Deserialize;
use thesisboard_core::{Headline, NewsRecord};

use crate::{FetchError, HttpFetcher, SourceAdapter, Sourced, SourcesConfig};

/// Recent headlines from CryptoPanic.
pub struct NewsAdapter {
    http: HttpFetcher,
    url: String,
    api_key: Option<String>,
    currency: String,
    limit: usize,
}

impl NewsAdapter {
    pub fn new(http: HttpFetcher, cfg: &SourcesConfig) -> Self {
        Self {
            http,
            url: cfg.news_url.clone(),
            api_key: cfg.news_api_key.clone(),
            currency: currency_code(&cfg.binance_symbol),
            limit: cfg.news_limit,
        }
    }
}

#[async_trait]
impl SourceAdapter for NewsAdapter {
    type Record = NewsRecord;

    fn name(&self) -> &'static str {
        "news"
    }

    async fn try_fetch(&self) -> Result<Sourced<NewsRecord>, FetchError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(FetchError::NotConfigured("NEWS_API_KEY"))?;
        let url = format!(
            "{}?auth_token={key}&currencies={}&public=true",
            self.url, self.currency
        );
        let body: PostsResponse = self.http.get_json(&url).await?;
        Ok(Sourced::new(parse_posts(body, self.limit), "cryptopanic"))
    }
}

/// Base asset of a trading symbol: `XRPUSDT` -> `XRP`.
fn currency_code(symbol: &str) -> String {
    symbol
        .strip_suffix("USDT")
        .or_else(|| symbol.strip_suffix("USD"))
        .unwrap_or(symbol)
        .to_string()
}

#[derive(Deserialize)]
struct PostsResponse {
    results: Vec<Post>,
}

#[derive(Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    source: Option<PostSource>,
}

#[derive(Deserialize)]
struct PostSource {
    title: String,
}

fn parse_posts(body: PostsResponse, limit: usize) -> NewsRecord {
    let headlines = body
        .results
        .into_iter()
        .filter(|p| !p.title.trim().is_empty())
        .take(limit)
        .map(|p| Headline {
            title: p.title.trim().to_string(),
            url: p.url,
            source: p.source.map(|s| s.title),
            published_at: p.published_at,
        })
        .collect();
    NewsRecord { headlines }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_from_symbol() {
        assert_eq!(currency_code("XRPUSDT"), "XRP");
        assert_eq!(currency_code("XRPUSD"), "XRP");
        assert_eq!(currency_code("XRP"), "XRP");
    }

    #[test]
    fn posts_trimmed_and_limited() {
        let body = serde_json::from_str(
            r#"{"results": [
                {"title": "  ETF inflows hit record ", "url": "https://x/1", "published_at": "2026-10-16T12:00:00Z", "source": {"title": "Wire"}},
                {"title": "   "},
                {"title": "Second"},
                {"title": "Third"}
            ]}"#,
        )
        .unwrap();
        let rec = parse_posts(body, 2);
        assert_eq!(rec.headlines.len(), 2);
        assert_eq!(rec.headlines[0].title, "ETF inflows hit record");
        assert_eq!(rec.headlines[0].source.as_deref(), Some("Wire"));
        assert_eq!(rec.headlines[1].title, "Second");
    }
}
