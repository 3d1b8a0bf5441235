//! Spot price: CoinGecko, then Binance, then Kraken.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use thesisboard_core::{PriceRecord, safe_div};

use super::{chain_failure, parse_num};
use crate::{FetchError, HttpFetcher, SourceAdapter, Sourced, SourcesConfig};

pub struct PriceAdapter {
    http: HttpFetcher,
    coin_id: String,
    coingecko_url: String,
    binance_url: String,
    binance_symbol: String,
    kraken_url: String,
    kraken_pair: String,
}

impl PriceAdapter {
    pub fn new(http: HttpFetcher, cfg: &SourcesConfig) -> Self {
        Self {
            http,
            coin_id: cfg.coin_id.clone(),
            coingecko_url: cfg.coingecko_url.trim_end_matches('/').to_string(),
            binance_url: cfg.binance_url.trim_end_matches('/').to_string(),
            binance_symbol: cfg.binance_symbol.clone(),
            kraken_url: cfg.kraken_url.trim_end_matches('/').to_string(),
            kraken_pair: cfg.kraken_pair.clone(),
        }
    }

    async fn coingecko(&self) -> Result<PriceRecord, FetchError> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd&include_market_cap=true\
             &include_24hr_vol=true&include_24hr_change=true",
            self.coingecko_url, self.coin_id
        );
        let body: HashMap<String, CoinGeckoQuote> = self.http.get_json(&url).await?;
        parse_coingecko(body, &self.coin_id)
    }

    async fn binance(&self) -> Result<PriceRecord, FetchError> {
        let url = format!(
            "{}/api/v3/ticker/24hr?symbol={}",
            self.binance_url, self.binance_symbol
        );
        let ticker: BinanceTicker = self.http.get_json(&url).await?;
        parse_binance(&ticker)
    }

    async fn kraken(&self) -> Result<PriceRecord, FetchError> {
        let url = format!("{}/0/public/Ticker?pair={}", self.kraken_url, self.kraken_pair);
        let body: KrakenResponse = self.http.get_json(&url).await?;
        parse_kraken(body)
    }
}

#[async_trait]
impl SourceAdapter for PriceAdapter {
    type Record = PriceRecord;

    fn name(&self) -> &'static str {
        "price"
    }

    async fn try_fetch(&self) -> Result<Sourced<PriceRecord>, FetchError> {
        let mut errors = Vec::new();

        match self.coingecko().await {
            Ok(rec) => return Ok(Sourced::new(rec, "coingecko")),
            Err(e) => chain_failure(&mut errors, self.name(), "coingecko", e),
        }
        match self.binance().await {
            Ok(rec) => return Ok(Sourced::new(rec, "binance")),
            Err(e) => chain_failure(&mut errors, self.name(), "binance", e),
        }
        match self.kraken().await {
            Ok(rec) => return Ok(Sourced::new(rec, "kraken")),
            Err(e) => chain_failure(&mut errors, self.name(), "kraken", e),
        }

        Err(FetchError::Exhausted(errors.join("; ")))
    }
}

// ── CoinGecko ──

#[derive(Deserialize)]
struct CoinGeckoQuote {
    usd: f64,
    usd_market_cap: Option<f64>,
    usd_24h_vol: Option<f64>,
    usd_24h_change: Option<f64>,
}

fn parse_coingecko(
    mut body: HashMap<String, CoinGeckoQuote>,
    coin_id: &str,
) -> Result<PriceRecord, FetchError> {
    let quote = body
        .remove(coin_id)
        .ok_or_else(|| FetchError::shape(format!("no quote for {coin_id}")))?;
    Ok(PriceRecord {
        usd: Some(positive(quote.usd)?),
        change_24h_pct: quote.usd_24h_change,
        market_cap_usd: quote.usd_market_cap,
        volume_24h_usd: quote.usd_24h_vol,
    })
}

// ── Binance ──

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceTicker {
    last_price: String,
    price_change_percent: String,
    quote_volume: String,
}

fn parse_binance(t: &BinanceTicker) -> Result<PriceRecord, FetchError> {
    Ok(PriceRecord {
        usd: Some(positive(parse_num(&t.last_price, "lastPrice")?)?),
        change_24h_pct: Some(parse_num(&t.price_change_percent, "priceChangePercent")?),
        market_cap_usd: None,
        volume_24h_usd: Some(parse_num(&t.quote_volume, "quoteVolume")?),
    })
}

// ── Kraken ──

#[derive(Deserialize)]
struct KrakenResponse {
    #[serde(default)]
    error: Vec<String>,
    result: Option<HashMap<String, KrakenTicker>>,
}

/// Kraken ticker fields: `c` = [last price, lot], `o` = today's open,
/// `v` = [volume today, volume 24h] in base units.
#[derive(Deserialize)]
struct KrakenTicker {
    c: Vec<String>,
    o: String,
    v: Vec<String>,
}

fn parse_kraken(body: KrakenResponse) -> Result<PriceRecord, FetchError> {
    if !body.error.is_empty() {
        return Err(FetchError::shape(body.error.join(", ")));
    }
    // One pair per request, but Kraken renames it (XRPUSD -> XXRPZUSD).
    let ticker = body
        .result
        .and_then(|r| r.into_values().next())
        .ok_or_else(|| FetchError::shape("empty ticker result"))?;

    let last = positive(parse_num(
        ticker.c.first().map(String::as_str).unwrap_or(""),
        "c[0]",
    )?)?;
    let open = parse_num(&ticker.o, "o")?;
    let base_volume = parse_num(ticker.v.get(1).map(String::as_str).unwrap_or(""), "v[1]")?;

    Ok(PriceRecord {
        usd: Some(last),
        change_24h_pct: safe_div(Some(last - open), Some(open)).map(|r| r * 100.0),
        market_cap_usd: None,
        volume_24h_usd: Some(base_volume * last),
    })
}

/// A zero or negative price is treated as a bad response, so later
/// conversions never divide by it.
fn positive(price: f64) -> Result<f64, FetchError> {
    if price > 0.0 && price.is_finite() {
        Ok(price)
    } else {
        Err(FetchError::shape(format!("non-positive price {price}")))
    }
}
