use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use thesisboard_core::{FxRecord, safe_div};

use super::chain_failure;
use crate::{FetchError, HttpFetcher, SourceAdapter, Sourced, SourcesConfig};

/// USD/JPY and EUR/USD: open.er-api.com, then Frankfurter.
///
/// Both providers quote against a USD base, so EUR/USD is the inverse of the
/// quoted USD→EUR rate.
pub struct FxAdapter {
    http: HttpFetcher,
    primary_url: String,
    secondary_url: String,
}

impl FxAdapter {
    pub fn new(http: HttpFetcher, cfg: &SourcesConfig) -> Self {
        Self {
            http,
            primary_url: cfg.fx_primary_url.clone(),
            secondary_url: cfg.fx_secondary_url.clone(),
        }
    }
}

#[async_trait]
impl SourceAdapter for FxAdapter {
    type Record = FxRecord;

    fn name(&self) -> &'static str {
        "fx"
    }

    async fn try_fetch(&self) -> Result<Sourced<FxRecord>, FetchError> {
        let mut errors = Vec::new();

        match self.http.get_json::<RatesResponse>(&self.primary_url).await {
            Ok(body) => match parse_rates(body) {
                Ok(rec) => return Ok(Sourced::new(rec, "open.er-api.com")),
                Err(e) => chain_failure(&mut errors, self.name(), "open.er-api.com", e),
            },
            Err(e) => chain_failure(&mut errors, self.name(), "open.er-api.com", e),
        }
        match self.http.get_json::<RatesResponse>(&self.secondary_url).await {
            Ok(body) => match parse_rates(body) {
                Ok(rec) => return Ok(Sourced::new(rec, "frankfurter")),
                Err(e) => chain_failure(&mut errors, self.name(), "frankfurter", e),
            },
            Err(e) => chain_failure(&mut errors, self.name(), "frankfurter", e),
        }

        Err(FetchError::Exhausted(errors.join("; ")))
    }
}

/// Shape shared by both providers: `{"rates": {"JPY": 150.1, "EUR": 0.92, ...}}`.
/// open.er-api.com also sends `"result": "success" | "error"`.
#[derive(Deserialize)]
struct RatesResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

fn parse_rates(body: RatesResponse) -> Result<FxRecord, FetchError> {
    if let Some(result) = &body.result
        && result != "success"
    {
        return Err(FetchError::shape(format!("provider result {result:?}")));
    }
    let usd_jpy = body
        .rates
        .get("JPY")
        .copied()
        .filter(|r| *r > 0.0)
        .ok_or_else(|| FetchError::shape("missing JPY rate"))?;
    let eur_usd = safe_div(Some(1.0), body.rates.get("EUR").copied());
    Ok(FxRecord {
        usd_jpy: Some(usd_jpy),
        eur_usd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn er_api_shape() {
        let body = serde_json::from_str(
            r#"{"result": "success", "base_code": "USD", "rates": {"USD": 1, "JPY": 151.2, "EUR": 0.5}}"#,
        )
        .unwrap();
        let rec = parse_rates(body).unwrap();
        assert_eq!(rec.usd_jpy, Some(151.2));
        assert_eq!(rec.eur_usd, Some(2.0));
    }

    #[test]
    fn frankfurter_shape() {
        let body = serde_json::from_str(
            r#"{"amount": 1.0, "base": "USD", "date": "2026-10-16", "rates": {"JPY": 150.0}}"#,
        )
        .unwrap();
        let rec = parse_rates(body).unwrap();
        assert_eq!(rec.usd_jpy, Some(150.0));
        assert_eq!(rec.eur_usd, None);
    }

    #[test]
    fn provider_error_result() {
        let body = serde_json::from_str(r#"{"result": "error", "error-type": "quota"}"#).unwrap();
        assert!(matches!(parse_rates(body), Err(FetchError::Shape(_))));
    }

    #[test]
    fn zero_eur_rate_is_null_not_infinity() {
        let body = serde_json::from_str(r#"{"rates": {"JPY": 150.0, "EUR": 0}}"#).unwrap();
        assert_eq!(parse_rates(body).unwrap().eur_usd, None);
    }
}
