use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use thesisboard_core::{Drops, LedgerRecord};

use crate::{FetchError, HttpFetcher, SourceAdapter, Sourced, SourcesConfig};

/// Total supply and tracked-account balances over the ledger's JSON-RPC API.
///
/// Amounts are parsed straight into exact [`Drops`]; they never pass through `f64`.
pub struct LedgerAdapter {
    http: HttpFetcher,
    rpc_url: String,
    tracked_accounts: Vec<String>,
}

impl LedgerAdapter {
    pub fn new(http: HttpFetcher, cfg: &SourcesConfig) -> Self {
        Self {
            http,
            rpc_url: cfg.ledger_rpc_url.clone(),
            tracked_accounts: cfg.tracked_accounts.clone(),
        }
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, FetchError> {
        let body = json!({ "method": method, "params": [params] });
        let resp: RpcResponse = self.http.post_json(&self.rpc_url, &body).await?;
        unwrap_result(resp, method)
    }
}

#[async_trait]
impl SourceAdapter for LedgerAdapter {
    type Record = LedgerRecord;

    fn name(&self) -> &'static str {
        "ledger"
    }

    async fn try_fetch(&self) -> Result<Sourced<LedgerRecord>, FetchError> {
        let ledger = self
            .rpc("ledger", json!({ "ledger_index": "validated" }))
            .await?;
        let (total_coins, ledger_index) = parse_ledger(&ledger)?;

        // Same node for every account; query them one at a time.
        let mut tracked: Option<Drops> = None;
        for account in &self.tracked_accounts {
            let info = self
                .rpc(
                    "account_info",
                    json!({ "account": account, "ledger_index": "validated" }),
                )
                .await?;
            let balance = parse_balance(&info)?;
            let sum = tracked.unwrap_or_default().checked_add(balance);
            tracked = Some(sum.ok_or_else(|| FetchError::shape("tracked balance overflow"))?);
        }

        Ok(Sourced::new(
            LedgerRecord {
                total_coins_drops: Some(total_coins),
                tracked_balance_drops: tracked,
                ledger_index: Some(ledger_index),
            },
            "json-rpc",
        ))
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Value,
}

fn unwrap_result(resp: RpcResponse, method: &str) -> Result<Value, FetchError> {
    let status = resp.result.get("status").and_then(Value::as_str);
    if status != Some("success") {
        let error = resp
            .result
            .get("error_message")
            .or_else(|| resp.result.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(FetchError::shape(format!("{method}: {error}")));
    }
    Ok(resp.result)
}

fn parse_ledger(result: &Value) -> Result<(Drops, u64), FetchError> {
    let ledger = result
        .get("ledger")
        .ok_or_else(|| FetchError::shape("ledger: missing ledger object"))?;
    let total = ledger
        .get("total_coins")
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::shape("ledger: missing total_coins"))?
        .parse::<Drops>()
        .map_err(|e| FetchError::shape(e.to_string()))?;
    // Older servers send ledger_index as a string.
    let index = match ledger.get("ledger_index") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| FetchError::shape("ledger: missing ledger_index"))?;
    Ok((total, index))
}

fn parse_balance(result: &Value) -> Result<Drops, FetchError> {
    result
        .pointer("/account_data/Balance")
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::shape("account_info: missing Balance"))?
        .parse::<Drops>()
        .map_err(|e| FetchError::shape(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc(v: Value) -> RpcResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn ledger_total_is_exact() {
        let result = unwrap_result(
            rpc(json!({"result": {
                "status": "success",
                "ledger": {"total_coins": "99985687626634189", "ledger_index": "98765432"}
            }})),
            "ledger",
        )
        .unwrap();
        let (total, index) = parse_ledger(&result).unwrap();
        assert_eq!(total, Drops::new(99_985_687_626_634_189));
        assert_eq!(index, 98_765_432);
    }

    #[test]
    fn numeric_ledger_index_accepted() {
        let result = json!({"ledger": {"total_coins": "1", "ledger_index": 7}});
        assert_eq!(parse_ledger(&result).unwrap().1, 7);
    }

    #[test]
    fn rpc_error_surfaces_message() {
        let err = unwrap_result(
            rpc(json!({"result": {
                "status": "error",
                "error": "actNotFound",
                "error_message": "Account not found."
            }})),
            "account_info",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Account not found."));
    }

    #[test]
    fn account_balance() {
        let result = json!({"status": "success", "account_data": {"Balance": "1234567890123"}});
        assert_eq!(parse_balance(&result).unwrap(), Drops::new(1_234_567_890_123));
    }

    #[test]
    fn float_balance_rejected() {
        let result = json!({"account_data": {"Balance": "12.5"}});
        assert!(parse_balance(&result).is_err());
    }
}
