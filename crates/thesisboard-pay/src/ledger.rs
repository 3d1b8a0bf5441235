use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thesisboard_core::Drops;
use tracing::debug;

use crate::PayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    pub balance: Drops,
    pub sequence: u32,
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn account_info(&self, account: &str) -> Result<AccountInfo, PayError>;
}

/// `account_info` over the ledger's JSON-RPC endpoint.
pub struct JsonRpcLedger {
    client: reqwest::Client,
    url: String,
}

impl JsonRpcLedger {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[derive(Deserialize)]
struct RpcEnvelope {
    result: RpcResult,
}

#[derive(Deserialize)]
struct RpcResult {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    account_data: Option<AccountData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccountData {
    balance: Drops,
    sequence: u32,
}

fn parse_account_info(body: RpcEnvelope) -> Result<AccountInfo, PayError> {
    let result = body.result;
    if let Some(code) = result.error {
        let detail = result.error_message.unwrap_or_default();
        return Err(PayError::Rpc(format!("{code} {detail}").trim_end().to_string()));
    }
    let data = result
        .account_data
        .ok_or_else(|| PayError::Rpc("response has no account_data".into()))?;
    Ok(AccountInfo {
        balance: data.balance,
        sequence: data.sequence,
    })
}

#[async_trait]
impl LedgerClient for JsonRpcLedger {
    async fn account_info(&self, account: &str) -> Result<AccountInfo, PayError> {
        let request = json!({
            "method": "account_info",
            "params": [{"account": account, "ledger_index": "validated"}],
        });
        debug!(%account, "account_info");
        let body: RpcEnvelope = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_account_info(body)
    }
}
