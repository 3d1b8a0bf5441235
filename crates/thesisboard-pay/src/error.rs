#[derive(Debug, thiserror::Error)]
pub enum PayError {
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("hex decode failed: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("ledger RPC error: {0}")]
    Rpc(String),

    #[error("invalid key: {0}")]
    Key(String),

    #[error("signature does not verify")]
    BadSignature,

    #[error("payment not bound to challenge {0}")]
    Unbound(String),
}

// Request URLs carry credentials (query keys, bot tokens). Strip them
// before the error is displayed or stored.
impl From<reqwest::Error> for PayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}
