//! Wire types of the 402 exchange.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thesisboard_core::Drops;

/// On the 402 response: base64 canonical JSON of [`PaymentTerms`].
pub const PAYMENT_REQUIRED_HEADER: &str = "x-payment-required";
/// On the retry: base64 canonical JSON of [`PaymentProof`].
pub const PAYMENT_HEADER: &str = "x-payment";
/// On the settled 200: base64 canonical JSON of [`Receipt`].
pub const PAYMENT_RESPONSE_HEADER: &str = "x-payment-response";

/// The merchant's challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTerms {
    pub amount: Drops,
    pub challenge_id: String,
    pub network: String,
    pub recipient: String,
    /// Seconds the challenge stays valid after it was issued.
    pub timeout_secs: u64,
}

/// A ledger payment. Signed over its canonical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_type: String,
    pub account: String,
    pub destination: String,
    pub amount: Drops,
    pub fee: Drops,
    pub sequence: u32,
    /// hex(SHA-256(challenge_id)).
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProof {
    pub challenge_id: String,
    /// Hex Ed25519 public key.
    pub public_key: String,
    /// Hex Ed25519 signature over the transaction's canonical JSON.
    pub signature: String,
    pub tx: Transaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub challenge_id: String,
    pub ledger_tx_hash: String,
    pub settled_at: DateTime<Utc>,
}
