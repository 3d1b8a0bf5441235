//! Machine payments over HTTP 402.
//!
//! A paywalled resource answers `402` with a payment challenge. The agent
//! checks the price against its [`Guardrails`], signs a ledger payment bound
//! to the challenge, and retries with the signed payment attached. The
//! merchant settles it and answers `200` with a receipt.
//!
//! ```text
//! UNPAID ──200──────────────────────────────────────► FREE
//!   │
//!   └─402──► CHALLENGE_RECEIVED ──guardrails ok──► SUBMITTED ──200+receipt──► SETTLED
//!                   │                                  │
//!                   └──violation / expired─────────────┴──anything else──────► REJECTED
//! ```

mod agent;
mod codec;
mod error;
mod guardrails;
mod ledger;
mod protocol;
mod signer;
mod transport;

pub use agent::{AgentConfig, Outcome, PaymentAgent, PaymentState};
pub use codec::{canonical_json, decode_header, encode_header};
pub use error::PayError;
pub use guardrails::{Guardrails, Violation};
pub use ledger::{AccountInfo, JsonRpcLedger, LedgerClient};
pub use protocol::{
    PAYMENT_HEADER, PAYMENT_REQUIRED_HEADER, PAYMENT_RESPONSE_HEADER, PaymentProof,
    PaymentTerms, Receipt, Transaction,
};
pub use signer::{Wallet, challenge_memo, verify_payment};
pub use transport::{HttpPaywall, PaywallResponse, PaywallTransport};
