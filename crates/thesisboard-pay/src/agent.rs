use std::time::Duration;

use chrono::Utc;
use thesisboard_core::Drops;
use tracing::{info, warn};

use crate::guardrails::Guardrails;
use crate::ledger::LedgerClient;
use crate::protocol::{
    PAYMENT_REQUIRED_HEADER, PAYMENT_RESPONSE_HEADER, PaymentTerms, Receipt, Transaction,
};
use crate::signer::{Wallet, challenge_memo};
use crate::transport::PaywallTransport;
use crate::{decode_header, encode_header};

const PAYMENT_TYPE: &str = "Payment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    Unpaid,
    ChallengeReceived,
    Submitted,
    Settled,
    Rejected,
    Free,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::ChallengeReceived => "CHALLENGE_RECEIVED",
            Self::Submitted => "SUBMITTED",
            Self::Settled => "SETTLED",
            Self::Rejected => "REJECTED",
            Self::Free => "FREE",
        }
    }
}

/// Terminal result for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Free { body: String },
    Settled { receipt: Receipt, body: String },
    Rejected { reason: String },
}

impl Outcome {
    pub fn state(&self) -> PaymentState {
        match self {
            Self::Free { .. } => PaymentState::Free,
            Self::Settled { .. } => PaymentState::Settled,
            Self::Rejected { .. } => PaymentState::Rejected,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Network the wallet lives on. Challenges for any other network are refused.
    pub network: String,
    pub fee: Drops,
    pub guardrails: Guardrails,
}

pub struct PaymentAgent<'a> {
    transport: &'a dyn PaywallTransport,
    ledger: &'a dyn LedgerClient,
    wallet: &'a Wallet,
    config: AgentConfig,
    session_spent: Drops,
}

impl<'a> PaymentAgent<'a> {
    pub fn new(
        transport: &'a dyn PaywallTransport,
        ledger: &'a dyn LedgerClient,
        wallet: &'a Wallet,
        config: AgentConfig,
    ) -> Self {
        Self {
            transport,
            ledger,
            wallet,
            config,
            session_spent: Drops::default(),
        }
    }

    /// Amounts plus fees settled this session.
    pub fn session_spent(&self) -> Drops {
        self.session_spent
    }

    /// Fetch each resource in turn. A rejection affects only its own resource.
    pub async fn run_batch(&mut self, urls: &[String]) -> Vec<(String, Outcome)> {
        let mut outcomes = Vec::with_capacity(urls.len());
        for url in urls {
            let outcome = self.fetch(url).await;
            outcomes.push((url.clone(), outcome));
        }
        outcomes
    }

    /// Drive one resource from UNPAID to a terminal state.
    pub async fn fetch(&mut self, url: &str) -> Outcome {
        let outcome = self.drive(url).await;
        match &outcome {
            Outcome::Rejected { reason } => {
                warn!(%url, state = PaymentState::Rejected.as_str(), %reason, "payment rejected")
            }
            other => info!(%url, state = other.state().as_str(), "resource done"),
        }
        outcome
    }

    async fn drive(&mut self, url: &str) -> Outcome {
        transition(url, PaymentState::Unpaid);
        let first = match self.transport.get(url, None).await {
            Ok(resp) => resp,
            Err(e) => return rejected(e),
        };
        match first.status {
            200 => return Outcome::Free { body: first.body },
            402 => {}
            other => return rejected(format!("unexpected status {other}")),
        }

        let Some(header) = first.header(PAYMENT_REQUIRED_HEADER) else {
            return rejected("402 without payment challenge");
        };
        let terms: PaymentTerms = match decode_header(header) {
            Ok(t) => t,
            Err(e) => return rejected(format!("bad challenge: {e}")),
        };
        let received_at = Utc::now();
        transition(url, PaymentState::ChallengeReceived);
        info!(
            challenge = %terms.challenge_id,
            amount = %terms.amount,
            recipient = %terms.recipient,
            "challenge received"
        );

        if terms.network != self.config.network {
            return rejected(format!("network mismatch: {}", terms.network));
        }
        let rails = &self.config.guardrails;
        let fee = self.config.fee;
        if let Err(v) = rails.check_request(PAYMENT_TYPE, terms.amount, fee, self.session_spent) {
            return rejected(v);
        }
        let account = match self.ledger.account_info(self.wallet.account()).await {
            Ok(a) => a,
            Err(e) => return rejected(format!("ledger lookup failed: {e}")),
        };
        if let Err(v) = rails.check_balance(account.balance, terms.amount, self.config.fee) {
            return rejected(v);
        }
        let elapsed = (Utc::now() - received_at).to_std().unwrap_or_default();
        if elapsed >= Duration::from_secs(terms.timeout_secs) {
            return rejected("challenge expired");
        }

        let tx = Transaction {
            transaction_type: PAYMENT_TYPE.to_string(),
            account: self.wallet.account().to_string(),
            destination: terms.recipient.clone(),
            amount: terms.amount,
            fee: self.config.fee,
            sequence: account.sequence,
            memo: challenge_memo(&terms.challenge_id),
        };
        let header = match self
            .wallet
            .prove(&terms.challenge_id, tx)
            .and_then(|proof| encode_header(&proof))
        {
            Ok(h) => h,
            Err(e) => return rejected(format!("signing failed: {e}")),
        };

        transition(url, PaymentState::Submitted);
        let second = match self.transport.get(url, Some(&header)).await {
            Ok(resp) => resp,
            Err(e) => return rejected(e),
        };
        if second.status != 200 {
            let body: String = second.body.chars().take(200).collect();
            return rejected(format!("merchant returned {}: {body}", second.status));
        }
        let Some(receipt_header) = second.header(PAYMENT_RESPONSE_HEADER) else {
            return rejected("200 without payment receipt");
        };
        let receipt: Receipt = match decode_header(receipt_header) {
            Ok(r) => r,
            Err(e) => return rejected(format!("bad receipt: {e}")),
        };
        if receipt.challenge_id != terms.challenge_id {
            return rejected("receipt does not match challenge");
        }

        self.session_spent = self
            .session_spent
            .checked_add(terms.amount)
            .and_then(|t| t.checked_add(self.config.fee))
            .unwrap_or(self.session_spent);
        transition(url, PaymentState::Settled);
        info!(
            challenge = %receipt.challenge_id,
            tx_hash = %receipt.ledger_tx_hash,
            session_spent = %self.session_spent,
            "payment settled"
        );
        Outcome::Settled {
            receipt,
            body: second.body,
        }
    }
}

fn transition(url: &str, state: PaymentState) {
    tracing::debug!(%url, state = state.as_str(), "payment state");
}

fn rejected(reason: impl ToString) -> Outcome {
    Outcome::Rejected {
        reason: reason.to_string(),
    }
}
