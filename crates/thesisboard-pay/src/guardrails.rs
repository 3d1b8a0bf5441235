use std::fmt;

use thesisboard_core::Drops;

/// Spending limits checked before anything is signed.
#[derive(Debug, Clone)]
pub struct Guardrails {
    /// Balance that must remain after amount and fee.
    pub balance_floor: Drops,
    /// Largest single payment.
    pub per_tx_cap: Drops,
    /// Largest total across one run, fees included.
    pub session_cap: Drops,
    /// Transaction types the agent may sign.
    pub allowed_types: Vec<String>,
}

impl Default for Guardrails {
    fn default() -> Self {
        Self {
            balance_floor: Drops::from_native(20),
            per_tx_cap: Drops::from_native(1),
            session_cap: Drops::from_native(5),
            allowed_types: vec!["Payment".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    TypeNotPermitted,
    CapExceeded,
    SessionCapExceeded,
    BalanceFloor,
}

impl Violation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeNotPermitted => "transaction type not permitted",
            Self::CapExceeded => "cap exceeded",
            Self::SessionCapExceeded => "session cap exceeded",
            Self::BalanceFloor => "balance floor",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Guardrails {
    /// Checks that need no ledger state. `session_spent` already includes
    /// the fees of earlier payments; this payment's fee is added here.
    pub fn check_request(
        &self,
        transaction_type: &str,
        amount: Drops,
        fee: Drops,
        session_spent: Drops,
    ) -> Result<(), Violation> {
        if !self.allowed_types.iter().any(|t| t == transaction_type) {
            return Err(Violation::TypeNotPermitted);
        }
        if amount > self.per_tx_cap {
            return Err(Violation::CapExceeded);
        }
        match session_spent.checked_add(amount).and_then(|t| t.checked_add(fee)) {
            Some(total) if total <= self.session_cap => Ok(()),
            _ => Err(Violation::SessionCapExceeded),
        }
    }

    /// `balance - amount - fee >= floor`.
    pub fn check_balance(&self, balance: Drops, amount: Drops, fee: Drops) -> Result<(), Violation> {
        let remaining = balance
            .checked_sub(amount)
            .and_then(|r| r.checked_sub(fee));
        match remaining {
            Some(r) if r >= self.balance_floor => Ok(()),
            _ => Err(Violation::BalanceFloor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rails() -> Guardrails {
        Guardrails {
            balance_floor: Drops::new(10_000),
            per_tx_cap: Drops::new(1_000),
            session_cap: Drops::new(1_500),
            allowed_types: vec!["Payment".into()],
        }
    }

    #[test]
    fn within_limits() {
        assert_eq!(
            rails().check_request("Payment", Drops::new(1_000), Drops::new(12), Drops::new(400)),
            Ok(())
        );
    }

    #[test]
    fn over_per_tx_cap() {
        assert_eq!(
            rails().check_request("Payment", Drops::new(1_001), Drops::new(12), Drops::new(0)),
            Err(Violation::CapExceeded)
        );
    }

    #[test]
    fn over_session_cap() {
        assert_eq!(
            rails().check_request("Payment", Drops::new(600), Drops::new(12), Drops::new(1_000)),
            Err(Violation::SessionCapExceeded)
        );
    }

    #[test]
    fn fees_count_toward_session_cap() {
        let r = rails();
        assert_eq!(
            r.check_request("Payment", Drops::new(744), Drops::new(0), Drops::new(756)),
            Ok(())
        );
        assert_eq!(
            r.check_request("Payment", Drops::new(744), Drops::new(12), Drops::new(756)),
            Err(Violation::SessionCapExceeded)
        );
    }

    #[test]
    fn only_whitelisted_types() {
        let err = rails()
            .check_request("AccountDelete", Drops::new(1), Drops::new(12), Drops::new(0))
            .unwrap_err();
        assert_eq!(err.to_string(), "transaction type not permitted");
    }

    #[test]
    fn floor_counts_the_fee() {
        let r = rails();
        assert_eq!(r.check_balance(Drops::new(11_012), Drops::new(1_000), Drops::new(12)), Ok(()));
        assert_eq!(
            r.check_balance(Drops::new(11_011), Drops::new(1_000), Drops::new(12)),
            Err(Violation::BalanceFloor)
        );
    }
}
