use ring::digest::{SHA256, digest};
use ring::rand::SystemRandom;
use ring::signature::{ED25519, Ed25519KeyPair, KeyPair, UnparsedPublicKey};

use crate::protocol::{PaymentProof, PaymentTerms, Transaction};
use crate::{PayError, canonical_json};

/// The memo that binds a transaction to one challenge.
pub fn challenge_memo(challenge_id: &str) -> String {
    hex::encode(digest(&SHA256, challenge_id.as_bytes()))
}

/// A ledger account and the Ed25519 key that signs for it.
pub struct Wallet {
    account: String,
    key_pair: Ed25519KeyPair,
}

impl Wallet {
    /// Build from a hex-encoded 32-byte seed.
    pub fn from_seed_hex(account: impl Into<String>, seed_hex: &str) -> Result<Self, PayError> {
        let seed = hex::decode(seed_hex.trim())?;
        let key_pair =
            Ed25519KeyPair::from_seed_unchecked(&seed).map_err(|e| PayError::Key(e.to_string()))?;
        Ok(Self {
            account: account.into(),
            key_pair,
        })
    }

    /// A fresh random key, for demos against a test merchant.
    pub fn generate(account: impl Into<String>) -> Result<Self, PayError> {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng)
            .map_err(|_| PayError::Key("key generation failed".into()))?;
        let key_pair =
            Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).map_err(|e| PayError::Key(e.to_string()))?;
        Ok(Self {
            account: account.into(),
            key_pair,
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key_pair.public_key().as_ref())
    }

    /// Sign `tx` and wrap it for the `X-PAYMENT` header.
    pub fn prove(&self, challenge_id: &str, tx: Transaction) -> Result<PaymentProof, PayError> {
        let message = canonical_json(&tx)?;
        let signature = self.key_pair.sign(&message);
        Ok(PaymentProof {
            challenge_id: challenge_id.to_string(),
            public_key: self.public_key_hex(),
            signature: hex::encode(signature.as_ref()),
            tx,
        })
    }
}

/// Merchant-side check of a proof against the challenge it answers.
///
/// The memo must be the hash of the challenge id, the payment must go to
/// the challenge's recipient for at least its amount, and the signature
/// must verify under the included key.
pub fn verify_payment(proof: &PaymentProof, terms: &PaymentTerms) -> Result<(), PayError> {
    if proof.challenge_id != terms.challenge_id
        || proof.tx.memo != challenge_memo(&terms.challenge_id)
        || proof.tx.destination != terms.recipient
        || proof.tx.amount < terms.amount
    {
        return Err(PayError::Unbound(terms.challenge_id.clone()));
    }
    let public_key = hex::decode(&proof.public_key)?;
    let signature = hex::decode(&proof.signature)?;
    let message = canonical_json(&proof.tx)?;
    UnparsedPublicKey::new(&ED25519, public_key)
        .verify(&message, &signature)
        .map_err(|_| PayError::BadSignature)
}

#[cfg(test)]
mod tests {
    use thesisboard_core::Drops;

    use super::*;

    const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn terms() -> PaymentTerms {
        PaymentTerms {
            amount: Drops::new(1_000),
            challenge_id: "ch-42".into(),
            network: "testnet".into(),
            recipient: "rMerchant".into(),
            timeout_secs: 30,
        }
    }

    fn tx(memo: String) -> Transaction {
        Transaction {
            transaction_type: "Payment".into(),
            account: "rAgent".into(),
            destination: "rMerchant".into(),
            amount: Drops::new(1_000),
            fee: Drops::new(12),
            sequence: 7,
            memo,
        }
    }

    #[test]
    fn memo_is_sha256_hex() {
        assert_eq!(
            challenge_memo("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn seed_gives_known_public_key() {
        // RFC 8032 test vector 1.
        let wallet = Wallet::from_seed_hex("rAgent", SEED).unwrap();
        assert_eq!(
            wallet.public_key_hex(),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
    }

    #[test]
    fn proof_verifies() {
        let wallet = Wallet::generate("rAgent").unwrap();
        let proof = wallet.prove("ch-42", tx(challenge_memo("ch-42"))).unwrap();
        verify_payment(&proof, &terms()).unwrap();
    }

    #[test]
    fn tampered_amount_fails_signature() {
        let wallet = Wallet::from_seed_hex("rAgent", SEED).unwrap();
        let mut proof = wallet.prove("ch-42", tx(challenge_memo("ch-42"))).unwrap();
        proof.tx.amount = Drops::new(5_000);
        assert!(matches!(
            verify_payment(&proof, &terms()),
            Err(PayError::BadSignature)
        ));
    }

    #[test]
    fn proof_for_another_challenge_is_unbound() {
        let wallet = Wallet::from_seed_hex("rAgent", SEED).unwrap();
        let proof = wallet.prove("ch-1", tx(challenge_memo("ch-1"))).unwrap();
        assert!(matches!(
            verify_payment(&proof, &terms()),
            Err(PayError::Unbound(_))
        ));
    }

    #[test]
    fn short_seed_rejected() {
        assert!(matches!(
            Wallet::from_seed_hex("rAgent", "abcd"),
            Err(PayError::Key(_))
        ));
    }
}
