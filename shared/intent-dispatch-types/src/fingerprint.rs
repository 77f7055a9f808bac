//! Canonical intent fingerprint.
//!
//! The fingerprint is what the controller signs and what the account verifies. It covers every
//! intent field except the signature, in a fixed order, ABI-encoded as 32-byte words. Dynamic
//! fields are committed through their keccak256 so the encoding stays fixed-size and an empty
//! payload (`keccak256("")`) can never be confused with an absent one.

use alloy_primitives::{eip191_hash_message, keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;

use crate::intent::Intent;

/// Dispatcher + network binding for a fingerprint.
///
/// Binding both prevents an intent accepted by one dispatcher (or on one network) from being
/// replayed against another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FingerprintDomain {
    pub dispatcher: Address,
    pub chain_id: u64,
}

/// How the account turns a fingerprint into the digest that was actually signed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DigestScheme {
    /// The fingerprint itself is signed.
    #[default]
    Raw,
    /// `"\x19Ethereum Signed Message:\n32" || fingerprint` (wallet `personal_sign`).
    Eip191,
}

impl DigestScheme {
    pub fn digest(self, fingerprint: B256) -> B256 {
        match self {
            DigestScheme::Raw => fingerprint,
            DigestScheme::Eip191 => eip191_hash_message(fingerprint),
        }
    }

    /// Storage encoding used by the account.
    pub fn as_word(self) -> U256 {
        match self {
            DigestScheme::Raw => U256::ZERO,
            DigestScheme::Eip191 => U256::from(1u64),
        }
    }

    pub fn from_word(word: U256) -> Self {
        if word == U256::from(1u64) {
            DigestScheme::Eip191
        } else {
            DigestScheme::Raw
        }
    }
}

/// Hash of the intent fields alone (no domain binding).
pub fn intent_hash(intent: &Intent) -> B256 {
    let encoded = (
        intent.sender,
        intent.sequence,
        keccak256(&intent.deployment_payload),
        keccak256(&intent.action_payload),
        intent.resource_limits.account_gas_limits(),
        intent.resource_limits.pre_verification_gas,
        intent.fee_parameters.gas_fees(),
        keccak256(&intent.authorization_data),
    )
        .abi_encode();
    keccak256(encoded)
}

/// Fingerprint of an intent, optionally bound to a dispatcher + chain.
pub fn fingerprint(intent: &Intent, domain: Option<&FingerprintDomain>) -> B256 {
    let inner = intent_hash(intent);
    match domain {
        None => inner,
        Some(domain) => {
            let encoded = (inner, domain.dispatcher, U256::from(domain.chain_id)).abi_encode();
            keccak256(encoded)
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Bytes;

    use super::*;
    use crate::intent::{FeeParameters, ResourceLimits};

    fn sample() -> Intent {
        Intent {
            sender: Address::repeat_byte(0x42),
            sequence: U256::from(3u64),
            deployment_payload: Bytes::new(),
            action_payload: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
            resource_limits: ResourceLimits {
                verification_gas_limit: 150_000,
                call_gas_limit: 500_000,
                pre_verification_gas: U256::from(50_000u64),
            },
            fee_parameters: FeeParameters {
                max_priority_fee_per_gas: 2,
                max_fee_per_gas: 40,
            },
            authorization_data: Bytes::new(),
            signature: Bytes::new(),
        }
    }

    #[test]
    fn signature_is_not_fingerprinted() {
        let a = sample();
        let mut b = sample();
        b.signature = Bytes::from(vec![7u8; 65]);
        assert_eq!(fingerprint(&a, None), fingerprint(&b, None));
    }

    #[test]
    fn every_covered_field_changes_the_fingerprint() {
        let base = fingerprint(&sample(), None);
        let mutations: [fn(&mut Intent); 10] = [
            |i| i.sender = Address::repeat_byte(0x43),
            |i| i.sequence += U256::from(1u64),
            |i| i.deployment_payload = Bytes::from_static(&[0x00]),
            |i| i.action_payload = Bytes::from_static(&[0xde, 0xad, 0xbe, 0xee]),
            |i| i.resource_limits.verification_gas_limit += 1,
            |i| i.resource_limits.call_gas_limit += 1,
            |i| i.resource_limits.pre_verification_gas += U256::from(1u64),
            |i| i.fee_parameters.max_priority_fee_per_gas += 1,
            |i| i.fee_parameters.max_fee_per_gas += 1,
            |i| i.authorization_data = Bytes::from_static(&[0x01]),
        ];
        for mutate in mutations {
            let mut intent = sample();
            mutate(&mut intent);
            assert_ne!(fingerprint(&intent, None), base);
        }
    }

    #[test]
    fn empty_payload_is_distinct_from_zero_byte_payload() {
        let mut empty = sample();
        empty.deployment_payload = Bytes::new();
        let mut zero = sample();
        zero.deployment_payload = Bytes::from_static(&[0x00]);
        assert_ne!(fingerprint(&empty, None), fingerprint(&zero, None));
    }

    #[test]
    fn domain_binding_separates_dispatchers_and_chains() {
        let intent = sample();
        let a = FingerprintDomain { dispatcher: Address::repeat_byte(1), chain_id: 1 };
        let b = FingerprintDomain { dispatcher: Address::repeat_byte(2), chain_id: 1 };
        let c = FingerprintDomain { dispatcher: Address::repeat_byte(1), chain_id: 10 };

        let unbound = fingerprint(&intent, None);
        let fa = fingerprint(&intent, Some(&a));
        assert_ne!(unbound, fa);
        assert_ne!(fa, fingerprint(&intent, Some(&b)));
        assert_ne!(fa, fingerprint(&intent, Some(&c)));
        assert_eq!(fa, fingerprint(&intent, Some(&a)));
    }

    #[test]
    fn digest_scheme_word_round_trips() {
        for scheme in [DigestScheme::Raw, DigestScheme::Eip191] {
            assert_eq!(DigestScheme::from_word(scheme.as_word()), scheme);
        }
        let fp = fingerprint(&sample(), None);
        assert_eq!(DigestScheme::Raw.digest(fp), fp);
        assert_ne!(DigestScheme::Eip191.digest(fp), fp);
    }
}
