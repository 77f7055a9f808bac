//! Dispatcher configuration.
//!
//! Every field has a default, so a partial (or empty) JSON object is a valid config.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// How a provided sequence is checked against the stored counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencePolicy {
    /// Provided must be at least the stored counter; gaps are allowed.
    #[default]
    Monotonic,
    /// Provided must equal the stored counter.
    Strict,
}

impl SequencePolicy {
    pub fn accepts(self, stored: U256, provided: U256) -> bool {
        match self {
            SequencePolicy::Monotonic => provided >= stored,
            SequencePolicy::Strict => provided == stored,
        }
    }
}

/// What a failing intent does to the rest of its batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchFailurePolicy {
    /// The first failure reverts the whole batch.
    #[default]
    FailFast,
    /// A failing intent is rolled back on its own and reported; the batch continues.
    SkipAndContinue,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintBinding {
    #[default]
    Unbound,
    /// Bind fingerprints to the dispatcher address and the host chain id.
    DispatcherAndChain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DispatcherConfig {
    pub sequence_policy: SequencePolicy,
    pub batch_failure_policy: BatchFailurePolicy,
    /// Skip-and-continue only: a failed intent still burns its sequence value.
    pub consume_sequence_on_failure: bool,
    pub fingerprint_binding: FingerprintBinding,
    /// Funds each account must push to the dispatcher during validation.
    pub required_prefund: U256,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            sequence_policy: SequencePolicy::default(),
            batch_failure_policy: BatchFailurePolicy::default(),
            consume_sequence_on_failure: true,
            fingerprint_binding: FingerprintBinding::default(),
            required_prefund: U256::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config: DispatcherConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DispatcherConfig::default());
        assert!(config.consume_sequence_on_failure);
    }

    #[test]
    fn snake_case_fields_and_variants() {
        let config: DispatcherConfig = serde_json::from_str(
            r#"{
                "sequence_policy": "strict",
                "batch_failure_policy": "skip_and_continue",
                "consume_sequence_on_failure": false,
                "fingerprint_binding": "dispatcher_and_chain",
                "required_prefund": "0x64"
            }"#,
        )
        .unwrap();
        assert_eq!(config.sequence_policy, SequencePolicy::Strict);
        assert_eq!(config.batch_failure_policy, BatchFailurePolicy::SkipAndContinue);
        assert!(!config.consume_sequence_on_failure);
        assert_eq!(config.fingerprint_binding, FingerprintBinding::DispatcherAndChain);
        assert_eq!(config.required_prefund, U256::from(100u64));
    }

    #[test]
    fn sequence_policies() {
        let five = U256::from(5u64);
        let six = U256::from(6u64);
        assert!(SequencePolicy::Monotonic.accepts(five, six));
        assert!(SequencePolicy::Monotonic.accepts(five, five));
        assert!(!SequencePolicy::Monotonic.accepts(six, five));
        assert!(SequencePolicy::Strict.accepts(five, five));
        assert!(!SequencePolicy::Strict.accepts(five, six));
    }
}
