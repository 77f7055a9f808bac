//! Outer-boundary classification of revert payloads.
//!
//! On-host, failures are opaque ABI-encoded revert bytes. They are only turned into a typed
//! error here, once they have left the host.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolInterface;
use intent_dispatch_types::abi::{
    IDelegatedAccount::IDelegatedAccountErrors, IDispatcher::IDispatcherErrors,
};
use thiserror::Error;

use crate::host::Revert;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("caller {caller} is not the trusted dispatcher")]
    Unauthorized { caller: Address },
    #[error("intent {index}: signature rejected (validation data {validation_data})")]
    BadSignature { index: usize, validation_data: U256 },
    #[error("intent {index}: prefund of {required} not paid (received {received})")]
    InsufficientFunds {
        index: usize,
        required: U256,
        received: U256,
    },
    #[error("intent {index}: invalid sequence {provided} (expected {expected})")]
    InvalidSequence {
        index: usize,
        expected: U256,
        provided: U256,
    },
    #[error("intent {index}: sender {sender} has no code")]
    SenderNotDeployed { index: usize, sender: Address },
    #[error("batch is empty")]
    EmptyBatch,
    #[error("dispatcher re-entered")]
    Reentrancy,
    #[error("caller {caller} is not the account controller")]
    NotController { caller: Address },
    #[error("controller cannot be the zero address")]
    ZeroController,
    #[error("execution reverted: 0x{}", hex::encode(.revert))]
    ExecutionFailure { revert: Bytes },
}

impl DispatchError {
    /// Classify a raw revert payload. Unknown payloads are kept verbatim.
    pub fn from_revert(data: &[u8]) -> Self {
        if let Ok(error) = IDispatcherErrors::abi_decode(data, true) {
            return match error {
                IDispatcherErrors::EmptyBatch(_) => Self::EmptyBatch,
                IDispatcherErrors::Reentrancy(_) => Self::Reentrancy,
                IDispatcherErrors::InvalidSequence(e) => Self::InvalidSequence {
                    index: op_index(e.opIndex),
                    expected: e.expected,
                    provided: e.provided,
                },
                IDispatcherErrors::SenderNotDeployed(e) => Self::SenderNotDeployed {
                    index: op_index(e.opIndex),
                    sender: e.sender,
                },
                IDispatcherErrors::SignatureValidationFailed(e) => Self::BadSignature {
                    index: op_index(e.opIndex),
                    validation_data: e.validationData,
                },
                IDispatcherErrors::PrefundNotPaid(e) => Self::InsufficientFunds {
                    index: op_index(e.opIndex),
                    required: e.required,
                    received: e.received,
                },
                IDispatcherErrors::MalformedValidationResult(_)
                | IDispatcherErrors::SelfCallOnly(_) => Self::execution(data),
            };
        }
        if let Ok(error) = IDelegatedAccountErrors::abi_decode(data, true) {
            return match error {
                IDelegatedAccountErrors::Unauthorized(e) => Self::Unauthorized { caller: e.caller },
                IDelegatedAccountErrors::NotController(e) => {
                    Self::NotController { caller: e.caller }
                }
                IDelegatedAccountErrors::ZeroController(_) => Self::ZeroController,
            };
        }
        Self::execution(data)
    }

    /// Raw payload for failures that were not recognised as protocol errors.
    pub fn revert_data(&self) -> Option<&Bytes> {
        match self {
            Self::ExecutionFailure { revert } => Some(revert),
            _ => None,
        }
    }

    fn execution(data: &[u8]) -> Self {
        Self::ExecutionFailure {
            revert: Bytes::copy_from_slice(data),
        }
    }
}

impl From<Revert> for DispatchError {
    fn from(revert: Revert) -> Self {
        Self::from_revert(revert.data())
    }
}

fn op_index(index: U256) -> usize {
    usize::try_from(index).unwrap_or(usize::MAX)
}
