//! Action payload encoding.
//!
//! An intent's action payload is calldata for the account's guarded dispatch entry point. These
//! helpers build the common shapes.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use intent_dispatch_types::abi::{IActionExecutor, IDelegatedAccount};

/// `execute(dest, value, func)`: the account calls `dest` as itself.
pub fn encode_execute(dest: Address, value: U256, func: impl Into<Bytes>) -> Bytes {
    IDelegatedAccount::executeCall {
        dest,
        value,
        func: func.into(),
    }
    .abi_encode()
    .into()
}

/// `executeDelegate(dest, func)`: `dest`'s code runs with the account's identity.
pub fn encode_execute_delegate(dest: Address, func: impl Into<Bytes>) -> Bytes {
    IDelegatedAccount::executeDelegateCall {
        dest,
        func: func.into(),
    }
    .abi_encode()
    .into()
}

pub fn encode_compound_action(
    resource: Address,
    sink: Address,
    amount: U256,
    beneficiary: Address,
) -> Bytes {
    IActionExecutor::performCompoundActionCall {
        resource,
        sink,
        amount,
        beneficiary,
    }
    .abi_encode()
    .into()
}

/// Full action payload for "approve `amount` of `resource` to `sink` and deposit it for
/// `beneficiary`", drawn from the account's own holdings.
pub fn compound_action_payload(
    executor: Address,
    resource: Address,
    sink: Address,
    amount: U256,
    beneficiary: Address,
) -> Bytes {
    encode_execute_delegate(executor, encode_compound_action(resource, sink, amount, beneficiary))
}
