mod common;

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolError};
use common::{u, Fixture, INITIAL_BALANCE};
use eyre::Result;
use intent_dispatch::{
    types::{
        abi::{IDispatcher, IVault, PackedUserOperation},
        DigestScheme,
    },
    host::MAX_CALL_DEPTH,
    BatchFailurePolicy, Contract, DispatchError, DispatcherConfig, Frame, Host, IntentStatus,
    Revert,
};
use intent_signer::{encode_execute, encode_execute_delegate};

/// Reverts with whatever calldata it receives.
struct Echo;

impl Contract for Echo {
    fn call(&self, _host: &mut Host, _frame: &Frame, input: &[u8]) -> Result<Bytes, Revert> {
        Err(Revert::new(input.to_vec()))
    }
}

/// Calls back into the dispatcher address given as calldata.
struct Reenter;

impl Contract for Reenter {
    fn call(&self, host: &mut Host, frame: &Frame, input: &[u8]) -> Result<Bytes, Revert> {
        let dispatcher = Address::from_slice(&input[..20]);
        let call = IDispatcher::handleOpsCall {
            ops: vec![PackedUserOperation::default()],
            beneficiary: frame.address,
        };
        host.call(frame.address, dispatcher, U256::ZERO, &call.abi_encode())
    }
}

fn capped(policy: BatchFailurePolicy) -> Result<Fixture> {
    let config = DispatcherConfig {
        batch_failure_policy: policy,
        ..Default::default()
    };
    Fixture::build(config, u(5), DigestScheme::Raw)
}

#[test]
fn failing_deposit_leaves_no_allowance_behind() -> Result<()> {
    let mut f = capped(BatchFailurePolicy::FailFast)?;
    let intent = f.signed(0, f.compound(10))?;

    let err = f.submit(&[intent]).unwrap_err();

    let expected = IVault::DepositCapExceeded {
        cap: u(5),
        requested: u(10),
    }
    .abi_encode();
    assert_eq!(err.revert_data().map(|b| b.to_vec()), Some(expected));
    assert_eq!(f.vault_allowance()?, U256::ZERO);
    assert_eq!(f.resource_balance()?, u(INITIAL_BALANCE));
    assert_eq!(f.sequence()?, U256::ZERO);
    Ok(())
}

#[test]
fn skipped_intent_is_rolled_back_alone() -> Result<()> {
    let mut f = capped(BatchFailurePolicy::SkipAndContinue)?;
    let too_big = f.signed(0, f.compound(10))?;
    let fits = f.signed(1, f.compound(5))?;

    let receipt = f.submit(&[too_big, fits])?;

    let expected = IVault::DepositCapExceeded {
        cap: u(5),
        requested: u(10),
    }
    .abi_encode();
    assert_eq!(
        receipt.outcomes[0].status,
        IntentStatus::Reverted {
            reason: expected.into()
        }
    );
    assert!(receipt.outcomes[1].is_executed());
    assert_eq!(f.vault_allowance()?, U256::ZERO);
    assert_eq!(f.shares()?, u(5));
    assert_eq!(f.resource_balance()?, u(INITIAL_BALANCE - 5));
    assert_eq!(f.sequence()?, u(2));
    Ok(())
}

#[test]
fn execution_revert_payload_arrives_byte_for_byte() -> Result<()> {
    let mut f = Fixture::new(DispatcherConfig::default())?;
    let echo = f.host.deploy(Arc::new(Echo));
    let payload = vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x01, 0x02];

    let intent = f.signed(0, encode_execute(echo, U256::ZERO, payload.clone()))?;
    let err = f.submit(&[intent]).unwrap_err();

    assert_eq!(
        err,
        DispatchError::ExecutionFailure {
            revert: payload.into()
        }
    );
    Ok(())
}

#[test]
fn empty_revert_payload_is_preserved() -> Result<()> {
    let mut f = Fixture::new(DispatcherConfig::default())?;
    let echo = f.host.deploy(Arc::new(Echo));

    let intent = f.signed(0, encode_execute(echo, U256::ZERO, Bytes::new()))?;
    let err = f.submit(&[intent]).unwrap_err();

    assert_eq!(err.revert_data().map(|b| b.len()), Some(0));
    Ok(())
}

#[test]
fn reentering_the_dispatcher_is_rejected() -> Result<()> {
    let mut f = Fixture::new(DispatcherConfig::default())?;
    let reenter = f.host.deploy(Arc::new(Reenter));
    let calldata = f.dispatcher.address().to_vec();

    let intent = f.signed(0, encode_execute(reenter, U256::ZERO, calldata))?;
    let err = f.submit(&[intent]).unwrap_err();

    assert_eq!(err, DispatchError::Reentrancy);
    assert_eq!(
        err,
        DispatchError::from_revert(&IDispatcher::Reentrancy {}.abi_encode())
    );
    Ok(())
}

/// `executeDelegate(account, executeDelegate(account, ...))`, `levels` deep, around an empty call.
fn self_delegation(account: Address, levels: usize) -> Bytes {
    (0..levels).fold(Bytes::new(), |inner, _| encode_execute_delegate(account, inner))
}

#[test]
fn shallow_self_delegation_executes() -> Result<()> {
    let mut f = Fixture::new(DispatcherConfig::default())?;
    let intent = f.signed(0, self_delegation(f.account.address(), 8))?;

    let receipt = f.submit(&[intent])?;

    assert!(receipt.outcomes[0].is_executed());
    assert_eq!(f.sequence()?, u(1));
    Ok(())
}

#[test]
fn self_delegation_past_the_depth_limit_reverts_cleanly() -> Result<()> {
    let mut f = Fixture::new(DispatcherConfig::default())?;
    let intent = f.signed(0, self_delegation(f.account.address(), MAX_CALL_DEPTH))?;

    let err = f.submit(&[intent]).unwrap_err();

    assert_eq!(err, DispatchError::ExecutionFailure { revert: Bytes::new() });
    assert_eq!(f.sequence()?, U256::ZERO);
    assert_eq!(f.resource_balance()?, u(INITIAL_BALANCE));
    Ok(())
}
