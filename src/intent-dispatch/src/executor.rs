//! Compound action: grant an allowance on a resource, then spend it against a receiving pool.
//!
//! The executor knows nothing about authorization. It acts as whatever identity runs it; when an
//! account reaches it through `executeDelegate`, that identity is the account, so both the
//! allowance and the deposit are drawn from the account's own holdings.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolInterface};
use intent_dispatch_types::abi::{
    IActionExecutor::{self, IActionExecutorCalls},
    IResourceToken, IVault,
};

use crate::host::{Contract, Frame, Host, Revert};

#[derive(Debug, Default)]
pub struct ActionExecutor;

impl ActionExecutor {
    pub fn deploy(host: &mut Host) -> Address {
        host.deploy(Arc::new(ActionExecutor))
    }

    fn perform_compound_action(
        host: &mut Host,
        actor: Address,
        resource: Address,
        sink: Address,
        amount: U256,
        beneficiary: Address,
    ) -> Result<U256, Revert> {
        let approve = IResourceToken::approveCall {
            spender: sink,
            amount,
        };
        let output = host.call(actor, resource, U256::ZERO, &approve.abi_encode())?;
        let approved = IResourceToken::approveCall::abi_decode_returns(&output, true)
            .map(|r| r._0)
            .unwrap_or(false);
        if !approved {
            return Err(Revert::from_error(IActionExecutor::ApproveRejected {
                resource,
                sink,
                amount,
            }));
        }

        // A failure here unwinds the approval with the rest of this frame.
        let deposit = IVault::depositCall {
            assets: amount,
            receiver: beneficiary,
        };
        let output = host.call(actor, sink, U256::ZERO, &deposit.abi_encode())?;
        IVault::depositCall::abi_decode_returns(&output, true)
            .map(|r| r.shares)
            .map_err(|_| Revert::empty())
    }
}

impl Contract for ActionExecutor {
    fn call(&self, host: &mut Host, frame: &Frame, input: &[u8]) -> Result<Bytes, Revert> {
        let call = IActionExecutorCalls::abi_decode(input, true)
            .map_err(|_| Revert::unknown_selector(input))?;

        match call {
            IActionExecutorCalls::performCompoundAction(c) => {
                let quantity = Self::perform_compound_action(
                    host,
                    frame.address,
                    c.resource,
                    c.sink,
                    c.amount,
                    c.beneficiary,
                )?;
                tracing::debug!(
                    actor = %frame.address,
                    resource = %c.resource,
                    sink = %c.sink,
                    %quantity,
                    "compound action performed"
                );
                Ok(IActionExecutor::performCompoundActionCall::abi_encode_returns(&(quantity,)).into())
            }
        }
    }
}
