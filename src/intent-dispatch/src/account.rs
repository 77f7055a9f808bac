//! Delegated account.
//!
//! Holds one controller identity and one trusted dispatcher. The dispatcher is the only caller
//! allowed into the validation and dispatch entry points; validation reports a bad signature as
//! a return code rather than a revert, so the dispatcher decides what a rejection means.
//!
//! Storage layout:
//! - slot 0: controller
//! - slot 1: dispatcher
//! - slot 2: digest scheme

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolEvent, SolInterface};
use intent_dispatch_types::{
    abi::{
        IDelegatedAccount::{self, IDelegatedAccountCalls},
        PackedUserOperation,
    },
    DigestScheme,
};

use crate::{
    constants::{
        ACCOUNT_CONTROLLER_SLOT, ACCOUNT_DISPATCHER_SLOT, ACCOUNT_SCHEME_SLOT,
        SIG_VALIDATION_FAILED, SIG_VALIDATION_SUCCESS,
    },
    crypto::recover_signer,
    host::{
        storage::{load_address, store_address},
        Contract, Frame, Host, Revert,
    },
};

#[derive(Debug, Default)]
pub struct DelegatedAccount;

impl DelegatedAccount {
    /// Deploy an account for `controller` that trusts `dispatcher`.
    pub fn deploy(
        host: &mut Host,
        controller: Address,
        dispatcher: Address,
        scheme: DigestScheme,
    ) -> Result<Address, Revert> {
        if controller.is_zero() {
            return Err(Revert::from_error(IDelegatedAccount::ZeroController {}));
        }
        let address = host.deploy(Arc::new(DelegatedAccount));
        store_address(host, address, ACCOUNT_CONTROLLER_SLOT, controller);
        store_address(host, address, ACCOUNT_DISPATCHER_SLOT, dispatcher);
        host.sstore(address, ACCOUNT_SCHEME_SLOT, scheme.as_word());
        tracing::debug!(account = %address, %controller, %dispatcher, ?scheme, "account deployed");
        Ok(address)
    }

    fn only_dispatcher(host: &Host, frame: &Frame) -> Result<(), Revert> {
        let dispatcher = load_address(host, frame.address, ACCOUNT_DISPATCHER_SLOT);
        if frame.caller != dispatcher {
            return Err(Revert::from_error(IDelegatedAccount::Unauthorized {
                caller: frame.caller,
            }));
        }
        Ok(())
    }

    /// `SIG_VALIDATION_SUCCESS` iff the signature over `fingerprint` recovers to the controller.
    fn check_signature(
        host: &Host,
        account: Address,
        op: &PackedUserOperation,
        fingerprint: B256,
    ) -> U256 {
        let controller = load_address(host, account, ACCOUNT_CONTROLLER_SLOT);
        let scheme = DigestScheme::from_word(host.sload(account, ACCOUNT_SCHEME_SLOT));
        let digest = scheme.digest(fingerprint);

        match recover_signer(digest, &op.signature) {
            Ok(signer) if signer == controller => SIG_VALIDATION_SUCCESS,
            Ok(signer) => {
                tracing::debug!(%account, %signer, %controller, "signer is not the controller");
                SIG_VALIDATION_FAILED
            }
            Err(error) => {
                tracing::debug!(%account, %error, "signature rejected");
                SIG_VALIDATION_FAILED
            }
        }
    }

    fn validate_user_op(
        host: &mut Host,
        frame: &Frame,
        call: IDelegatedAccount::validateUserOpCall,
    ) -> U256 {
        let validation_data = Self::check_signature(host, frame.address, &call.userOp, call.userOpHash);

        if !call.missingAccountFunds.is_zero() {
            // Best effort: the dispatcher checks what actually arrived.
            let sent = host.call(frame.address, frame.caller, call.missingAccountFunds, &[]);
            if let Err(revert) = sent {
                tracing::debug!(account = %frame.address, %revert, "prefund transfer failed");
            }
        }
        validation_data
    }

    fn set_controller(host: &mut Host, frame: &Frame, new_controller: Address) -> Result<(), Revert> {
        let previous = load_address(host, frame.address, ACCOUNT_CONTROLLER_SLOT);
        // The account itself may rotate through an intent the controller signed.
        if frame.caller != previous && frame.caller != frame.address {
            return Err(Revert::from_error(IDelegatedAccount::NotController {
                caller: frame.caller,
            }));
        }
        if new_controller.is_zero() {
            return Err(Revert::from_error(IDelegatedAccount::ZeroController {}));
        }
        store_address(host, frame.address, ACCOUNT_CONTROLLER_SLOT, new_controller);

        let event = IDelegatedAccount::ControllerChanged {
            previous,
            current: new_controller,
        };
        host.emit(frame.address, event.encode_log_data());
        tracing::info!(account = %frame.address, %previous, current = %new_controller, "controller rotated");
        Ok(())
    }
}

impl Contract for DelegatedAccount {
    fn call(&self, host: &mut Host, frame: &Frame, input: &[u8]) -> Result<Bytes, Revert> {
        // Plain value receipt.
        if input.is_empty() {
            return Ok(Bytes::new());
        }
        let call = IDelegatedAccountCalls::abi_decode(input, true)
            .map_err(|_| Revert::unknown_selector(input))?;

        match call {
            IDelegatedAccountCalls::validateUserOp(c) => {
                Self::only_dispatcher(host, frame)?;
                let validation_data = Self::validate_user_op(host, frame, c);
                Ok(IDelegatedAccount::validateUserOpCall::abi_encode_returns(&(validation_data,)).into())
            }
            // Guarded dispatch: the sub-call's output and revert payload pass through untouched.
            IDelegatedAccountCalls::execute(c) => {
                Self::only_dispatcher(host, frame)?;
                host.call(frame.address, c.dest, c.value, &c.func)
            }
            IDelegatedAccountCalls::executeDelegate(c) => {
                Self::only_dispatcher(host, frame)?;
                host.delegate_call(frame, c.dest, &c.func)
            }
            IDelegatedAccountCalls::setController(c) => {
                Self::set_controller(host, frame, c.newController)?;
                Ok(Bytes::new())
            }
            IDelegatedAccountCalls::controller(_) => {
                let controller = load_address(host, frame.address, ACCOUNT_CONTROLLER_SLOT);
                Ok(IDelegatedAccount::controllerCall::abi_encode_returns(&(controller,)).into())
            }
            IDelegatedAccountCalls::dispatcher(_) => {
                let dispatcher = load_address(host, frame.address, ACCOUNT_DISPATCHER_SLOT);
                Ok(IDelegatedAccount::dispatcherCall::abi_encode_returns(&(dispatcher,)).into())
            }
        }
    }
}
