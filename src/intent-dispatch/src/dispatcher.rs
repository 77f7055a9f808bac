//! Dispatcher: the trust root of the protocol.
//!
//! For every intent of a batch, in order:
//! 1. fingerprint it (bound to this dispatcher and chain when configured),
//! 2. check and advance the sender's sequence,
//! 3. have the sender's account validate the signature (and pay any required prefund),
//! 4. hand the action payload to the account's guarded dispatch entry point,
//! 5. emit `IntentExecuted`.
//!
//! Under `FailFast` any failure reverts the whole batch with the failing payload. Under
//! `SkipAndContinue` each intent runs in its own self-call frame (`innerHandleOp`), so a failure
//! only rolls back that intent and is reported with `IntentReverted`.
//!
//! Storage layout:
//! - slot 0: `mapping(address => uint256)` sequence per sender
//! - slot 1: reentrancy lock

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolEvent, SolInterface};
use intent_dispatch_types::{
    abi::{
        IDelegatedAccount,
        IDispatcher::{self, IDispatcherCalls},
        PackedUserOperation,
    },
    fingerprint, FingerprintDomain, Intent,
};

use crate::{
    config::{BatchFailurePolicy, DispatcherConfig, FingerprintBinding},
    constants::{DISPATCHER_LOCK_SLOT, DISPATCHER_SEQUENCES_SLOT, SIG_VALIDATION_SUCCESS},
    host::{storage::address_slot, Contract, Frame, Host, Revert},
};

#[derive(Debug, Default)]
pub struct Dispatcher {
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self { config }
    }

    pub fn deploy(host: &mut Host, config: DispatcherConfig) -> Address {
        let address = host.deploy(Arc::new(Self::new(config)));
        tracing::debug!(dispatcher = %address, ?config, "dispatcher deployed");
        address
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    fn domain(&self, host: &Host, dispatcher: Address) -> Option<FingerprintDomain> {
        match self.config.fingerprint_binding {
            FingerprintBinding::Unbound => None,
            FingerprintBinding::DispatcherAndChain => Some(FingerprintDomain {
                dispatcher,
                chain_id: host.chain_id(),
            }),
        }
    }

    fn fingerprint_of(&self, host: &Host, dispatcher: Address, op: &PackedUserOperation) -> B256 {
        let intent = Intent::from(op.clone());
        fingerprint(&intent, self.domain(host, dispatcher).as_ref())
    }

    fn advance_sequence(
        &self,
        host: &mut Host,
        dispatcher: Address,
        op: &PackedUserOperation,
        index: usize,
    ) -> Result<(), Revert> {
        let slot = address_slot(op.sender, DISPATCHER_SEQUENCES_SLOT);
        let stored = host.sload(dispatcher, slot);
        let next = op.nonce.checked_add(U256::from(1u64));
        let next = match next {
            Some(next) if self.config.sequence_policy.accepts(stored, op.nonce) => next,
            _ => {
                return Err(Revert::from_error(IDispatcher::InvalidSequence {
                    opIndex: U256::from(index),
                    expected: stored,
                    provided: op.nonce,
                }))
            }
        };
        host.sstore(dispatcher, slot, next);
        Ok(())
    }

    fn validate(
        &self,
        host: &mut Host,
        dispatcher: Address,
        op: &PackedUserOperation,
        fingerprint: B256,
        index: usize,
    ) -> Result<(), Revert> {
        if !host.has_code(op.sender) {
            return Err(Revert::from_error(IDispatcher::SenderNotDeployed {
                opIndex: U256::from(index),
                sender: op.sender,
            }));
        }

        let required = self.config.required_prefund;
        let before = host.balance(dispatcher);
        let call = IDelegatedAccount::validateUserOpCall {
            userOp: op.clone(),
            userOpHash: fingerprint,
            missingAccountFunds: required,
        };
        let output = host.call(dispatcher, op.sender, U256::ZERO, &call.abi_encode())?;
        let validation_data = IDelegatedAccount::validateUserOpCall::abi_decode_returns(&output, true)
            .map_err(|_| {
                Revert::from_error(IDispatcher::MalformedValidationResult {
                    opIndex: U256::from(index),
                })
            })?
            .validationData;

        if validation_data != SIG_VALIDATION_SUCCESS {
            return Err(Revert::from_error(IDispatcher::SignatureValidationFailed {
                opIndex: U256::from(index),
                validationData: validation_data,
            }));
        }

        if !required.is_zero() {
            let received = host.balance(dispatcher).saturating_sub(before);
            if received < required {
                return Err(Revert::from_error(IDispatcher::PrefundNotPaid {
                    opIndex: U256::from(index),
                    required,
                    received,
                }));
            }
        }
        Ok(())
    }

    /// Steps 2-5 for one intent. Returns the raw output of the action.
    fn run_intent(
        &self,
        host: &mut Host,
        dispatcher: Address,
        op: &PackedUserOperation,
        fingerprint: B256,
        index: usize,
        advance_sequence: bool,
    ) -> Result<Bytes, Revert> {
        if advance_sequence {
            self.advance_sequence(host, dispatcher, op, index)?;
        }
        self.validate(host, dispatcher, op, fingerprint, index)?;

        // An empty action payload only consumes the sequence.
        let result = if op.callData.is_empty() {
            Bytes::new()
        } else {
            host.call(dispatcher, op.sender, U256::ZERO, &op.callData)?
        };

        let event = IDispatcher::IntentExecuted {
            fingerprint,
            sender: op.sender,
            sequence: op.nonce,
            result: result.clone(),
        };
        host.emit(dispatcher, event.encode_log_data());
        tracing::debug!(index, %fingerprint, sender = %op.sender, sequence = %op.nonce, "intent executed");
        Ok(result)
    }

    fn handle_ops(
        &self,
        host: &mut Host,
        frame: &Frame,
        ops: Vec<PackedUserOperation>,
        beneficiary: Address,
    ) -> Result<(), Revert> {
        let dispatcher = frame.address;
        if ops.is_empty() {
            return Err(Revert::from_error(IDispatcher::EmptyBatch {}));
        }
        if !host.sload(dispatcher, DISPATCHER_LOCK_SLOT).is_zero() {
            return Err(Revert::from_error(IDispatcher::Reentrancy {}));
        }
        host.sstore(dispatcher, DISPATCHER_LOCK_SLOT, U256::from(1u64));

        let mut reverted = 0usize;
        for (index, op) in ops.iter().enumerate() {
            let fingerprint = self.fingerprint_of(host, dispatcher, op);
            match self.config.batch_failure_policy {
                BatchFailurePolicy::FailFast => {
                    if let Err(revert) = self.run_intent(host, dispatcher, op, fingerprint, index, true) {
                        tracing::warn!(index, %fingerprint, sender = %op.sender, %revert, "intent failed, reverting batch");
                        return Err(revert);
                    }
                }
                BatchFailurePolicy::SkipAndContinue => {
                    if let Err(revert) = self.run_isolated(host, dispatcher, op, fingerprint, index) {
                        tracing::warn!(index, %fingerprint, sender = %op.sender, %revert, "intent reverted, continuing");
                        let event = IDispatcher::IntentReverted {
                            fingerprint,
                            sender: op.sender,
                            sequence: op.nonce,
                            reason: revert.into_data(),
                        };
                        host.emit(dispatcher, event.encode_log_data());
                        reverted += 1;
                    }
                }
            }
        }

        host.sstore(dispatcher, DISPATCHER_LOCK_SLOT, U256::ZERO);
        let event = IDispatcher::BatchProcessed {
            beneficiary,
            intents: U256::from(ops.len()),
            reverted: U256::from(reverted),
        };
        host.emit(dispatcher, event.encode_log_data());
        tracing::info!(%dispatcher, %beneficiary, intents = ops.len(), reverted, "batch processed");
        Ok(())
    }

    /// Runs one intent in its own frame. With `consume_sequence_on_failure` the sequence is
    /// advanced outside that frame, so it stays consumed when the intent fails.
    fn run_isolated(
        &self,
        host: &mut Host,
        dispatcher: Address,
        op: &PackedUserOperation,
        fingerprint: B256,
        index: usize,
    ) -> Result<(), Revert> {
        if self.config.consume_sequence_on_failure {
            self.advance_sequence(host, dispatcher, op, index)?;
        }
        let inner = IDispatcher::innerHandleOpCall {
            op: op.clone(),
            fingerprint,
            opIndex: U256::from(index),
        };
        host.call(dispatcher, dispatcher, U256::ZERO, &inner.abi_encode())?;
        Ok(())
    }
}

impl Contract for Dispatcher {
    fn call(&self, host: &mut Host, frame: &Frame, input: &[u8]) -> Result<Bytes, Revert> {
        // Plain value receipt (prefunds).
        if input.is_empty() {
            return Ok(Bytes::new());
        }
        let call =
            IDispatcherCalls::abi_decode(input, true).map_err(|_| Revert::unknown_selector(input))?;

        let output = match call {
            IDispatcherCalls::handleOps(c) => {
                self.handle_ops(host, frame, c.ops, c.beneficiary)?;
                IDispatcher::handleOpsCall::abi_encode_returns(&())
            }
            IDispatcherCalls::innerHandleOp(c) => {
                if frame.caller != frame.address {
                    return Err(Revert::from_error(IDispatcher::SelfCallOnly {
                        caller: frame.caller,
                    }));
                }
                let index = usize::try_from(c.opIndex).unwrap_or(usize::MAX);
                let advance = !self.config.consume_sequence_on_failure;
                let result = self.run_intent(host, frame.address, &c.op, c.fingerprint, index, advance)?;
                IDispatcher::innerHandleOpCall::abi_encode_returns(&(result,))
            }
            IDispatcherCalls::getUserOpHash(c) => {
                let fingerprint = self.fingerprint_of(host, frame.address, &c.userOp);
                IDispatcher::getUserOpHashCall::abi_encode_returns(&(fingerprint,))
            }
            IDispatcherCalls::getNonce(c) => {
                let slot = address_slot(c.sender, DISPATCHER_SEQUENCES_SLOT);
                let sequence = host.sload(frame.address, slot);
                IDispatcher::getNonceCall::abi_encode_returns(&(sequence,))
            }
        };
        Ok(output.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_ops(host: &mut Host, dispatcher: Address, ops: Vec<PackedUserOperation>) -> Result<(), Revert> {
        let call = IDispatcher::handleOpsCall {
            ops,
            beneficiary: Address::repeat_byte(0xbe),
        };
        host.transact(Address::repeat_byte(0x5b), dispatcher, U256::ZERO, &call.abi_encode())?;
        Ok(())
    }

    #[test]
    fn empty_batch_is_rejected() {
        let mut host = Host::default();
        let dispatcher = Dispatcher::deploy(&mut host, DispatcherConfig::default());
        let err = handle_ops(&mut host, dispatcher, vec![]).unwrap_err();
        assert_eq!(err, Revert::from_error(IDispatcher::EmptyBatch {}));
    }

    #[test]
    fn undeployed_sender_fails_after_sequence_check() {
        let mut host = Host::default();
        let dispatcher = Dispatcher::deploy(&mut host, DispatcherConfig::default());
        let sender = Address::repeat_byte(0x77);
        let op = PackedUserOperation {
            sender,
            ..Default::default()
        };
        let err = handle_ops(&mut host, dispatcher, vec![op]).unwrap_err();
        assert_eq!(
            err,
            Revert::from_error(IDispatcher::SenderNotDeployed {
                opIndex: U256::ZERO,
                sender,
            })
        );

        let query = IDispatcher::getNonceCall { sender }.abi_encode();
        let output = host.static_call(sender, dispatcher, &query).unwrap();
        let nonce = IDispatcher::getNonceCall::abi_decode_returns(&output, true).unwrap()._0;
        assert_eq!(nonce, U256::ZERO);
    }

    #[test]
    fn inner_handle_op_is_self_only() {
        let mut host = Host::default();
        let dispatcher = Dispatcher::deploy(&mut host, DispatcherConfig::default());
        let outsider = Address::repeat_byte(0x0e);
        let call = IDispatcher::innerHandleOpCall {
            op: PackedUserOperation::default(),
            fingerprint: B256::ZERO,
            opIndex: U256::ZERO,
        };
        let err = host
            .transact(outsider, dispatcher, U256::ZERO, &call.abi_encode())
            .unwrap_err();
        assert_eq!(err, Revert::from_error(IDispatcher::SelfCallOnly { caller: outsider }));
    }

    #[test]
    fn user_op_hash_follows_binding() {
        let mut host = Host::new(31337);
        let unbound = Dispatcher::deploy(&mut host, DispatcherConfig::default());
        let bound = Dispatcher::deploy(
            &mut host,
            DispatcherConfig {
                fingerprint_binding: FingerprintBinding::DispatcherAndChain,
                ..Default::default()
            },
        );
        let intent = Intent::new(Address::repeat_byte(1), U256::from(4u64), vec![0xab]);
        let query = IDispatcher::getUserOpHashCall {
            userOp: intent.to_packed(),
        }
        .abi_encode();

        let hash_of = |host: &mut Host, dispatcher| {
            let output = host.static_call(Address::ZERO, dispatcher, &query).unwrap();
            IDispatcher::getUserOpHashCall::abi_decode_returns(&output, true).unwrap()._0
        };
        assert_eq!(hash_of(&mut host, unbound), fingerprint(&intent, None));
        let domain = FingerprintDomain {
            dispatcher: bound,
            chain_id: 31337,
        };
        assert_eq!(hash_of(&mut host, bound), fingerprint(&intent, Some(&domain)));
    }
}
