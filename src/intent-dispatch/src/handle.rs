//! Typed Rust-side handles over deployed contracts.
//!
//! Handles are the outer boundary: they build calldata, drive the host through `transact` or
//! `static_call`, and turn revert payloads into [`DispatchError`].

use alloy_primitives::{Address, Bytes, Log, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};
use intent_dispatch_types::{
    abi::{IDelegatedAccount, IDispatcher, IResourceToken, IVault, PackedUserOperation},
    DigestScheme, FingerprintDomain, Intent,
};

use crate::{
    account::DelegatedAccount,
    assets::{ResourceToken, Vault},
    config::{DispatcherConfig, FingerprintBinding},
    dispatcher::Dispatcher,
    errors::DispatchError,
    executor::ActionExecutor,
    host::{Host, Receipt},
};

/// Read-only call decoded with `C`'s return type.
fn view<C: SolCall>(host: &mut Host, target: Address, call: &C) -> Result<C::Return, DispatchError> {
    let output = host.static_call(Address::ZERO, target, &call.abi_encode())?;
    C::abi_decode_returns(&output, true).map_err(|_| DispatchError::ExecutionFailure { revert: output })
}

fn send<C: SolCall>(
    host: &mut Host,
    from: Address,
    target: Address,
    call: &C,
) -> Result<Receipt, DispatchError> {
    Ok(host.transact(from, target, U256::ZERO, &call.abi_encode())?)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntentStatus {
    /// Raw output of the account's dispatch entry point.
    Executed { result: Bytes },
    /// Skip-and-continue only: the intent was rolled back with this payload.
    Reverted { reason: Bytes },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntentOutcome {
    pub fingerprint: B256,
    pub sender: Address,
    pub sequence: U256,
    pub status: IntentStatus,
}

impl IntentOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self.status, IntentStatus::Executed { .. })
    }

    /// Classified failure of a reverted intent.
    pub fn error(&self) -> Option<DispatchError> {
        match &self.status {
            IntentStatus::Executed { .. } => None,
            IntentStatus::Reverted { reason } => Some(DispatchError::from_revert(reason)),
        }
    }
}

/// Committed result of `process_batch`: one outcome per intent, in submission order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReceipt {
    pub outcomes: Vec<IntentOutcome>,
    pub reverted: usize,
    /// Every log the batch emitted, across all contracts.
    pub logs: Vec<Log>,
}

impl BatchReceipt {
    fn from_logs(dispatcher: Address, logs: Vec<Log>) -> Self {
        let mut outcomes = Vec::new();
        for log in logs.iter().filter(|log| log.address == dispatcher) {
            if let Ok(event) = IDispatcher::IntentExecuted::decode_log_data(&log.data, true) {
                outcomes.push(IntentOutcome {
                    fingerprint: event.fingerprint,
                    sender: event.sender,
                    sequence: event.sequence,
                    status: IntentStatus::Executed {
                        result: event.result,
                    },
                });
            } else if let Ok(event) = IDispatcher::IntentReverted::decode_log_data(&log.data, true) {
                outcomes.push(IntentOutcome {
                    fingerprint: event.fingerprint,
                    sender: event.sender,
                    sequence: event.sequence,
                    status: IntentStatus::Reverted {
                        reason: event.reason,
                    },
                });
            }
        }
        let reverted = outcomes.iter().filter(|o| !o.is_executed()).count();
        Self {
            outcomes,
            reverted,
            logs,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatcherHandle {
    address: Address,
    config: DispatcherConfig,
}

impl DispatcherHandle {
    pub fn deploy(host: &mut Host, config: DispatcherConfig) -> Self {
        let address = Dispatcher::deploy(host, config);
        Self { address, config }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Domain intents must be signed under, if fingerprints are bound.
    pub fn domain(&self, host: &Host) -> Option<FingerprintDomain> {
        match self.config.fingerprint_binding {
            FingerprintBinding::Unbound => None,
            FingerprintBinding::DispatcherAndChain => Some(FingerprintDomain {
                dispatcher: self.address,
                chain_id: host.chain_id(),
            }),
        }
    }

    /// Submit `intents` as one batch from `submitter`.
    pub fn process_batch(
        &self,
        host: &mut Host,
        submitter: Address,
        intents: &[Intent],
        beneficiary: Address,
    ) -> Result<BatchReceipt, DispatchError> {
        let call = IDispatcher::handleOpsCall {
            ops: intents.iter().map(PackedUserOperation::from).collect(),
            beneficiary,
        };
        let receipt = send(host, submitter, self.address, &call)?;
        Ok(BatchReceipt::from_logs(self.address, receipt.logs))
    }

    /// On-host fingerprint (`getUserOpHash`).
    pub fn fingerprint(&self, host: &mut Host, intent: &Intent) -> Result<B256, DispatchError> {
        let call = IDispatcher::getUserOpHashCall {
            userOp: intent.to_packed(),
        };
        Ok(view(host, self.address, &call)?._0)
    }

    /// Next acceptable sequence for `account` (`getNonce`).
    pub fn sequence(&self, host: &mut Host, account: Address) -> Result<U256, DispatchError> {
        let call = IDispatcher::getNonceCall { sender: account };
        Ok(view(host, self.address, &call)?._0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountHandle {
    address: Address,
}

impl AccountHandle {
    pub fn deploy(
        host: &mut Host,
        controller: Address,
        dispatcher: Address,
        scheme: DigestScheme,
    ) -> Result<Self, DispatchError> {
        let address = DelegatedAccount::deploy(host, controller, dispatcher, scheme)?;
        Ok(Self { address })
    }

    pub fn at(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn controller(&self, host: &mut Host) -> Result<Address, DispatchError> {
        Ok(view(host, self.address, &IDelegatedAccount::controllerCall {})?._0)
    }

    pub fn dispatcher(&self, host: &mut Host) -> Result<Address, DispatchError> {
        Ok(view(host, self.address, &IDelegatedAccount::dispatcherCall {})?._0)
    }

    pub fn set_controller(
        &self,
        host: &mut Host,
        caller: Address,
        new_controller: Address,
    ) -> Result<(), DispatchError> {
        let call = IDelegatedAccount::setControllerCall {
            newController: new_controller,
        };
        send(host, caller, self.address, &call)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenHandle {
    address: Address,
}

impl TokenHandle {
    pub fn deploy(host: &mut Host, minter: Address) -> Self {
        Self {
            address: ResourceToken::deploy(host, minter),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn mint(
        &self,
        host: &mut Host,
        minter: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), DispatchError> {
        send(host, minter, self.address, &IResourceToken::mintCall { to, amount })?;
        Ok(())
    }

    pub fn balance_of(&self, host: &mut Host, account: Address) -> Result<U256, DispatchError> {
        Ok(view(host, self.address, &IResourceToken::balanceOfCall { account })?._0)
    }

    pub fn allowance(
        &self,
        host: &mut Host,
        owner: Address,
        spender: Address,
    ) -> Result<U256, DispatchError> {
        Ok(view(host, self.address, &IResourceToken::allowanceCall { owner, spender })?._0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VaultHandle {
    address: Address,
}

impl VaultHandle {
    /// A zero `deposit_cap` means uncapped.
    pub fn deploy(host: &mut Host, asset: Address, deposit_cap: U256) -> Self {
        Self {
            address: Vault::deploy(host, asset, deposit_cap),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn shares_of(&self, host: &mut Host, owner: Address) -> Result<U256, DispatchError> {
        Ok(view(host, self.address, &IVault::balanceOfCall { owner })?._0)
    }

    pub fn total_supply(&self, host: &mut Host) -> Result<U256, DispatchError> {
        Ok(view(host, self.address, &IVault::totalSupplyCall {})?._0)
    }

    pub fn total_assets(&self, host: &mut Host) -> Result<U256, DispatchError> {
        Ok(view(host, self.address, &IVault::totalAssetsCall {})?._0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutorHandle {
    address: Address,
}

impl ExecutorHandle {
    pub fn deploy(host: &mut Host) -> Self {
        Self {
            address: ActionExecutor::deploy(host),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}
