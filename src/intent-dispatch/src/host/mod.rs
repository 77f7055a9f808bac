//! Serialised execution host.
//!
//! The host owns every piece of mutable state the protocol touches: contract code, keccak-slotted
//! storage, native balances and emitted logs. Contracts never hold state of their own; they read
//! and write through the host, which journals each mutation. A call frame that fails is unwound
//! to the checkpoint taken when it was entered, so a revert anywhere below a frame erases every
//! effect that frame (and its children) produced.
//!
//! Everything is driven through `&mut Host`, so there is exactly one writer at a time.

mod journal;
pub mod storage;

use std::{collections::HashMap, fmt, sync::Arc};

use alloy_primitives::{keccak256, Address, Bytes, Log, LogData, B256, U256};
use alloy_sol_types::{SolError, SolValue};
use intent_dispatch_types::abi::UnknownSelector;

use journal::{Checkpoint, Journal, JournalEntry};

/// Call depth limit.
///
/// Every frame is a native stack frame of the calling thread, so the limit has to fit a default
/// 2 MiB thread stack in unoptimised builds.
pub const MAX_CALL_DEPTH: usize = 128;

pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Identity used to derive contract addresses.
const DEPLOYER: Address = Address::new([
    0x4e, 0x59, 0xb4, 0x48, 0x47, 0xb3, 0x79, 0x57, 0x85, 0x88, 0x92, 0x0c, 0xa7, 0x8f, 0xbf, 0x26,
    0xc0, 0xb4, 0x95, 0x6c,
]);

/// Executable code deployed at an address.
pub trait Contract: Send + Sync {
    /// Handle one call. Returning `Err` reverts the frame with the given payload.
    fn call(&self, host: &mut Host, frame: &Frame, input: &[u8]) -> Result<Bytes, Revert>;
}

/// Execution context of a running call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Identity (and storage) the code acts as. Differs from `code_address` under delegate call.
    pub address: Address,
    /// Where the running code was loaded from.
    pub code_address: Address,
    /// `msg.sender`.
    pub caller: Address,
    /// `msg.value`.
    pub value: U256,
}

/// Opaque revert payload.
///
/// Contracts revert with ABI-encoded custom errors; the payload is carried verbatim through
/// every frame it crosses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Revert(Bytes);

impl Revert {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    /// Revert with no data (failed value transfer, depth exhaustion).
    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    pub fn from_error<E: SolError>(error: E) -> Self {
        Self(error.abi_encode().into())
    }

    /// Solidity `Error(string)` revert.
    pub fn reason(reason: impl Into<String>) -> Self {
        Self::from_error(alloy_sol_types::Revert {
            reason: reason.into(),
        })
    }

    /// Calldata that matches no entry point of the called contract.
    pub fn unknown_selector(input: &[u8]) -> Self {
        let mut selector = [0u8; 4];
        let len = input.len().min(4);
        selector[..len].copy_from_slice(&input[..len]);
        Self::from_error(UnknownSelector {
            selector: selector.into(),
        })
    }

    pub fn data(&self) -> &Bytes {
        &self.0
    }

    pub fn into_data(self) -> Bytes {
        self.0
    }

    pub fn selector(&self) -> Option<[u8; 4]> {
        let head = self.0.get(0..4)?;
        let mut selector = [0u8; 4];
        selector.copy_from_slice(head);
        Some(selector)
    }
}

impl fmt::Display for Revert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("revert without data")
        } else {
            write!(f, "revert 0x{}", hex::encode(&self.0))
        }
    }
}

/// Outcome of a committed top-level transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Receipt {
    pub output: Bytes,
    pub logs: Vec<Log>,
}

pub struct Host {
    chain_id: u64,
    code: HashMap<Address, Arc<dyn Contract>>,
    storage: HashMap<(Address, B256), U256>,
    balances: HashMap<Address, U256>,
    journal: Journal,
    logs: Vec<Log>,
    depth: usize,
    deploy_nonce: u64,
}

impl Default for Host {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_ID)
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("chain_id", &self.chain_id)
            .field("contracts", &self.code.len())
            .field("storage_slots", &self.storage.len())
            .field("depth", &self.depth)
            .finish()
    }
}

impl Host {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            code: HashMap::new(),
            storage: HashMap::new(),
            balances: HashMap::new(),
            journal: Journal::default(),
            logs: Vec::new(),
            depth: 0,
            deploy_nonce: 0,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Install code at a fresh deterministic address.
    pub fn deploy(&mut self, code: Arc<dyn Contract>) -> Address {
        let digest = keccak256((DEPLOYER, U256::from(self.deploy_nonce)).abi_encode());
        let address = Address::from_slice(&digest[12..]);
        self.deploy_nonce += 1;
        self.code.insert(address, code);
        tracing::trace!(%address, "contract deployed");
        address
    }

    pub fn has_code(&self, address: Address) -> bool {
        self.code.contains_key(&address)
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.balances.get(&address).copied().unwrap_or_default()
    }

    /// Set a native balance. Outside any frame the write is final and not journaled.
    pub fn set_balance(&mut self, address: Address, amount: U256) {
        if self.depth == 0 {
            self.write_balance(address, amount);
        } else {
            self.journaled_balance(address, amount);
        }
    }

    fn journaled_balance(&mut self, address: Address, amount: U256) {
        let previous = self.balance(address);
        self.journal.push(JournalEntry::Balance { address, previous });
        self.write_balance(address, amount);
    }

    pub fn sload(&self, address: Address, slot: B256) -> U256 {
        self.storage.get(&(address, slot)).copied().unwrap_or_default()
    }

    pub fn sstore(&mut self, address: Address, slot: B256, value: U256) {
        let previous = self.sload(address, slot);
        if previous == value {
            return;
        }
        self.journal.push(JournalEntry::Storage {
            address,
            slot,
            previous,
        });
        self.write_slot(address, slot, value);
    }

    pub fn emit(&mut self, address: Address, data: LogData) {
        self.logs.push(Log { address, data });
    }

    /// Message call: moves `value` from `caller` to `target`, then runs `target`'s code (if any).
    pub fn call(
        &mut self,
        caller: Address,
        target: Address,
        value: U256,
        input: &[u8],
    ) -> Result<Bytes, Revert> {
        let frame = Frame {
            address: target,
            code_address: target,
            caller,
            value,
        };
        self.enter(frame, input, true)
    }

    /// Run `code_address`'s code as the current frame: same identity, storage, caller and value.
    pub fn delegate_call(
        &mut self,
        frame: &Frame,
        code_address: Address,
        input: &[u8],
    ) -> Result<Bytes, Revert> {
        let frame = Frame {
            code_address,
            ..*frame
        };
        self.enter(frame, input, false)
    }

    /// Call for its output only; every effect is discarded.
    pub fn static_call(
        &mut self,
        caller: Address,
        target: Address,
        input: &[u8],
    ) -> Result<Bytes, Revert> {
        let checkpoint = self.checkpoint();
        let result = self.call(caller, target, U256::ZERO, input);
        self.revert_to(checkpoint);
        result
    }

    /// Top-level unit of work: either every effect commits or none does.
    pub fn transact(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
        input: &[u8],
    ) -> Result<Receipt, Revert> {
        let checkpoint = self.checkpoint();
        let output = self.call(from, to, value, input)?;
        let logs = self.logs.split_off(checkpoint.logs);
        if self.depth == 0 {
            self.journal.clear();
        }
        Ok(Receipt { output, logs })
    }

    fn enter(&mut self, frame: Frame, input: &[u8], transfer_value: bool) -> Result<Bytes, Revert> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Revert::empty());
        }
        let checkpoint = self.checkpoint();

        if transfer_value && !frame.value.is_zero() {
            if let Err(revert) = self.transfer(frame.caller, frame.address, frame.value) {
                self.revert_to(checkpoint);
                return Err(revert);
            }
        }

        // No code: externally-owned account, nothing to run.
        let Some(code) = self.code.get(&frame.code_address).cloned() else {
            return Ok(Bytes::new());
        };

        self.depth += 1;
        let result = code.call(self, &frame, input);
        self.depth -= 1;

        if let Err(ref revert) = result {
            tracing::trace!(
                address = %frame.address,
                code = %frame.code_address,
                depth = self.depth,
                %revert,
                "frame reverted"
            );
            self.revert_to(checkpoint);
        }
        result
    }

    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), Revert> {
        let from_balance = self.balance(from);
        if from_balance < amount {
            return Err(Revert::empty());
        }
        self.journaled_balance(from, from_balance - amount);
        let to_balance = self.balance(to);
        self.journaled_balance(to, to_balance.saturating_add(amount));
        Ok(())
    }

    fn checkpoint(&self) -> Checkpoint {
        self.journal.checkpoint(self.logs.len())
    }

    fn revert_to(&mut self, checkpoint: Checkpoint) {
        for entry in self.journal.unwind(checkpoint) {
            match entry {
                JournalEntry::Storage {
                    address,
                    slot,
                    previous,
                } => self.write_slot(address, slot, previous),
                JournalEntry::Balance { address, previous } => self.write_balance(address, previous),
            }
        }
        self.logs.truncate(checkpoint.logs);
    }

    fn write_slot(&mut self, address: Address, slot: B256, value: U256) {
        if value.is_zero() {
            self.storage.remove(&(address, slot));
        } else {
            self.storage.insert((address, slot), value);
        }
    }

    fn write_balance(&mut self, address: Address, amount: U256) {
        if amount.is_zero() {
            self.balances.remove(&address);
        } else {
            self.balances.insert(address, amount);
        }
    }
}
