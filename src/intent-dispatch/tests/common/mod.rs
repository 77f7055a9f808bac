#![allow(dead_code)]

use alloy_primitives::{Address, Bytes, U256};
use eyre::Result;
use intent_dispatch::{
    types::{DigestScheme, Intent},
    AccountHandle, BatchReceipt, DispatchError, DispatcherConfig, DispatcherHandle,
    ExecutorHandle, Host, TokenHandle, VaultHandle,
};
use intent_signer::{address_of, compound_action_payload, IntentBuilder};
use k256::ecdsa::SigningKey;

pub const INITIAL_BALANCE: u64 = 100;

pub fn key(byte: u8) -> SigningKey {
    SigningKey::from_slice(&[byte; 32]).expect("valid scalar")
}

pub fn u(value: u64) -> U256 {
    U256::from(value)
}

/// One dispatcher, one funded account, and the token/vault/executor the compound action uses.
pub struct Fixture {
    pub host: Host,
    pub dispatcher: DispatcherHandle,
    pub account: AccountHandle,
    pub token: TokenHandle,
    pub vault: VaultHandle,
    pub executor: ExecutorHandle,
    pub controller: SigningKey,
    pub scheme: DigestScheme,
    pub minter: Address,
    pub submitter: Address,
}

impl Fixture {
    pub fn new(config: DispatcherConfig) -> Result<Self> {
        Self::build(config, U256::ZERO, DigestScheme::Raw)
    }

    pub fn build(config: DispatcherConfig, deposit_cap: U256, scheme: DigestScheme) -> Result<Self> {
        let mut host = Host::new(31337);
        let controller = key(0x11);
        let minter = Address::repeat_byte(0x01);

        let dispatcher = DispatcherHandle::deploy(&mut host, config);
        let account =
            AccountHandle::deploy(&mut host, address_of(&controller), dispatcher.address(), scheme)?;
        let token = TokenHandle::deploy(&mut host, minter);
        let vault = VaultHandle::deploy(&mut host, token.address(), deposit_cap);
        let executor = ExecutorHandle::deploy(&mut host);
        token.mint(&mut host, minter, account.address(), u(INITIAL_BALANCE))?;

        Ok(Self {
            host,
            dispatcher,
            account,
            token,
            vault,
            executor,
            controller,
            scheme,
            minter,
            submitter: Address::repeat_byte(0x5b),
        })
    }

    /// Action payload: approve and deposit `amount` from the account into the vault.
    pub fn compound(&self, amount: u64) -> Bytes {
        compound_action_payload(
            self.executor.address(),
            self.token.address(),
            self.vault.address(),
            u(amount),
            self.account.address(),
        )
    }

    pub fn intent(&self, sequence: u64, payload: Bytes, signer: &SigningKey) -> Result<Intent> {
        Ok(IntentBuilder::new(self.account.address(), u(sequence))
            .action(payload)
            .domain(self.dispatcher.domain(&self.host))
            .scheme(self.scheme)
            .sign(signer)?)
    }

    pub fn signed(&self, sequence: u64, payload: Bytes) -> Result<Intent> {
        self.intent(sequence, payload, &self.controller)
    }

    pub fn submit(&mut self, intents: &[Intent]) -> Result<BatchReceipt, DispatchError> {
        self.dispatcher
            .process_batch(&mut self.host, self.submitter, intents, self.submitter)
    }

    pub fn sequence(&mut self) -> Result<U256> {
        Ok(self.dispatcher.sequence(&mut self.host, self.account.address())?)
    }

    pub fn shares(&mut self) -> Result<U256> {
        Ok(self.vault.shares_of(&mut self.host, self.account.address())?)
    }

    pub fn resource_balance(&mut self) -> Result<U256> {
        Ok(self.token.balance_of(&mut self.host, self.account.address())?)
    }

    pub fn vault_allowance(&mut self) -> Result<U256> {
        Ok(self
            .token
            .allowance(&mut self.host, self.account.address(), self.vault.address())?)
    }
}
