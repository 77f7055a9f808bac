//! JSON scenario: a fresh host, one account, and a list of batches to submit.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use anyhow::{Context, Result};
use intent_dispatch::{
    types::{abi::IResourceToken, DigestScheme, Intent},
    AccountHandle, DispatcherConfig, DispatcherHandle, ExecutorHandle, Host,
    IntentStatus, TokenHandle, VaultHandle,
};
use intent_signer::{address_of, compound_action_payload, encode_execute, IntentBuilder};
use k256::ecdsa::SigningKey;
use serde::Deserialize;

use crate::report::{BatchReport, FinalState, IntentReport, Report};

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Scenario {
    pub chain_id: u64,
    pub dispatcher: DispatcherConfig,
    pub digest_scheme: DigestScheme,
    /// Resource minted to the account before the first batch.
    pub initial_balance: U256,
    /// Vault deposit cap; zero means uncapped.
    pub deposit_cap: U256,
    pub batches: Vec<BatchSpec>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            chain_id: intent_dispatch::host::DEFAULT_CHAIN_ID,
            dispatcher: DispatcherConfig::default(),
            digest_scheme: DigestScheme::default(),
            initial_balance: U256::ZERO,
            deposit_cap: U256::ZERO,
            batches: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BatchSpec {
    pub intents: Vec<IntentSpec>,
}

#[derive(Debug, Deserialize)]
pub struct IntentSpec {
    /// Explicit sequence; the next unused one when omitted.
    #[serde(default)]
    pub sequence: Option<U256>,
    #[serde(default)]
    pub signer: SignerChoice,
    #[serde(flatten)]
    pub action: ActionSpec,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignerChoice {
    #[default]
    Controller,
    Other,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionSpec {
    /// Approve and deposit `amount` into the vault for the account.
    Compound { amount: U256 },
    /// Plain resource transfer out of the account.
    Transfer { to: Address, amount: U256 },
    /// Empty action payload.
    Noop,
}

pub struct Keys {
    pub controller: SigningKey,
    pub other: SigningKey,
}

struct World {
    host: Host,
    dispatcher: DispatcherHandle,
    account: AccountHandle,
    token: TokenHandle,
    vault: VaultHandle,
    executor: ExecutorHandle,
    scheme: DigestScheme,
}

impl World {
    fn build(scenario: &Scenario, controller: Address) -> Result<Self> {
        let mut host = Host::new(scenario.chain_id);
        let minter = Address::repeat_byte(0x01);

        let dispatcher = DispatcherHandle::deploy(&mut host, scenario.dispatcher);
        let account = AccountHandle::deploy(
            &mut host,
            controller,
            dispatcher.address(),
            scenario.digest_scheme,
        )
        .context("failed deploying account")?;
        let token = TokenHandle::deploy(&mut host, minter);
        let vault = VaultHandle::deploy(&mut host, token.address(), scenario.deposit_cap);
        let executor = ExecutorHandle::deploy(&mut host);

        if !scenario.initial_balance.is_zero() {
            token
                .mint(&mut host, minter, account.address(), scenario.initial_balance)
                .context("failed funding account")?;
        }

        Ok(Self {
            host,
            dispatcher,
            account,
            token,
            vault,
            executor,
            scheme: scenario.digest_scheme,
        })
    }

    fn intent(&self, spec: &IntentSpec, sequence: U256, keys: &Keys) -> Result<Intent> {
        let account = self.account.address();
        let payload = match &spec.action {
            ActionSpec::Compound { amount } => compound_action_payload(
                self.executor.address(),
                self.token.address(),
                self.vault.address(),
                *amount,
                account,
            ),
            ActionSpec::Transfer { to, amount } => {
                let transfer = IResourceToken::transferCall {
                    to: *to,
                    amount: *amount,
                };
                encode_execute(self.token.address(), U256::ZERO, transfer.abi_encode())
            }
            ActionSpec::Noop => Default::default(),
        };

        let key = match spec.signer {
            SignerChoice::Controller => &keys.controller,
            SignerChoice::Other => &keys.other,
        };
        IntentBuilder::new(account, sequence)
            .action(payload)
            .domain(self.dispatcher.domain(&self.host))
            .scheme(self.scheme)
            .sign(key)
            .context("failed signing intent")
    }
}

pub fn run(scenario: &Scenario, keys: &Keys) -> Result<Report> {
    let controller = address_of(&keys.controller);
    let mut world = World::build(scenario, controller)?;
    let submitter = Address::repeat_byte(0x5b);
    let beneficiary = submitter;

    let mut batches = Vec::with_capacity(scenario.batches.len());
    for (batch_index, batch) in scenario.batches.iter().enumerate() {
        let mut next = world
            .dispatcher
            .sequence(&mut world.host, world.account.address())
            .context("failed reading sequence")?;

        let mut intents = Vec::with_capacity(batch.intents.len());
        for spec in &batch.intents {
            let sequence = spec.sequence.unwrap_or(next);
            next = sequence.saturating_add(U256::from(1u64));
            intents.push(world.intent(spec, sequence, keys)?);
        }

        let result = world
            .dispatcher
            .process_batch(&mut world.host, submitter, &intents, beneficiary);
        let report = match result {
            Ok(receipt) => {
                tracing::info!(batch = batch_index, reverted = receipt.reverted, "batch committed");
                BatchReport {
                    index: batch_index,
                    committed: true,
                    error: None,
                    intents: receipt
                        .outcomes
                        .iter()
                        .map(|outcome| IntentReport {
                            fingerprint: outcome.fingerprint,
                            sequence: outcome.sequence,
                            executed: outcome.is_executed(),
                            output: match &outcome.status {
                                IntentStatus::Executed { result } => result.clone(),
                                IntentStatus::Reverted { reason } => reason.clone(),
                            },
                            error: outcome.error().map(|e| e.to_string()),
                        })
                        .collect(),
                }
            }
            Err(error) => {
                tracing::warn!(batch = batch_index, %error, "batch reverted");
                BatchReport {
                    index: batch_index,
                    committed: false,
                    error: Some(error.to_string()),
                    intents: Vec::new(),
                }
            }
        };
        batches.push(report);
    }

    let account = world.account.address();
    let final_state = FinalState {
        sequence: world.dispatcher.sequence(&mut world.host, account)?,
        controller: world.account.controller(&mut world.host)?,
        resource_balance: world.token.balance_of(&mut world.host, account)?,
        vault_shares: world.vault.shares_of(&mut world.host, account)?,
        vault_allowance: world
            .token
            .allowance(&mut world.host, account, world.vault.address())?,
    };

    Ok(Report::new(
        scenario.chain_id,
        world.dispatcher.address(),
        account,
        controller,
        batches,
        final_state,
    ))
}
