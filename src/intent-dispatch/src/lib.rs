//! Intent validation and atomic execution.
//!
//! A dispatcher accepts batches of signed intents, checks each intent's sequence, has the target
//! delegated account verify the controller's signature over the intent fingerprint, and then
//! runs the intent's action through the account's guarded dispatch entry point. Every component
//! is a contract on a journaled [`host::Host`], so an intent (or a whole batch) either commits
//! all of its effects or none of them.

pub mod account;
pub mod assets;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod dispatcher;
pub mod errors;
pub mod executor;
pub mod handle;
pub mod host;

pub use account::DelegatedAccount;
pub use config::{BatchFailurePolicy, DispatcherConfig, FingerprintBinding, SequencePolicy};
pub use dispatcher::Dispatcher;
pub use errors::DispatchError;
pub use executor::ActionExecutor;
pub use handle::{
    AccountHandle, BatchReceipt, DispatcherHandle, ExecutorHandle, IntentOutcome, IntentStatus,
    TokenHandle, VaultHandle,
};
pub use host::{Contract, Frame, Host, Receipt, Revert};
pub use intent_dispatch_types as types;
