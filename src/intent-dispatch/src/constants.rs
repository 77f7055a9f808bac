//! Protocol constants shared by the dispatcher and the delegated account.

use alloy_primitives::{B256, U256};

use crate::host::storage::slot;

// Validation return codes (the dispatcher treats any non-zero validation data as failure).
pub const SIG_VALIDATION_SUCCESS: U256 = U256::ZERO;
pub const SIG_VALIDATION_FAILED: U256 = U256::from_limbs([1, 0, 0, 0]);

// Dispatcher storage.
pub const DISPATCHER_SEQUENCES_SLOT: B256 = slot(0);
pub const DISPATCHER_LOCK_SLOT: B256 = slot(1);

// Delegated account storage.
pub const ACCOUNT_CONTROLLER_SLOT: B256 = slot(0);
pub const ACCOUNT_DISPATCHER_SLOT: B256 = slot(1);
pub const ACCOUNT_SCHEME_SLOT: B256 = slot(2);

// Resource token storage.
pub const TOKEN_BALANCES_SLOT: B256 = slot(0);
pub const TOKEN_ALLOWANCES_SLOT: B256 = slot(1);
pub const TOKEN_SUPPLY_SLOT: B256 = slot(2);
pub const TOKEN_MINTER_SLOT: B256 = slot(3);

// Vault storage.
pub const VAULT_SHARES_SLOT: B256 = slot(0);
pub const VAULT_SUPPLY_SLOT: B256 = slot(1);
pub const VAULT_ASSET_SLOT: B256 = slot(2);
pub const VAULT_CAP_SLOT: B256 = slot(3);
