//! Share-issuing receiving pool (ERC-4626 shaped, deposit side only).

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolEvent, SolInterface};
use intent_dispatch_types::abi::{
    IResourceToken,
    IVault::{self, IVaultCalls},
};

use crate::{
    constants::{VAULT_ASSET_SLOT, VAULT_CAP_SLOT, VAULT_SHARES_SLOT, VAULT_SUPPLY_SLOT},
    host::{
        storage::{address_slot, load_address, store_address},
        Contract, Frame, Host, Revert,
    },
};

#[derive(Debug, Default)]
pub struct Vault;

impl Vault {
    /// Deploy a vault over `asset`. A zero `deposit_cap` means uncapped.
    pub fn deploy(host: &mut Host, asset: Address, deposit_cap: U256) -> Address {
        let address = host.deploy(Arc::new(Vault));
        store_address(host, address, VAULT_ASSET_SLOT, asset);
        host.sstore(address, VAULT_CAP_SLOT, deposit_cap);
        address
    }

    fn total_assets(host: &mut Host, vault: Address) -> Result<U256, Revert> {
        let asset = load_address(host, vault, VAULT_ASSET_SLOT);
        let call = IResourceToken::balanceOfCall { account: vault };
        let output = host.static_call(vault, asset, &call.abi_encode())?;
        IResourceToken::balanceOfCall::abi_decode_returns(&output, true)
            .map(|r| r._0)
            .map_err(|_| Revert::empty())
    }

    /// Shares minted for `assets`, rounded down.
    fn convert_to_shares(assets: U256, supply: U256, total_assets: U256) -> Result<U256, Revert> {
        if supply.is_zero() || total_assets.is_zero() {
            return Ok(assets);
        }
        assets
            .checked_mul(supply)
            .map(|product| product / total_assets)
            .ok_or_else(|| Revert::from_error(IVault::ShareMathOverflow { assets, supply }))
    }

    fn deposit(host: &mut Host, frame: &Frame, assets: U256, receiver: Address) -> Result<U256, Revert> {
        let vault = frame.address;
        if assets.is_zero() {
            return Err(Revert::from_error(IVault::ZeroDeposit {}));
        }

        let total_assets = Self::total_assets(host, vault)?;
        let cap = host.sload(vault, VAULT_CAP_SLOT);
        let requested = total_assets.saturating_add(assets);
        if !cap.is_zero() && requested > cap {
            return Err(Revert::from_error(IVault::DepositCapExceeded { cap, requested }));
        }

        let supply = host.sload(vault, VAULT_SUPPLY_SLOT);
        let shares = Self::convert_to_shares(assets, supply, total_assets)?;
        if shares.is_zero() {
            return Err(Revert::from_error(IVault::ZeroShares { assets }));
        }

        let asset = load_address(host, vault, VAULT_ASSET_SLOT);
        let pull = IResourceToken::transferFromCall {
            from: frame.caller,
            to: vault,
            amount: assets,
        };
        let output = host.call(vault, asset, U256::ZERO, &pull.abi_encode())?;
        let pulled = IResourceToken::transferFromCall::abi_decode_returns(&output, true)
            .map(|r| r._0)
            .unwrap_or(false);
        if !pulled {
            return Err(Revert::reason("asset transfer failed"));
        }

        let overflow = || Revert::from_error(IVault::ShareMathOverflow { assets, supply });
        let new_supply = supply.checked_add(shares).ok_or_else(overflow)?;
        host.sstore(vault, VAULT_SUPPLY_SLOT, new_supply);
        let slot = address_slot(receiver, VAULT_SHARES_SLOT);
        let held = host.sload(vault, slot);
        host.sstore(vault, slot, held.checked_add(shares).ok_or_else(overflow)?);

        let event = IVault::Deposit {
            sender: frame.caller,
            owner: receiver,
            assets,
            shares,
        };
        host.emit(vault, event.encode_log_data());
        Ok(shares)
    }
}

impl Contract for Vault {
    fn call(&self, host: &mut Host, frame: &Frame, input: &[u8]) -> Result<Bytes, Revert> {
        let call =
            IVaultCalls::abi_decode(input, true).map_err(|_| Revert::unknown_selector(input))?;
        let vault = frame.address;

        let output = match call {
            IVaultCalls::asset(_) => {
                let asset = load_address(host, vault, VAULT_ASSET_SLOT);
                IVault::assetCall::abi_encode_returns(&(asset,))
            }
            IVaultCalls::totalAssets(_) => {
                let total = Self::total_assets(host, vault)?;
                IVault::totalAssetsCall::abi_encode_returns(&(total,))
            }
            IVaultCalls::totalSupply(_) => {
                let supply = host.sload(vault, VAULT_SUPPLY_SLOT);
                IVault::totalSupplyCall::abi_encode_returns(&(supply,))
            }
            IVaultCalls::balanceOf(c) => {
                let shares = host.sload(vault, address_slot(c.owner, VAULT_SHARES_SLOT));
                IVault::balanceOfCall::abi_encode_returns(&(shares,))
            }
            IVaultCalls::deposit(c) => {
                let shares = Self::deposit(host, frame, c.assets, c.receiver)?;
                tracing::trace!(%vault, receiver = %c.receiver, %shares, "deposit");
                IVault::depositCall::abi_encode_returns(&(shares,))
            }
        };
        Ok(output.into())
    }
}
