//! Minimal fungible resource (ERC-20 shaped).

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolEvent, SolInterface};
use intent_dispatch_types::abi::IResourceToken::{self, IResourceTokenCalls};

use crate::{
    constants::{TOKEN_ALLOWANCES_SLOT, TOKEN_BALANCES_SLOT, TOKEN_MINTER_SLOT, TOKEN_SUPPLY_SLOT},
    host::{
        storage::{address_slot, load_address, store_address},
        Contract, Frame, Host, Revert,
    },
};

#[derive(Debug, Default)]
pub struct ResourceToken;

impl ResourceToken {
    /// Deploy a token whose supply can only be minted by `minter`.
    pub fn deploy(host: &mut Host, minter: Address) -> Address {
        let address = host.deploy(std::sync::Arc::new(ResourceToken));
        store_address(host, address, TOKEN_MINTER_SLOT, minter);
        address
    }

    fn balance_of(host: &Host, token: Address, account: Address) -> U256 {
        host.sload(token, address_slot(account, TOKEN_BALANCES_SLOT))
    }

    fn allowance(host: &Host, token: Address, owner: Address, spender: Address) -> U256 {
        host.sload(token, allowance_slot(owner, spender))
    }

    fn set_allowance(host: &mut Host, token: Address, owner: Address, spender: Address, value: U256) {
        host.sstore(token, allowance_slot(owner, spender), value);
        let event = IResourceToken::Approval {
            owner,
            spender,
            value,
        };
        host.emit(token, event.encode_log_data());
    }

    fn move_balance(
        host: &mut Host,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Revert> {
        let from_balance = Self::balance_of(host, token, from);
        if from_balance < amount {
            return Err(Revert::from_error(IResourceToken::InsufficientBalance {
                account: from,
                balance: from_balance,
                needed: amount,
            }));
        }
        host.sstore(token, address_slot(from, TOKEN_BALANCES_SLOT), from_balance - amount);
        let to_balance = Self::balance_of(host, token, to);
        host.sstore(token, address_slot(to, TOKEN_BALANCES_SLOT), to_balance + amount);

        let event = IResourceToken::Transfer {
            from,
            to,
            value: amount,
        };
        host.emit(token, event.encode_log_data());
        Ok(())
    }
}

fn allowance_slot(owner: Address, spender: Address) -> alloy_primitives::B256 {
    address_slot(spender, address_slot(owner, TOKEN_ALLOWANCES_SLOT))
}

impl Contract for ResourceToken {
    fn call(&self, host: &mut Host, frame: &Frame, input: &[u8]) -> Result<Bytes, Revert> {
        let call = IResourceTokenCalls::abi_decode(input, true)
            .map_err(|_| Revert::unknown_selector(input))?;
        let token = frame.address;

        let output = match call {
            IResourceTokenCalls::totalSupply(_) => {
                let supply = host.sload(token, TOKEN_SUPPLY_SLOT);
                IResourceToken::totalSupplyCall::abi_encode_returns(&(supply,))
            }
            IResourceTokenCalls::balanceOf(c) => {
                let balance = Self::balance_of(host, token, c.account);
                IResourceToken::balanceOfCall::abi_encode_returns(&(balance,))
            }
            IResourceTokenCalls::allowance(c) => {
                let allowance = Self::allowance(host, token, c.owner, c.spender);
                IResourceToken::allowanceCall::abi_encode_returns(&(allowance,))
            }
            IResourceTokenCalls::approve(c) => {
                Self::set_allowance(host, token, frame.caller, c.spender, c.amount);
                IResourceToken::approveCall::abi_encode_returns(&(true,))
            }
            IResourceTokenCalls::transfer(c) => {
                Self::move_balance(host, token, frame.caller, c.to, c.amount)?;
                IResourceToken::transferCall::abi_encode_returns(&(true,))
            }
            IResourceTokenCalls::transferFrom(c) => {
                let allowance = Self::allowance(host, token, c.from, frame.caller);
                if allowance < c.amount {
                    return Err(Revert::from_error(IResourceToken::InsufficientAllowance {
                        spender: frame.caller,
                        allowance,
                        needed: c.amount,
                    }));
                }
                // An unlimited allowance is never drawn down.
                if allowance != U256::MAX {
                    host.sstore(
                        token,
                        allowance_slot(c.from, frame.caller),
                        allowance - c.amount,
                    );
                }
                Self::move_balance(host, token, c.from, c.to, c.amount)?;
                IResourceToken::transferFromCall::abi_encode_returns(&(true,))
            }
            IResourceTokenCalls::mint(c) => {
                let minter = load_address(host, token, TOKEN_MINTER_SLOT);
                if frame.caller != minter {
                    return Err(Revert::from_error(IResourceToken::NotMinter {
                        caller: frame.caller,
                    }));
                }
                let supply = host.sload(token, TOKEN_SUPPLY_SLOT);
                let supply = supply.checked_add(c.amount).ok_or_else(Revert::empty)?;
                host.sstore(token, TOKEN_SUPPLY_SLOT, supply);
                let balance = Self::balance_of(host, token, c.to);
                host.sstore(token, address_slot(c.to, TOKEN_BALANCES_SLOT), balance + c.amount);

                let event = IResourceToken::Transfer {
                    from: Address::ZERO,
                    to: c.to,
                    value: c.amount,
                };
                host.emit(token, event.encode_log_data());
                IResourceToken::mintCall::abi_encode_returns(&())
            }
        };
        Ok(output.into())
    }
}

#[cfg(test)]
mod tests {
    use alloy_sol_types::SolError;

    use super::*;

    fn call<C: SolCall>(
        host: &mut Host,
        from: Address,
        token: Address,
        call: C,
    ) -> Result<C::Return, Revert> {
        let receipt = host.transact(from, token, U256::ZERO, &call.abi_encode())?;
        Ok(C::abi_decode_returns(&receipt.output, true).unwrap())
    }

    #[test]
    fn mint_is_minter_only() {
        let mut host = Host::default();
        let minter = Address::repeat_byte(1);
        let alice = Address::repeat_byte(2);
        let token = ResourceToken::deploy(&mut host, minter);

        let mint = IResourceToken::mintCall {
            to: alice,
            amount: U256::from(50u64),
        };
        let err = call(&mut host, alice, token, mint.clone()).unwrap_err();
        assert_eq!(
            err,
            Revert::from_error(IResourceToken::NotMinter { caller: alice })
        );

        call(&mut host, minter, token, mint).unwrap();
        let balance = call(&mut host, alice, token, IResourceToken::balanceOfCall { account: alice }).unwrap();
        assert_eq!(balance._0, U256::from(50u64));
        let supply = call(&mut host, alice, token, IResourceToken::totalSupplyCall {}).unwrap();
        assert_eq!(supply._0, U256::from(50u64));
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let mut host = Host::default();
        let minter = Address::repeat_byte(1);
        let owner = Address::repeat_byte(2);
        let spender = Address::repeat_byte(3);
        let token = ResourceToken::deploy(&mut host, minter);
        call(&mut host, minter, token, IResourceToken::mintCall { to: owner, amount: U256::from(100u64) }).unwrap();

        let pull = IResourceToken::transferFromCall {
            from: owner,
            to: spender,
            amount: U256::from(30u64),
        };
        let err = call(&mut host, spender, token, pull.clone()).unwrap_err();
        assert_eq!(err.selector(), Some(IResourceToken::InsufficientAllowance::SELECTOR));

        call(&mut host, owner, token, IResourceToken::approveCall { spender, amount: U256::from(40u64) }).unwrap();
        call(&mut host, spender, token, pull).unwrap();

        let left = call(&mut host, owner, token, IResourceToken::allowanceCall { owner, spender }).unwrap();
        assert_eq!(left._0, U256::from(10u64));
        let received = call(&mut host, owner, token, IResourceToken::balanceOfCall { account: spender }).unwrap();
        assert_eq!(received._0, U256::from(30u64));
    }

    #[test]
    fn overdraft_reverts_without_effect() {
        let mut host = Host::default();
        let minter = Address::repeat_byte(1);
        let alice = Address::repeat_byte(2);
        let token = ResourceToken::deploy(&mut host, minter);

        let err = call(
            &mut host,
            alice,
            token,
            IResourceToken::transferCall { to: minter, amount: U256::from(1u64) },
        )
        .unwrap_err();
        assert_eq!(err.selector(), Some(IResourceToken::InsufficientBalance::SELECTOR));
    }
}
