//! Solidity-compatible storage addressing.
//!
//! Fixed slots are plain indices; `mapping(K => V)` at slot `p` stores key `k` at
//! `keccak256(pad32(k) || pad32(p))`, nested mappings apply the rule again.

use alloy_primitives::{keccak256, Address, B256, U256};

use super::Host;

pub const fn slot(index: u64) -> B256 {
    let mut word = [0u8; 32];
    let bytes = index.to_be_bytes();
    let mut i = 0;
    while i < 8 {
        word[24 + i] = bytes[i];
        i += 1;
    }
    B256::new(word)
}

pub fn mapping_slot(key: B256, base: B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[0..32].copy_from_slice(key.as_slice());
    buf[32..64].copy_from_slice(base.as_slice());
    keccak256(buf)
}

pub fn address_slot(key: Address, base: B256) -> B256 {
    mapping_slot(key.into_word(), base)
}

pub fn address_to_word(address: Address) -> U256 {
    U256::from_be_slice(address.into_word().as_slice())
}

pub fn word_to_address(word: U256) -> Address {
    Address::from_word(B256::new(word.to_be_bytes::<32>()))
}

pub fn load_address(host: &Host, contract: Address, slot: B256) -> Address {
    word_to_address(host.sload(contract, slot))
}

pub fn store_address(host: &mut Host, contract: Address, slot: B256, value: Address) {
    host.sstore(contract, slot, address_to_word(value));
}
