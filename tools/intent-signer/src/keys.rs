use alloy_primitives::Address;
use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("private key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("private key is not a valid secp256k1 scalar")]
    Scalar(#[from] k256::ecdsa::Error),
}

/// Parse a 32-byte hex private key, with or without a `0x` prefix.
pub fn signing_key_from_hex(input: &str) -> Result<SigningKey, KeyError> {
    let trimmed = input.trim();
    let raw = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(raw)?;
    Ok(SigningKey::from_slice(&bytes)?)
}

/// Controller address of a key: low 20 bytes of keccak256 over the uncompressed public point.
pub fn address_of(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    let mut hasher = Keccak256::new();
    hasher.update(&point.as_bytes()[1..]);
    let digest = hasher.finalize();
    Address::from_slice(&digest[12..32])
}
