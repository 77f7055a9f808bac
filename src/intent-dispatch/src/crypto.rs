//! Signature recovery used by the delegated account.
//!
//! Purpose: map `(digest, r||s||v)` back to the Ethereum address that produced it, with the same
//! acceptance rules as the EVM `ecrecover` path most accounts wrap.

use alloy_primitives::{keccak256, Address, B256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use thiserror::Error;

pub const SIGNATURE_LENGTH: usize = 65;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature must be {SIGNATURE_LENGTH} bytes, got {0}")]
    InvalidLength(usize),
    #[error("recovery id must be 0, 1, 27 or 28, got {0}")]
    InvalidRecoveryId(u8),
    #[error("signature scalars are out of range")]
    Malformed,
    #[error("signature s-value is in the upper half of the curve order")]
    HighS,
    #[error("no public key recovers from this signature")]
    Unrecoverable,
}

/// Recover the signing address from a 32-byte digest and a 65-byte `r || s || v` signature.
///
/// Notes:
/// - `v` is accepted as {0,1} or {27,28}.
/// - High-`s` signatures are rejected so a signature has exactly one accepted encoding.
pub fn recover_signer(digest: B256, signature: &[u8]) -> Result<Address, SignatureError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidLength(signature.len()));
    }

    let v = signature[64];
    let recovery_id = match v {
        27 | 28 => v - 27,
        0 | 1 => v,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };
    let recovery_id =
        RecoveryId::from_byte(recovery_id).ok_or(SignatureError::InvalidRecoveryId(v))?;

    let sig = Signature::from_slice(&signature[..64]).map_err(|_| SignatureError::Malformed)?;
    if sig.normalize_s().is_some() {
        return Err(SignatureError::HighS);
    }

    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
        .map_err(|_| SignatureError::Unrecoverable)?;
    Ok(address_of(&key))
}

/// Ethereum address of a secp256k1 public key: low 20 bytes of keccak256(X || Y).
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&digest[12..])
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;
    use k256::ecdsa::SigningKey;

    use super::*;

    fn key() -> SigningKey {
        // Well-known development key #0.
        let bytes = hex::decode("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
            .unwrap();
        SigningKey::from_slice(&bytes).unwrap()
    }

    fn sign(key: &SigningKey, digest: B256, v_offset: u8) -> Vec<u8> {
        let (sig, recid) = key.sign_prehash_recoverable(digest.as_slice()).unwrap();
        let mut out = sig.to_bytes().to_vec();
        out.push(recid.to_byte() + v_offset);
        out
    }

    #[test]
    fn recovers_known_address() {
        let key = key();
        let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(address_of(key.verifying_key()), expected);

        let digest = keccak256(b"intent");
        for v_offset in [0u8, 27u8] {
            let sig = sign(&key, digest, v_offset);
            assert_eq!(recover_signer(digest, &sig).unwrap(), expected);
        }
    }

    #[test]
    fn different_digest_recovers_different_address() {
        let key = key();
        let sig = sign(&key, keccak256(b"one"), 27);
        let recovered = recover_signer(keccak256(b"two"), &sig);
        assert_ne!(recovered.ok(), Some(address_of(key.verifying_key())));
    }

    #[test]
    fn rejects_bad_shapes() {
        let digest = keccak256(b"intent");
        assert_eq!(recover_signer(digest, &[0u8; 64]), Err(SignatureError::InvalidLength(64)));

        let mut sig = sign(&key(), digest, 27);
        sig[64] = 29;
        assert_eq!(recover_signer(digest, &sig), Err(SignatureError::InvalidRecoveryId(29)));

        assert_eq!(recover_signer(digest, &[0u8; 65]), Err(SignatureError::Malformed));
    }

    #[test]
    fn rejects_high_s_twin() {
        let key = key();
        let digest = keccak256(b"malleable");
        let (sig, recid) = key.sign_prehash_recoverable(digest.as_slice()).unwrap();

        // (r, n - s) with the flipped parity is the same signature in its other encoding.
        let order = U256::from_str_radix(
            "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141",
            16,
        )
        .unwrap();
        let bytes = sig.to_bytes();
        let s = U256::from_be_slice(&bytes[32..64]);
        let mut bytes = bytes.to_vec();
        bytes[32..64].copy_from_slice(&(order - s).to_be_bytes::<32>());
        bytes.push((recid.to_byte() ^ 1) + 27);

        assert_eq!(recover_signer(digest, &bytes), Err(SignatureError::HighS));
    }
}
