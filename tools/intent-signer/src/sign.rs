use alloy_primitives::{Bytes, B256};
use intent_dispatch_types::{fingerprint, DigestScheme, FingerprintDomain, Intent};
use k256::ecdsa::SigningKey;

/// Sign a 32-byte digest as `r || s || v` with `v` in {27, 28}.
///
/// k256 always produces low-`s` signatures, which is the only form the account accepts.
pub fn sign_digest(key: &SigningKey, digest: B256) -> Result<Bytes, k256::ecdsa::Error> {
    let (signature, recovery_id) = key.sign_prehash_recoverable(digest.as_slice())?;

    let mut sig_bytes = Vec::with_capacity(65);
    sig_bytes.extend_from_slice(&signature.to_bytes());
    sig_bytes.push(recovery_id.to_byte() + 27);
    Ok(sig_bytes.into())
}

/// Fingerprint `intent`, sign it, and write the signature into `intent.signature`.
///
/// `domain` and `scheme` must match the dispatcher's binding and the account's digest scheme.
/// Returns the fingerprint that was signed.
pub fn sign_intent(
    intent: &mut Intent,
    key: &SigningKey,
    domain: Option<&FingerprintDomain>,
    scheme: DigestScheme,
) -> Result<B256, k256::ecdsa::Error> {
    let fp = fingerprint(intent, domain);
    intent.signature = sign_digest(key, scheme.digest(fp))?;
    Ok(fp)
}
