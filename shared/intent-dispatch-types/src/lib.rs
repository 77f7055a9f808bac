//! Types shared between the dispatcher host and off-host tooling.
//!
//! Everything that must agree byte-for-byte on both sides lives here: the intent
//! model and its ERC-4337 wire form, the canonical fingerprint, and the Solidity
//! ABI of every contract the dispatcher talks to.

pub mod abi;
pub mod fingerprint;
pub mod intent;

pub use fingerprint::{fingerprint, intent_hash, DigestScheme, FingerprintDomain};
pub use intent::{FeeParameters, Intent, ResourceLimits};
