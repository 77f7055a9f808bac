//! Off-host tooling for intents: controller keys, action payload encoding, fingerprint signing.

pub mod action;
pub mod builder;
pub mod keys;
pub mod sign;


pub use action::{
    compound_action_payload, encode_compound_action, encode_execute, encode_execute_delegate,
};
pub use builder::IntentBuilder;
pub use keys::{address_of, signing_key_from_hex, KeyError};
pub use sign::{sign_digest, sign_intent};
