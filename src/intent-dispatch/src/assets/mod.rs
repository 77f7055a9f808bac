//! Concrete collaborators the compound action runs against.

pub mod token;
pub mod vault;

pub use token::ResourceToken;
pub use vault::Vault;
