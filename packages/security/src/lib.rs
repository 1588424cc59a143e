// ABOUTME: Request security for the Keel admin surface
// ABOUTME: Integrity tokens, principals with capabilities, and admin credential hashing

pub mod capability;
pub mod credentials;
pub mod nonce;

// Re-export main types for convenience
pub use capability::{Capability, Principal};
pub use credentials::{generate_token, hash_token, verify_token_hash};
pub use nonce::{IntegrityTokens, NonceAge, NonceError};
