//! Hashing helpers.
//!
//! - `hash`: SHA-256 digests for API keys stored at rest

pub mod hash;
