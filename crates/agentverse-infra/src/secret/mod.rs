//! Credential lookup.
//!
//! Credentials (the generator API key, the hosted backend's anon key) are
//! read from environment variables named in `config.toml` and held as
//! [`secrecy::SecretString`] from then on.

pub mod env;

pub use env::{EnvCredentials, read_env_secret};
