//! Infrastructure layer for AgentVerse.
//!
//! Contains implementations of the ports defined in `agentverse-core`:
//! SQLite storage, the hosted REST backend (rows and auth sessions), the
//! Gemini text generator, environment credentials, and configuration loading.

pub mod config;
pub mod crypto;
pub mod llm;
pub mod rest;
pub mod secret;
pub mod sqlite;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
