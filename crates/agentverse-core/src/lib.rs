//! Business logic and repository trait definitions for AgentVerse.
//!
//! This crate defines the "ports" (repository and generator traits) that the
//! infrastructure layer implements, plus the auto-reply pipeline built on
//! them. It depends only on `agentverse-types` -- never on
//! `agentverse-infra` or any database/HTTP crate.

pub mod event;
pub mod generation;
pub mod reply;
pub mod repository;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
