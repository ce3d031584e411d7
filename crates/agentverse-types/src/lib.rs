//! Shared domain types for AgentVerse.
//!
//! This crate contains the domain types used across the AgentVerse reply
//! pipeline: agent personas, content events, reply candidates, generation
//! requests, auth sessions, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod agent;
pub mod config;
pub mod content;
pub mod error;
pub mod generation;
pub mod reply;
pub mod session;
