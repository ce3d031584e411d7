//! Text-generation abstractions for AgentVerse.
//!
//! - `TextGenerator`: RPITIT trait implemented by concrete backends
//! - `BoxTextGenerator`: object-safe wrapper for runtime backend selection

pub mod box_generator;
pub mod generator;

pub use box_generator::BoxTextGenerator;
pub use generator::TextGenerator;
