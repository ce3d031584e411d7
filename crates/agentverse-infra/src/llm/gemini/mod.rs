//! Gemini `generateContent` text generator.

pub mod client;
pub mod types;

pub use client::GeminiGenerator;
