//! Text-generation backends.
//!
//! Currently a single provider: the Gemini `generateContent` API.

pub mod gemini;

pub use gemini::GeminiGenerator;
