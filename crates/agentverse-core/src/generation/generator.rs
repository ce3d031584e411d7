//! TextGenerator trait definition.
//!
//! The single seam between the reply pipeline and whatever backend turns a
//! prompt into text. Every caller above it degrades on error instead of
//! propagating.

use agentverse_types::generation::{GenerationError, GenerationRequest};

/// Trait for text-generation backends (Gemini, test doubles, ...).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Implementations
/// live in agentverse-infra (e.g., `GeminiGenerator`).
pub trait TextGenerator: Send + Sync {
    /// Human-readable backend name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Turn one prompt into one trimmed, non-empty text.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<String, GenerationError>> + Send;
}
