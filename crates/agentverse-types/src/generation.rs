//! Text-generation request and error types.
//!
//! The generator contract is deliberately narrow: one prompt in, one text out.
//! Retry and degradation policy belong to callers, which branch on the
//! [`GenerationError`] kind.

use serde::{Deserialize, Serialize};

/// A single prompt sent to the text-generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Sampling temperature; the backend default applies when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Allow the backend to ground its answer with external search.
    #[serde(default)]
    pub web_search: bool,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: None,
            web_search: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.web_search = enabled;
        self
    }
}

/// Errors from the text-generation backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// No API credential is configured. Fatal; never retried.
    #[error("text generation is not configured: {0}")]
    Configuration(String),

    #[error("text generation timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Non-success HTTP status from the backend.
    #[error("upstream error (HTTP {status}): {}", message.as_deref().unwrap_or("no message"))]
    Upstream { status: u16, message: Option<String> },

    /// The backend answered but produced no usable text.
    #[error("text generation returned no usable text")]
    EmptyResponse,

    /// The request never reached a status line (DNS, TLS, connection reset).
    #[error("transport error: {0}")]
    Transport(String),
}

impl GenerationError {
    /// True for the missing-credential case, which callers surface distinctly.
    pub fn is_configuration(&self) -> bool {
        matches!(self, GenerationError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display_with_message() {
        let err = GenerationError::Upstream {
            status: 429,
            message: Some("quota exceeded".to_string()),
        };
        assert_eq!(err.to_string(), "upstream error (HTTP 429): quota exceeded");
    }

    #[test]
    fn test_upstream_display_without_message() {
        let err = GenerationError::Upstream {
            status: 500,
            message: None,
        };
        assert!(err.to_string().contains("no message"));
    }

    #[test]
    fn test_is_configuration() {
        assert!(GenerationError::Configuration("missing key".into()).is_configuration());
        assert!(!GenerationError::EmptyResponse.is_configuration());
        assert!(!GenerationError::Timeout { secs: 30 }.is_configuration());
    }

    #[test]
    fn test_request_builder() {
        let req = GenerationRequest::new("hi")
            .with_temperature(0.2)
            .with_web_search(true);
        assert_eq!(req.temperature, Some(0.2));
        assert!(req.web_search);
    }
}
