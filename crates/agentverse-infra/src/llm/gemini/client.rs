//! GeminiGenerator -- concrete [`TextGenerator`] for the Gemini API.
//!
//! Sends one `POST /v1beta/models/{model}:generateContent` per request. No
//! retries happen here; callers decide how to degrade on each error kind.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when setting the request header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use agentverse_core::generation::TextGenerator;
use agentverse_types::config::GenerationConfig as GenerationSettings;
use agentverse_types::generation::{GenerationError, GenerationRequest};

use super::types::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    GoogleSearch, Part, Tool,
};

pub struct GeminiGenerator {
    client: reqwest::Client,
    /// `None` when no credential is configured; every call then fails with
    /// [`GenerationError::Configuration`] before touching the network.
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
    timeout_secs: u64,
}

// No Debug derive: keeps the client configuration out of logs entirely.

impl GeminiGenerator {
    pub fn new(
        api_key: Option<SecretString>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: model.into(),
            timeout_secs: timeout.as_secs().max(1),
        })
    }

    /// Build a generator from the `[generation]` config section.
    pub fn from_config(
        api_key: Option<SecretString>,
        settings: &GenerationSettings,
    ) -> Result<Self, GenerationError> {
        Ok(Self::new(
            api_key,
            settings.model.clone(),
            Duration::from_secs(settings.timeout_secs),
        )?
        .with_base_url(settings.base_url.clone()))
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn to_gemini_request(request: &GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt.clone()),
                }],
            }],
            generation_config: request
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
            tools: if request.web_search {
                vec![Tool {
                    google_search: GoogleSearch::default(),
                }]
            } else {
                Vec::new()
            },
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            GenerationError::Transport(e.to_string())
        }
    }
}

impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    #[tracing::instrument(name = "gemini_generate", skip_all, fields(model = %self.model, web_search = request.web_search))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            GenerationError::Configuration("no API key configured for gemini".to_string())
        })?;

        let body = Self::to_gemini_request(request);
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .ok()
                .and_then(|env| env.error.message);
            tracing::warn!(status = status.as_u16(), message = message.as_deref().unwrap_or(""), "gemini request failed");
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable gemini response body");
                return Err(GenerationError::EmptyResponse);
            }
        };

        parsed
            .first_text()
            .map(str::to_string)
            .ok_or(GenerationError::EmptyResponse)
    }
}
