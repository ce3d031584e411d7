//! Token refresh against the hosted backend's auth endpoint.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::RwLock;

use agentverse_core::repository::SessionProvider;
use agentverse_types::agent::UserId;
use agentverse_types::error::SessionError;
use agentverse_types::session::Session;

/// Lifetime assumed when the token response carries no expiry.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Unix seconds.
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let now = Utc::now();
        let expires_at = self
            .expires_at
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(|| {
                now + chrono::Duration::seconds(self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS))
            });
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user_id: self.user.and_then(|u| u.id.parse::<UserId>().ok()),
        }
    }
}

/// Holds the current session and refreshes it on demand.
///
/// Implements [`SessionProvider`] so `SessionKeeper` can keep it alive, and
/// hands out access tokens to [`super::RestRepository`].
pub struct RestAuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
    session: RwLock<Option<Session>>,
}

impl RestAuthClient {
    pub fn new(base_url: &str, anon_key: SecretString) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            session: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn anon_key(&self) -> &SecretString {
        &self.anon_key
    }

    /// Replace the held session (e.g. after sign-in elsewhere).
    pub async fn set_session(&self, session: Option<Session>) {
        *self.session.write().await = session;
    }

    /// Bearer token for row requests: the session token, else the anon key.
    ///
    /// A session seeded with only a refresh token has an empty access token.
    pub(crate) async fn bearer_token(&self) -> String {
        match self.session.read().await.as_ref() {
            Some(session) if !session.access_token.is_empty() => session.access_token.clone(),
            _ => self.anon_key.expose_secret().to_string(),
        }
    }
}

impl SessionProvider for RestAuthClient {
    async fn current_session(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.session.read().await.clone())
    }

    #[tracing::instrument(name = "refresh_session", skip_all)]
    async fn refresh_session(&self) -> Result<Session, SessionError> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or(SessionError::NoSession)?;

        let url = format!("{}/auth/v1/token", self.base_url);
        let response = self
            .http
            .post(&url)
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", self.anon_key.expose_secret())
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| SessionError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SessionError::Unreachable(e.to_string()))?;

        if status.is_client_error() {
            let reason = serde_json::from_str::<AuthErrorBody>(&body)
                .ok()
                .and_then(|b| b.error_description.or(b.msg).or(b.message))
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(SessionError::RefreshRejected(reason));
        }
        if !status.is_success() {
            return Err(SessionError::Unreachable(format!("HTTP {status}")));
        }

        let session = serde_json::from_str::<TokenResponse>(&body)
            .map_err(|e| SessionError::Unreachable(format!("malformed token response: {e}")))?
            .into_session();

        *self.session.write().await = Some(session.clone());
        Ok(session)
    }
}
