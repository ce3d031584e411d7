//! Auth session held against the hosted persistence backend.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::UserId;

/// An access/refresh token pair with its expiry.
///
/// `Debug` is implemented by hand so tokens never reach logs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl Session {
    /// True when the session expires within `threshold` of `now` (or already has).
    pub fn expires_within(&self, threshold: Duration, now: DateTime<Utc>) -> bool {
        self.expires_at - now <= threshold
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// External signals that should prompt a near-expiry refresh check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSignal {
    /// The host process or client came back to the foreground.
    Resumed,
    /// Network connectivity came back after an outage.
    ConnectivityRestored,
}
