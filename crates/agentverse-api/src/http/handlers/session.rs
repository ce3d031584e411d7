//! Session keep-alive signals from the host platform.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use agentverse_types::session::SessionSignal;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignalRequest {
    pub signal: SessionSignal,
}

#[derive(Debug, Serialize)]
pub struct SignalAccepted {
    pub signal: SessionSignal,
    pub accepted: bool,
}

/// POST /api/v1/session/signal - Prompt a near-expiry session check.
pub async fn post_signal(
    State(state): State<AppState>,
    _auth: Authenticated,
    Json(body): Json<SignalRequest>,
) -> Result<Json<ApiResponse<SignalAccepted>>, AppError> {
    let start = Instant::now();
    let sender = state.session_signals.as_ref().ok_or_else(|| {
        AppError::Unavailable("no hosted-backend session is managed by this server".to_string())
    })?;

    // A full queue already has a check pending.
    let accepted = sender.try_send(body.signal).is_ok();
    Ok(Json(ApiResponse::success(
        SignalAccepted {
            signal: body.signal,
            accepted,
        },
        start,
    )))
}
