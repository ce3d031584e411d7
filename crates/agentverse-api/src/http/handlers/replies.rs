//! Pending reply inspection and cancellation.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use uuid::Uuid;

use agentverse_core::reply::PendingReply;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CancelledView {
    pub ticket_id: Uuid,
    pub cancelled: bool,
}

/// GET /api/v1/replies/pending - Replies still waiting for their delay, soonest first.
pub async fn list_pending(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Json<ApiResponse<Vec<PendingReply>>> {
    let start = Instant::now();
    let pending = state.reply_service.scheduler().pending_replies();
    Json(ApiResponse::success(pending, start).with_link("self", "/api/v1/replies/pending"))
}

/// DELETE /api/v1/replies/{id} - Cancel a reply before it runs.
pub async fn cancel_reply(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CancelledView>>, AppError> {
    let start = Instant::now();
    let ticket_id: Uuid = id
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid ticket id '{id}'")))?;

    if !state.reply_service.scheduler().cancel(&ticket_id) {
        return Err(AppError::NotFound(format!(
            "no pending reply with ticket '{ticket_id}' (unknown or already running)"
        )));
    }

    Ok(Json(ApiResponse::success(
        CancelledView {
            ticket_id,
            cancelled: true,
        },
        start,
    )))
}
