//! Content event ingestion.
//!
//! The platform posts every freshly stored post, comment, or thread message
//! here. Evaluation happens inline; replies are scheduled in the background
//! and the response lists their tickets.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agentverse_types::agent::AgentId;
use agentverse_types::content::{ContentAuthor, ContentEvent, ContentKind};
use agentverse_types::reply::TriggerReason;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for `POST /api/v1/events`.
#[derive(Debug, Deserialize)]
pub struct SubmitEventRequest {
    /// Id of the stored content; generated when omitted.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub kind: ContentKind,
    pub text: String,
    pub author: ContentAuthor,
    #[serde(default)]
    pub parent_content: Option<String>,
    #[serde(default)]
    pub recent_messages: Vec<String>,
}

impl SubmitEventRequest {
    fn into_event(self) -> Result<ContentEvent, AppError> {
        if self.text.trim().is_empty() {
            return Err(AppError::Validation("text must not be empty".to_string()));
        }
        Ok(ContentEvent {
            id: self.id.unwrap_or_else(Uuid::now_v7),
            kind: self.kind,
            text: self.text,
            author: self.author,
            parent_content: self.parent_content,
            recent_messages: self.recent_messages,
            cascade_depth: 0,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TicketView {
    pub ticket_id: Uuid,
    pub agent_id: AgentId,
    pub delay_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct SubmitEventResponse {
    pub event_id: Uuid,
    pub tickets: Vec<TicketView>,
}

#[derive(Debug, Serialize)]
pub struct CandidateView {
    pub agent_id: AgentId,
    pub name: String,
    pub reason: TriggerReason,
}

/// POST /api/v1/events - Evaluate a content event and schedule replies.
pub async fn submit_event(
    State(state): State<AppState>,
    _auth: Authenticated,
    Json(body): Json<SubmitEventRequest>,
) -> Result<Json<ApiResponse<SubmitEventResponse>>, AppError> {
    let start = Instant::now();
    let event = body.into_event()?;
    let event_id = event.id;

    let scheduled = state.reply_service.try_handle_event(event).await?;
    let tickets = scheduled
        .into_iter()
        .map(|s| TicketView {
            ticket_id: s.ticket_id,
            agent_id: s.agent_id,
            delay_ms: s.delay.as_millis() as u64,
        })
        .collect();

    Ok(Json(
        ApiResponse::success(SubmitEventResponse { event_id, tickets }, start)
            .with_link("pending", "/api/v1/replies/pending"),
    ))
}

/// POST /api/v1/events/evaluate - Dry run: which agents would reply.
pub async fn evaluate_event(
    State(state): State<AppState>,
    _auth: Authenticated,
    Json(body): Json<SubmitEventRequest>,
) -> Result<Json<ApiResponse<Vec<CandidateView>>>, AppError> {
    let start = Instant::now();
    let event = body.into_event()?;

    let candidates = state
        .reply_service
        .evaluate(&event)
        .await?
        .into_iter()
        .map(|c| CandidateView {
            agent_id: c.agent.id,
            name: c.agent.name,
            reason: c.reason,
        })
        .collect();

    Ok(Json(ApiResponse::success(candidates, start)))
}
