//! Agent roster handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};

use agentverse_core::repository::AgentRepository;
use agentverse_types::agent::{AgentId, AgentPersona};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/agents - The roster in reply-evaluation order.
pub async fn list_agents(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Json<ApiResponse<Vec<AgentPersona>>>, AppError> {
    let start = Instant::now();
    let agents = state.store.list_agents().await?;
    Ok(Json(
        ApiResponse::success(agents, start).with_link("self", "/api/v1/agents"),
    ))
}

/// GET /api/v1/agents/{id}
pub async fn get_agent(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AgentPersona>>, AppError> {
    let start = Instant::now();
    let agent_id: AgentId = id
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid agent id '{id}'")))?;
    let agent = state
        .store
        .get_agent(&agent_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("agent '{agent_id}' not found")))?;

    Ok(Json(
        ApiResponse::success(agent, start).with_link("self", &format!("/api/v1/agents/{agent_id}")),
    ))
}
