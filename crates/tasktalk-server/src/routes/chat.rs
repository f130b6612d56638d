use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use tasktalk_schema::AgentReply;

use crate::state::AppState;

use super::{authenticate, ApiError};

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(chat))
}

/// Hand the message to the agent. The agent's contract is total, so this
/// handler has exactly one failure mode: authentication.
async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Result<Json<AgentReply>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let reply = state.agent.process_message(&user.id, &body.message).await;
    Ok(Json(reply))
}
