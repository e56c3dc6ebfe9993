use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use cropchat_core::error::ApiError;
use cropchat_core::message::Message;
use cropchat_core::session::ConversationState;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/sessions/{session_id}", get(get_session))
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub session_id: String,
    pub state: ConversationState,
    /// Full stored transcript, including display-only image references
    pub messages: Vec<Message>,
}

/// Fetch a session transcript for display. Unlike the completion-provider
/// context, this is the complete unwindowed history with image references
/// intact.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}",
    params(
        ("session_id" = String, Path, description = "Session identifier returned by /chat")
    ),
    responses(
        (status = 200, description = "Session transcript", body = SessionResponse),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "chat"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| AppError::NotFound {
            message: format!("No session with id '{session_id}'"),
        })?;

    let session = handle.lock().await;
    Ok(Json(SessionResponse {
        session_id: session.id().to_string(),
        state: session.state(),
        messages: session.history().to_vec(),
    }))
}
