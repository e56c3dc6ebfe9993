use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cropchat_core::context::{Injection, build_context};
use cropchat_core::error::{ApiError, ProviderError};
use cropchat_core::gate::{self, DEFAULT_CONFIDENCE_THRESHOLD, GateDecision};
use cropchat_core::identification::IdentificationResult;
use cropchat_core::normalize::normalize;
use cropchat_core::session::ConversationSession;

use crate::error::AppError;
use crate::state::AppState;

/// Stored user message for an image turn that carried no text.
const IMAGE_PLACEHOLDER: &str = "[Image uploaded for crop analysis]";

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChatRequest {
    /// Free-text user message
    pub content: Option<String>,
    /// Base64-encoded image to identify before replying
    pub image_base64: Option<String>,
    /// Session to continue; omitted on first contact
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ChatResponse {
    /// The assistant's reply for this turn
    pub response: String,
    /// Echo this back to continue the same conversation
    pub session_id: String,
}

/// One conversation turn: text, an image, or both.
///
/// An image turn runs the identification provider and answers with the
/// rendered analysis directly; depending on confidence, the reply either
/// presents the results or asks for a symptom description. A text turn
/// forwards the windowed history (plus at most one injected context message)
/// to the completion provider. Provider failures become user-visible replies,
/// never 5xx responses.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply for this turn", body = ChatResponse),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let content = req.content.unwrap_or_default();
    let image_bytes = decode_image(req.image_base64.as_deref())?;

    let (session_id, handle) = state.sessions.get_or_create(req.session_id.as_deref()).await;
    let mut session = handle.lock().await;

    if let Some(bytes) = image_bytes {
        let image_ref = format!("img-{}", Uuid::now_v7());
        if !content.is_empty() {
            session.push_user(&content, Some(image_ref.clone()));
        }
        let outcome = state.identification.analyze(&bytes).await;
        let reply =
            apply_identification_outcome(&mut session, content.is_empty(), image_ref, outcome);
        session.push_assistant(reply.clone());
        return Ok(Json(ChatResponse {
            response: reply,
            session_id,
        }));
    }

    let sent_user_message = !content.is_empty();
    if sent_user_message {
        session.push_user(&content, None);
    }

    // Build the context before resolving the symptom wait so the diagnostic
    // preamble still sees the waiting state.
    let built = build_context(&session);
    if sent_user_message {
        session.observe_user_turn();
    }
    if built.injection == Injection::CropSummary {
        session.mark_summary_injected();
    }

    let reply = match state.completion.complete(&built.messages).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, "completion request failed");
            format!("I encountered an error while processing your request: {err}")
        }
    };
    session.push_assistant(reply.clone());

    Ok(Json(ChatResponse {
        response: reply,
        session_id,
    }))
}

fn decode_image(encoded: Option<&str>) -> Result<Option<Vec<u8>>, AppError> {
    match encoded.filter(|value| !value.is_empty()) {
        Some(value) => BASE64
            .decode(value)
            .map(Some)
            .map_err(|err| AppError::Validation {
                message: format!("image_base64 is not valid base64: {err}"),
                field: Some("image_base64".to_string()),
                received: None,
                docs_hint: Some("Encode the raw image bytes with standard base64.".to_string()),
            }),
        None => Ok(None),
    }
}

/// Record the outcome of an identification call against the session and
/// render the assistant reply for the image turn.
///
/// Success attaches the normalized result and gates on confidence; failure
/// attaches a fallback result and enters the symptom wait, so a provider
/// outage degrades into the same path as a low-confidence identification
/// instead of blocking the user.
fn apply_identification_outcome(
    session: &mut ConversationSession,
    had_no_text: bool,
    image_ref: String,
    outcome: Result<serde_json::Value, ProviderError>,
) -> String {
    match outcome {
        Ok(raw) => {
            let result = normalize(&raw);
            let decision = gate::assess(&result, DEFAULT_CONFIDENCE_THRESHOLD);
            let summary = result.summary();
            if had_no_text {
                session.push_user(IMAGE_PLACEHOLDER, Some(image_ref));
            }
            session.attach_identification(result, decision);
            match decision {
                GateDecision::Direct => direct_reply(&summary),
                GateDecision::ElicitSymptoms => elicit_reply(&summary),
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "identification request failed");
            session.attach_identification(
                IdentificationResult::fallback(serde_json::json!({ "error": err.to_string() })),
                GateDecision::ElicitSymptoms,
            );
            // A failure carries nothing worth injecting into model context
            // later; the symptom preamble covers the follow-up turn.
            session.mark_summary_injected();
            failure_reply(&err)
        }
    }
}

fn direct_reply(summary: &str) -> String {
    format!(
        "I've analyzed your crop image and here are the results:\n\n{summary}\n\n\
         Would you like more specific information about these crops or advice on \
         cultivation and disease management?"
    )
}

fn elicit_reply(summary: &str) -> String {
    format!(
        "I've analyzed your crop image, but I'm not entirely confident about the \
         identification:\n\n{summary}\n\n\
         Could you please describe any symptoms you observe? For example:\n\
         - What color changes do you see on the leaves?\n\
         - Are there spots, wilting, or unusual growth?\n\
         - When did you first notice these issues?\n\
         - What part of the plant is affected?\n\n\
         This will help me provide a more accurate analysis."
    )
}

fn failure_reply(err: &ProviderError) -> String {
    format!(
        "I encountered an issue while analyzing your image: {err}\n\n\
         Instead, could you please describe the symptoms you're observing on your crop? \
         Details about leaf color, spots, wilting, or any unusual patterns will help me \
         provide a better diagnosis."
    )
}
