use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::gate::GateDecision;
use crate::handoff::AnalysisHandoff;
use crate::identification::IdentificationResult;
use crate::message::Message;

/// Seed system prompt every session starts from.
pub const SEED_SYSTEM_PROMPT: &str =
    "You are a helpful assistant for crop disease identification and advice.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// Answer turns normally.
    Normal,
    /// A low-confidence (or failed) identification asked the user for a
    /// symptom description; the next user message is treated as that
    /// description whatever it says.
    AwaitingSymptoms,
}

/// Per-session conversation state: append-only message history, the symptom
/// elicitation state, and the most recent identification awaiting context
/// injection.
///
/// `history[0]` is always the seed system message. History only grows for
/// the life of the session; messages are never mutated or removed.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: String,
    history: Vec<Message>,
    state: ConversationState,
    pending_identification: Option<IdentificationResult>,
    summary_injected: bool,
}

impl ConversationSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history: vec![Message::system(SEED_SYSTEM_PROMPT)],
            state: ConversationState::Normal,
            pending_identification: None,
            summary_injected: false,
        }
    }

    /// Session seeded from an out-of-band capture step. The seed system
    /// prompt is extended with the analysis summary and an assistant message
    /// presents it, so the summary is already in context and is not injected
    /// again.
    pub fn seeded_from_handoff(id: impl Into<String>, handoff: &AnalysisHandoff) -> Self {
        let summary = handoff.summary();
        let system = format!(
            "{SEED_SYSTEM_PROMPT} The user has already analyzed a crop image with the \
             following results: {summary}. Use this information to provide detailed advice \
             about growing conditions, disease treatment, and best practices for the \
             identified crop."
        );
        let assistant = format!(
            "I've analyzed your crop image and here are the results:\n\n{summary}\n\n\
             How can I help you with more information about this crop or any advice on \
             cultivation or treatment?"
        );

        Self {
            id: id.into(),
            history: vec![Message::system(system), Message::assistant(assistant)],
            state: ConversationState::Normal,
            pending_identification: Some(handoff.to_identification()),
            summary_injected: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn pending_identification(&self) -> Option<&IdentificationResult> {
        self.pending_identification.as_ref()
    }

    pub fn summary_injected(&self) -> bool {
        self.summary_injected
    }

    pub fn push_user(&mut self, content: impl Into<String>, image_ref: Option<String>) {
        self.history.push(Message::user(content, image_ref));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.history.push(Message::assistant(content));
    }

    /// Attach a fresh image-derived identification and apply the gate's
    /// decision: `ElicitSymptoms` enters the symptom wait, `Direct` stays
    /// in (or returns to) normal conversation. The new result has not been
    /// injected into model context yet.
    pub fn attach_identification(
        &mut self,
        result: IdentificationResult,
        decision: GateDecision,
    ) {
        self.pending_identification = Some(result);
        self.summary_injected = false;
        self.state = match decision {
            GateDecision::Direct => ConversationState::Normal,
            GateDecision::ElicitSymptoms => ConversationState::AwaitingSymptoms,
        };
    }

    /// The symptom wait ends on the very next user-authored turn, whatever
    /// its content. Callers build the outbound context first so the symptom
    /// preamble still sees the waiting state.
    pub fn observe_user_turn(&mut self) {
        if self.state == ConversationState::AwaitingSymptoms {
            self.state = ConversationState::Normal;
        }
    }

    /// Record that the pending identification's summary was injected into
    /// model context, so it is never injected twice.
    pub fn mark_summary_injected(&mut self) {
        self.summary_injected = true;
    }
}
