use crate::identification::IdentificationResult;
use crate::message::{ChatMessage, Role};
use crate::session::{ConversationSession, ConversationState};

/// Most recent stored messages forwarded per turn. Injected context rides on
/// top of the window and does not count against it.
pub const CONTEXT_WINDOW_MESSAGES: usize = 10;

/// Which context message, if any, was prepended this turn. Never more than
/// one per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    None,
    /// Diagnostic-expert preamble quoting the user's symptom description.
    SymptomPreamble,
    /// One-time summary of the pending identification.
    CropSummary,
}

/// The exact message list to submit to the completion provider.
#[derive(Debug, Clone)]
pub struct BuiltContext {
    pub messages: Vec<ChatMessage>,
    pub injection: Injection,
}

/// Assemble the outbound context for the current turn.
///
/// The window is the last [`CONTEXT_WINDOW_MESSAGES`] stored messages with
/// image references stripped. On top of it, exactly one of three mutually
/// exclusive rules applies, in priority order:
///
/// 1. Awaiting a symptom description and the latest message is the user's:
///    prepend the diagnostic-expert preamble quoting that message.
/// 2. A pending identification exists whose summary has not been injected
///    yet: prepend the summary preamble.
/// 3. Otherwise the window is forwarded unmodified.
///
/// Callers persist the `CropSummary` injection via
/// [`ConversationSession::mark_summary_injected`] so rule 2 fires once per
/// identification.
pub fn build_context(session: &ConversationSession) -> BuiltContext {
    let history = session.history();
    let start = history.len().saturating_sub(CONTEXT_WINDOW_MESSAGES);
    let mut messages: Vec<ChatMessage> = history[start..].iter().map(ChatMessage::from).collect();

    if session.state() == ConversationState::AwaitingSymptoms {
        if let Some(latest) = history.last().filter(|message| message.role == Role::User) {
            messages.insert(0, ChatMessage::system(symptom_preamble(&latest.content)));
            return BuiltContext {
                messages,
                injection: Injection::SymptomPreamble,
            };
        }
    }

    if let Some(result) = session.pending_identification() {
        if !session.summary_injected() {
            messages.insert(0, ChatMessage::system(summary_preamble(result)));
            return BuiltContext {
                messages,
                injection: Injection::CropSummary,
            };
        }
    }

    BuiltContext {
        messages,
        injection: Injection::None,
    }
}

fn symptom_preamble(symptoms: &str) -> String {
    format!(
        "You are an agricultural expert and plant pathologist. The user has provided both \
         an image of their crop and a description of symptoms. Based on the image analysis \
         and the user's description of symptoms: '{symptoms}', provide a detailed diagnosis \
         and treatment plan. Include both preventative measures and remedies if applicable. \
         Be specific and consider both organic and conventional treatment options."
    )
}

fn summary_preamble(result: &IdentificationResult) -> String {
    let mut content = format!(
        "You are a crop disease identification expert. The user has uploaded a crop image \
         that has been analyzed with the following results:\n\n{}\n\n",
        result.summary()
    );
    if result.diseases.is_empty() {
        content.push_str(
            "No specific disease was detected with high confidence. Ask the user about any \
             symptoms they observe. ",
        );
    }
    content.push_str(
        "Use this information to provide detailed advice on cultivation, disease \
         management, and best practices for this crop.",
    );
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{self, GateDecision, DEFAULT_CONFIDENCE_THRESHOLD};
    use crate::identification::{
        DiseasePrediction, IdentificationResult, ParseOutcome, SpeciesPrediction,
    };
    use crate::normalize::normalize;
    use serde_json::json;

    fn confident_result() -> IdentificationResult {
        IdentificationResult {
            species: vec![SpeciesPrediction {
                common_name: "Tomato".to_string(),
                scientific_name: "Solanum lycopersicum".to_string(),
                confidence: 0.91,
            }],
            diseases: vec![DiseasePrediction {
                name: "Leaf Rust".to_string(),
                confidence: 0.77,
                description: None,
                treatments: vec!["Apply fungicide".to_string()],
            }],
            health_status: None,
            recommendations: Vec::new(),
            raw_payload: json!({}),
            parse_outcome: ParseOutcome::Recognized,
        }
    }

    fn injected_system_count(context: &BuiltContext, session_len: usize) -> usize {
        // everything beyond the stored window must be injected context
        context.messages.len() - session_len.min(CONTEXT_WINDOW_MESSAGES)
    }

    #[test]
    fn plain_turn_forwards_window_unmodified() {
        let mut session = ConversationSession::new("s-1");
        session.push_user("hello", None);
        let context = build_context(&session);
        assert_eq!(context.injection, Injection::None);
        assert_eq!(context.messages.len(), 2);
        assert_eq!(context.messages[0].role, Role::System);
        assert_eq!(context.messages[1].content, "hello");
    }

    #[test]
    fn window_keeps_only_the_most_recent_ten_messages() {
        let mut session = ConversationSession::new("s-2");
        for i in 0..14 {
            session.push_user(format!("message {i}"), None);
        }
        // 15 stored messages, no injection applicable
        assert_eq!(session.history().len(), 15);

        let context = build_context(&session);
        assert_eq!(context.messages.len(), CONTEXT_WINDOW_MESSAGES);
        assert_eq!(context.messages[0].content, "message 4");
        assert_eq!(context.messages[9].content, "message 13");
    }

    #[test]
    fn window_plus_single_injection_never_exceeds_eleven() {
        let mut session = ConversationSession::new("s-3");
        for i in 0..14 {
            session.push_user(format!("message {i}"), None);
        }
        session.attach_identification(confident_result(), GateDecision::Direct);

        let context = build_context(&session);
        assert_eq!(context.injection, Injection::CropSummary);
        assert_eq!(context.messages.len(), CONTEXT_WINDOW_MESSAGES + 1);
    }

    #[test]
    fn image_refs_are_stripped_from_forwarded_messages() {
        let mut session = ConversationSession::new("s-4");
        session.push_user("[Image uploaded for crop analysis]", Some("img-7".to_string()));
        let context = build_context(&session);
        let encoded = serde_json::to_string(&context.messages).unwrap();
        assert!(!encoded.contains("img-7"));
        assert!(!encoded.contains("image_ref"));
    }

    #[test]
    fn symptom_turn_injects_expert_preamble_quoting_user() {
        let mut session = ConversationSession::new("s-5");
        session.attach_identification(
            IdentificationResult::fallback(json!({})),
            GateDecision::ElicitSymptoms,
        );
        session.push_user("yellow spots on the lower leaves", None);

        let context = build_context(&session);
        assert_eq!(context.injection, Injection::SymptomPreamble);
        assert_eq!(context.messages[0].role, Role::System);
        assert!(context.messages[0]
            .content
            .contains("'yellow spots on the lower leaves'"));
        assert!(context.messages[0]
            .content
            .contains("agricultural expert and plant pathologist"));
        assert_eq!(injected_system_count(&context, session.history().len()), 1);
    }

    #[test]
    fn symptom_rule_wins_over_summary_rule() {
        let mut session = ConversationSession::new("s-6");
        session.attach_identification(
            IdentificationResult::fallback(json!({})),
            GateDecision::ElicitSymptoms,
        );
        session.push_user("wilting despite watering", None);

        // pending identification present and not injected, but the symptom
        // preamble takes priority and remains the only injection
        let context = build_context(&session);
        assert_eq!(context.injection, Injection::SymptomPreamble);
        assert_eq!(injected_system_count(&context, session.history().len()), 1);
    }

    #[test]
    fn awaiting_state_without_user_turn_does_not_inject_symptom_preamble() {
        let mut session = ConversationSession::new("s-7");
        session.attach_identification(confident_result(), GateDecision::ElicitSymptoms);
        // latest message is the seed system message, not user-authored;
        // rule 2 applies instead
        let context = build_context(&session);
        assert_eq!(context.injection, Injection::CropSummary);
    }

    #[test]
    fn summary_is_injected_once_per_identification() {
        let mut session = ConversationSession::new("s-8");
        session.attach_identification(confident_result(), GateDecision::Direct);
        session.push_user("tell me more", None);

        let context = build_context(&session);
        assert_eq!(context.injection, Injection::CropSummary);
        session.mark_summary_injected();

        session.push_user("and watering advice?", None);
        let next = build_context(&session);
        assert_eq!(next.injection, Injection::None);
    }

    #[test]
    fn summary_preamble_asks_for_symptoms_when_no_diseases_found() {
        let mut result = confident_result();
        result.diseases.clear();
        let preamble = summary_preamble(&result);
        assert!(preamble.contains("No specific disease was detected with high confidence."));
    }

    #[test]
    fn confident_analysis_flows_into_a_single_summary_injection() {
        // normalized provider payload -> gate -> context build, end to end
        let raw = json!({
            "analysis": {
                "plant_species": [
                    {"common_name": "Tomato", "scientific_name": "Solanum lycopersicum", "confidence": 0.91}
                ],
                "diseases": [
                    {"name": "Leaf Rust", "confidence": 0.77, "treatments": ["Apply fungicide"]}
                ]
            }
        });
        let result = normalize(&raw);
        let decision = gate::assess(&result, DEFAULT_CONFIDENCE_THRESHOLD);
        assert_eq!(decision, GateDecision::Direct);

        let mut session = ConversationSession::new("s-9");
        session.attach_identification(result, decision);
        session.push_user("what should I do about it?", None);

        let context = build_context(&session);
        assert_eq!(context.injection, Injection::CropSummary);
        let injected = &context.messages[0];
        assert_eq!(injected.role, Role::System);
        assert!(injected.content.contains("Leaf Rust"));
        assert!(injected.content.contains("77.00%"));
        assert_eq!(injected_system_count(&context, session.history().len()), 1);
    }
}
