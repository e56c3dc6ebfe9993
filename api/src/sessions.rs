use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use cropchat_core::handoff::AnalysisHandoff;
use cropchat_core::session::ConversationSession;

/// In-memory session registry. Sessions live for the process lifetime;
/// nothing is persisted and nothing expires. Each session sits behind its
/// own mutex so two requests carrying the same id serialize their
/// read-modify-append cycles instead of interleaving them.
pub struct SessionStore {
    handoff: Option<AnalysisHandoff>,
    sessions: Mutex<HashMap<String, Arc<Mutex<ConversationSession>>>>,
}

impl SessionStore {
    /// `handoff`, when present, seeds every newly created session with the
    /// out-of-band analysis results.
    pub fn new(handoff: Option<AnalysisHandoff>) -> Self {
        Self {
            handoff,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a session, or create one when the id is absent or unknown.
    /// New sessions always get a fresh generated id, which the returned
    /// value echoes so callers can continue the conversation.
    pub async fn get_or_create(
        &self,
        requested: Option<&str>,
    ) -> (String, Arc<Mutex<ConversationSession>>) {
        let mut sessions = self.sessions.lock().await;

        if let Some(id) = requested {
            if let Some(existing) = sessions.get(id) {
                return (id.to_string(), existing.clone());
            }
        }

        let id = Uuid::now_v7().to_string();
        let session = match &self.handoff {
            Some(handoff) => ConversationSession::seeded_from_handoff(id.clone(), handoff),
            None => ConversationSession::new(id.clone()),
        };
        let handle = Arc::new(Mutex::new(session));
        sessions.insert(id.clone(), handle.clone());
        (id, handle)
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<ConversationSession>>> {
        self.sessions.lock().await.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropchat_core::message::Role;
    use serde_json::json;

    #[tokio::test]
    async fn creates_a_fresh_session_when_no_id_is_supplied() {
        let store = SessionStore::new(None);
        let (id, handle) = store.get_or_create(None).await;
        assert!(!id.is_empty());

        let session = handle.lock().await;
        assert_eq!(session.id(), id);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].role, Role::System);
    }

    #[tokio::test]
    async fn known_id_returns_the_same_session() {
        let store = SessionStore::new(None);
        let (id, first) = store.get_or_create(None).await;
        first.lock().await.push_user("hello", None);

        let (echoed, second) = store.get_or_create(Some(&id)).await;
        assert_eq!(echoed, id);
        assert_eq!(second.lock().await.history().len(), 2);
    }

    #[tokio::test]
    async fn unknown_id_creates_a_session_under_a_fresh_id() {
        let store = SessionStore::new(None);
        let (id, _) = store.get_or_create(Some("not-a-real-session")).await;
        assert_ne!(id, "not-a-real-session");
        assert!(store.get("not-a-real-session").await.is_none());
        assert!(store.get(&id).await.is_some());
    }

    #[tokio::test]
    async fn handoff_seeds_every_new_session() {
        let handoff: AnalysisHandoff = serde_json::from_value(json!({
            "success": true,
            "crops": [{"name": "Tomato", "scientific_name": "Solanum lycopersicum", "confidence": 91.0}],
            "diseases": [],
            "raw_data": {}
        }))
        .unwrap();

        let store = SessionStore::new(Some(handoff));
        let (_, handle) = store.get_or_create(None).await;
        let session = handle.lock().await;
        assert_eq!(session.history().len(), 2);
        assert!(session.history()[1].content.contains("Tomato"));
        assert!(session.pending_identification().is_some());
    }
}
