use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A stored conversation message. `image_ref` is a display-only handle to an
/// uploaded image; it never crosses the completion-provider boundary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content, None)
    }

    pub fn user(content: impl Into<String>, image_ref: Option<String>) -> Self {
        Self::new(Role::User, content, image_ref)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, None)
    }

    fn new(role: Role, content: impl Into<String>, image_ref: Option<String>) -> Self {
        Self {
            role,
            content: content.into(),
            image_ref,
            created_at: Utc::now(),
        }
    }
}

/// Wire shape forwarded to the completion provider: role and text only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    /// Strips the image reference; only role and content are forwarded.
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_drops_image_ref() {
        let stored = Message::user("here is my plant", Some("img-01".to_string()));
        let wire = ChatMessage::from(&stored);
        assert_eq!(wire.role, Role::User);
        assert_eq!(wire.content, "here is my plant");
        let encoded = serde_json::to_string(&wire).expect("wire message serializes");
        assert!(!encoded.contains("image_ref"));
        assert!(!encoded.contains("img-01"));
    }

    #[test]
    fn roles_serialize_lowercase() {
        let encoded = serde_json::to_string(&ChatMessage::system("hello")).unwrap();
        assert!(encoded.contains("\"role\":\"system\""));
    }
}
