// src/core/types.rs - Chat domain types shared by every layer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Conversation type a session was created in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatMode {
    /// Plain text chat.
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "image_gen")]
    ImageGen,
    #[serde(rename = "video_gen")]
    VideoGen,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Default => "default",
            ChatMode::ImageGen => "image_gen",
            ChatMode::VideoGen => "video_gen",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChatMode(pub String);

impl fmt::Display for UnknownChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown chat mode '{}'", self.0)
    }
}

impl std::error::Error for UnknownChatMode {}

impl FromStr for ChatMode {
    type Err = UnknownChatMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(ChatMode::Default),
            "image_gen" => Ok(ChatMode::ImageGen),
            "video_gen" => Ok(ChatMode::VideoGen),
            other => Err(UnknownChatMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
}

/// User-supplied media sent along with a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    /// Transient reference for display (e.g. a blob URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Encoded payload kept for persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub mime_type: String,
}

impl Attachment {
    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Image,
            url: None,
            data: Some(data.into()),
            mime_type: mime_type.into(),
        }
    }

    pub fn video(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Video,
            url: None,
            data: Some(data.into()),
            mime_type: mime_type.into(),
        }
    }
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub text: String,
    /// Generated still image (model output).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Generated video reference (model output).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_thinking: Option<bool>,
}

impl Message {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            image: None,
            video: None,
            attachment: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
            is_thinking: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_video(mut self, video: impl Into<String>) -> Self {
        self.video = Some(video.into());
        self
    }
}

/// Session metadata row: what the history list shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    /// Last updated, epoch milliseconds.
    pub timestamp: i64,
    pub mode: ChatMode,
}

/// The whole message history of one session, as stored and as measured
/// by the usage report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHistory {
    pub session_id: String,
    pub messages: Vec<Message>,
}

/// Fresh opaque identifier for a new conversation.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_mode_str_roundtrip() {
        for mode in [ChatMode::Default, ChatMode::ImageGen, ChatMode::VideoGen] {
            assert_eq!(mode.as_str().parse::<ChatMode>().unwrap(), mode);
        }
        assert!("voice".parse::<ChatMode>().is_err());
    }

    #[test]
    fn test_message_json_shape() {
        let msg = Message {
            id: "m1".into(),
            role: Role::User,
            text: "look".into(),
            image: None,
            video: None,
            attachment: Some(Attachment::image("AAAA", "image/png")),
            timestamp: 1_700_000_000_000,
            is_thinking: None,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["attachment"]["type"], "image");
        assert_eq!(json["attachment"]["mimeType"], "image/png");
        assert!(json.get("isThinking").is_none());
        assert!(json.get("image").is_none());
    }

    #[test]
    fn test_message_parses_minimal_json() {
        let msg: Message =
            serde_json::from_str(r#"{"id":"x","role":"model","timestamp":5}"#).unwrap();
        assert_eq!(msg.role, Role::Model);
        assert!(msg.text.is_empty());
        assert!(msg.attachment.is_none());
    }

    #[test]
    fn test_session_mode_serializes_snake() {
        let s = ChatSession {
            id: "s".into(),
            title: "t".into(),
            timestamp: 1,
            mode: ChatMode::VideoGen,
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["mode"], "video_gen");
    }

    #[test]
    fn test_history_uses_session_id_key() {
        let h = MessageHistory {
            session_id: "abc".into(),
            messages: vec![],
        };
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, r#"{"sessionId":"abc","messages":[]}"#);
    }

    #[test]
    fn test_new_session_ids_unique() {
        assert_ne!(new_session_id(), new_session_id());
    }
}
