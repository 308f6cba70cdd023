//! Conversation data model and the chat endpoint request body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Type-tag stored on every chat history record.
pub const CHAT_KIND: &str = "chat";

/// Title used when the first user message has no text.
pub const DEFAULT_TITLE: &str = "New chat";

/// Maximum number of characters kept from the first user message when
/// deriving a record title.
pub const TITLE_MAX_CHARS: usize = 50;

/// The author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation.
    User,
    /// The model's reply.
    Assistant,
}

impl Role {
    /// The wire name: `"user"` or `"assistant"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A file attached to a user message, already base64 encoded.
///
/// Attachments travel with the request that carries them and stay on the
/// in-memory message for display, but are never written to history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Base64 encoded file contents (no `data:` prefix).
    pub data_base64: String,
    /// MIME type of the file, e.g. `image/png` or `application/pdf`.
    pub mime_type: String,
}

impl Attachment {
    /// Create an attachment from already-encoded data.
    pub fn new(data_base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data_base64: data_base64.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message.
    pub role: Role,
    /// Message text. Grows in place while an assistant reply streams.
    pub content: String,
    /// Optional attached file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl Message {
    /// A user message with the given text.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachment: None,
        }
    }

    /// An assistant message with the given text.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            attachment: None,
        }
    }

    /// An empty assistant message, inserted before any delta arrives.
    pub fn placeholder() -> Self {
        Self::assistant(String::new())
    }

    /// Attach a file to this message.
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// A copy of this message with the attachment removed.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            role: self.role,
            content: self.content.clone(),
            attachment: None,
        }
    }
}

/// Strip attachments from every message before it is persisted.
pub fn sanitize_messages(messages: &[Message]) -> Vec<Message> {
    messages.iter().map(Message::sanitized).collect()
}

/// Derive a record title from the first user message.
///
/// Only the first line is used. Titles longer than [`TITLE_MAX_CHARS`] are cut
/// and end in `...`.
pub fn derive_title(messages: &[Message]) -> String {
    let first = messages
        .iter()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.trim())
        .unwrap_or_default();
    let line = first.lines().next().unwrap_or_default().trim();
    if line.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    if line.chars().count() <= TITLE_MAX_CHARS {
        return line.to_string();
    }
    let cut: String = line.chars().take(TITLE_MAX_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// A persisted conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Opaque record id (UUID v4).
    pub id: String,
    /// Owning user id. Every store operation is scoped by it.
    pub user_id: String,
    /// Display title.
    pub title: String,
    /// Type-tag, [`CHAT_KIND`] for chat history.
    #[serde(rename = "type")]
    pub kind: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time. Lists are ordered by it, newest first.
    pub updated_at: DateTime<Utc>,
    /// Ordered conversation, without attachments.
    pub messages: Vec<Message>,
}

impl ChatRecord {
    /// Build a fresh chat record with a new id and both timestamps set to now.
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, messages: &[Message]) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title.into(),
            kind: CHAT_KIND.to_string(),
            created_at: now,
            updated_at: now,
            messages: sanitize_messages(messages),
        }
    }

    /// Replace the messages and bump `updated_at`.
    pub fn set_messages(&mut self, messages: &[Message]) {
        self.messages = sanitize_messages(messages);
        self.touch();
    }

    /// Replace the title and bump `updated_at`.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    fn touch(&mut self) {
        let now = Utc::now();
        // updated_at is strictly increasing per record, even within clock resolution.
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::microseconds(1)
        };
    }
}

/// Sort records newest first by `updated_at`.
pub fn sort_newest_first(records: &mut [ChatRecord]) {
    records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// A message as it appears in the request body: role and text only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMessage {
    /// Who wrote the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

/// JSON body POSTed to the chat endpoint.
///
/// ```json
/// { "messages": [{"role": "user", "content": "hi"}], "fileBase64": "...", "fileType": "image/png" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, oldest first.
    pub messages: Vec<RequestMessage>,
    /// Base64 contents of the file attached to the latest message.
    #[serde(rename = "fileBase64", default, skip_serializing_if = "Option::is_none")]
    pub file_base64: Option<String>,
    /// MIME type of the attached file.
    #[serde(rename = "fileType", default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl ChatRequest {
    /// Build a request from the in-memory conversation.
    ///
    /// The attachment of the last message, if it is a user message carrying
    /// one, is lifted into `fileBase64` / `fileType`. Earlier attachments were
    /// already answered and are not resent.
    pub fn from_history(messages: &[Message]) -> Self {
        let (file_base64, file_type) = match messages.last() {
            Some(Message {
                role: Role::User,
                attachment: Some(att),
                ..
            }) => (Some(att.data_base64.clone()), Some(att.mime_type.clone())),
            _ => (None, None),
        };
        Self {
            messages: messages
                .iter()
                .map(|m| RequestMessage {
                    role: m.role,
                    content: m.content.clone(),
                })
                .collect(),
            file_base64,
            file_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn placeholder_is_empty_assistant() {
        let msg = Message::placeholder();
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.content.is_empty());
        assert!(msg.attachment.is_none());
    }

    #[test]
    fn sanitized_drops_attachment() {
        let msg = Message::user("look").with_attachment(Attachment::new("AAAA", "image/png"));
        let clean = msg.sanitized();
        assert_eq!(clean.content, "look");
        assert!(clean.attachment.is_none());
    }

    #[test]
    fn title_uses_first_user_line() {
        let messages = vec![
            Message::assistant("welcome"),
            Message::user("  What is a derivative?\nExplain slowly"),
        ];
        assert_eq!(derive_title(&messages), "What is a derivative?");
    }

    #[test]
    fn title_truncates_long_text() {
        let long = "a".repeat(80);
        let title = derive_title(&[Message::user(long)]);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 3);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn title_counts_chars_not_bytes() {
        let text = "é".repeat(TITLE_MAX_CHARS);
        assert_eq!(derive_title(&[Message::user(text.clone())]), text);
    }

    #[test]
    fn title_defaults_when_empty() {
        assert_eq!(derive_title(&[]), DEFAULT_TITLE);
        assert_eq!(derive_title(&[Message::user("   ")]), DEFAULT_TITLE);
    }

    #[test]
    fn record_new_sanitizes_and_tags() {
        let messages = vec![Message::user("hi").with_attachment(Attachment::new("x", "image/png"))];
        let record = ChatRecord::new("u1", "hi", &messages);
        assert_eq!(record.kind, CHAT_KIND);
        assert_eq!(record.created_at, record.updated_at);
        assert!(record.messages[0].attachment.is_none());
        assert!(uuid::Uuid::parse_str(&record.id).is_ok());
    }

    #[test]
    fn touch_always_moves_forward() {
        let mut record = ChatRecord::new("u1", "t", &[]);
        let before = record.updated_at;
        record.set_title("t2");
        assert!(record.updated_at > before);
        let mid = record.updated_at;
        record.set_messages(&[Message::user("x")]);
        assert!(record.updated_at > mid);
    }

    #[test]
    fn record_serializes_kind_as_type() {
        let record = ChatRecord::new("u1", "t", &[]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "chat");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn request_lifts_last_attachment() {
        let messages = vec![
            Message::user("first").with_attachment(Attachment::new("OLD", "image/jpeg")),
            Message::assistant("ok"),
            Message::user("solve this").with_attachment(Attachment::new("NEW", "application/pdf")),
        ];
        let req = ChatRequest::from_history(&messages);
        assert_eq!(req.messages.len(), 3);
        assert_eq!(req.file_base64.as_deref(), Some("NEW"));
        assert_eq!(req.file_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn request_without_attachment_omits_file_fields() {
        let req = ChatRequest::from_history(&[Message::user("hi")]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"messages": [{"role": "user", "content": "hi"}]}));
    }

    #[test]
    fn request_ignores_stale_attachment() {
        let messages = vec![
            Message::user("pic").with_attachment(Attachment::new("OLD", "image/png")),
            Message::assistant("seen"),
        ];
        let req = ChatRequest::from_history(&messages);
        assert!(req.file_base64.is_none());
        assert!(req.file_type.is_none());
    }
}
