//! Message envelope exchanged between the user-facing transport, the router
//! and downstream application endpoints.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Endpoint on which every message addressed to the user is published.
pub const REPLY_ENDPOINT: &str = "default";

/// Marks the start or end of an interactive dialogue with an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionEvent {
    /// A new dialogue begins. `new` is accepted for compatibility with
    /// transports that use that spelling.
    #[serde(alias = "new")]
    Start,
    Resume,
    Close,
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Resume => write!(f, "resume"),
            Self::Close => write!(f, "close"),
        }
    }
}

/// A single user or application message.
///
/// Received messages are never mutated; [`Message::reply`] and
/// [`Message::forwarded`] build new instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "new_message_id")]
    pub message_id: String,
    pub from_addr: String,
    #[serde(default)]
    pub to_addr: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_event: Option<SessionEvent>,
    #[serde(default)]
    pub transport_name: String,
    /// Endpoint tag used when the message crosses between router and
    /// application processes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub helper_metadata: serde_json::Map<String, serde_json::Value>,
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

impl Message {
    /// Build a user-originated message with a fresh id.
    pub fn inbound(
        from_addr: impl Into<String>,
        to_addr: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            message_id: new_message_id(),
            from_addr: from_addr.into(),
            to_addr: to_addr.into(),
            content: Some(content.into()),
            session_event: None,
            transport_name: String::new(),
            routing_endpoint: None,
            in_reply_to: None,
            helper_metadata: serde_json::Map::new(),
        }
    }

    /// Parse a message from a single JSON document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let msg: Self = serde_json::from_str(raw)?;
        if msg.from_addr.is_empty() {
            return Err(Error::missing_field("from_addr"));
        }
        Ok(msg)
    }

    /// Text content, or the empty string for content-less events.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Whether the sender expects the dialogue to continue after this message.
    pub fn continues_session(&self) -> bool {
        self.session_event != Some(SessionEvent::Close)
    }

    /// Build a reply addressed back to the sender.
    ///
    /// With `continue_session == false` the reply carries a close event so
    /// the transport ends the dialogue.
    pub fn reply(&self, content: impl Into<String>, continue_session: bool) -> Self {
        Self {
            message_id: new_message_id(),
            from_addr: self.to_addr.clone(),
            to_addr: self.from_addr.clone(),
            content: Some(content.into()),
            session_event: (!continue_session).then_some(SessionEvent::Close),
            transport_name: self.transport_name.clone(),
            routing_endpoint: None,
            in_reply_to: Some(self.message_id.clone()),
            helper_metadata: self.helper_metadata.clone(),
        }
    }

    /// Copy of this message carrying only a session event, used when the
    /// router opens or closes a dialogue with an application endpoint.
    pub fn forwarded(&self, event: SessionEvent) -> Self {
        Self {
            content: None,
            session_event: Some(event),
            ..self.clone()
        }
    }
}
