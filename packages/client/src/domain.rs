//! Value objects and pure client-side logic.
//!
//! Nothing in this module touches the network or the terminal, which keeps
//! the send/receive rules easy to test in isolation.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::ValueObjectError;

/// Conversation identifier value object.
///
/// Opaque token owned by the server. It is embedded verbatim as one path
/// segment of the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    /// Create a new ConversationId.
    ///
    /// # Arguments
    ///
    /// * `id` - The conversation identifier string
    ///
    /// # Returns
    ///
    /// A Result containing the ConversationId or an error if validation fails
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::ConversationIdEmpty);
        }
        if id
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#'))
        {
            return Err(ValueObjectError::ConversationIdInvalidFormat(id));
        }
        Ok(Self(id))
    }

    /// Start a brand-new conversation with a random UUID v4.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Decode the JSON value a chat page embeds for its conversation.
    ///
    /// Pages embed either a JSON string (`"3f2a..."`) or a bare number.
    pub fn from_embedded_json(text: &str) -> Result<Self, ValueObjectError> {
        match serde_json::from_str::<serde_json::Value>(text.trim()) {
            Ok(serde_json::Value::String(id)) => Self::new(id),
            Ok(serde_json::Value::Number(n)) => Self::new(n.to_string()),
            _ => Err(ValueObjectError::ConversationIdInvalidFormat(
                text.trim().to_string(),
            )),
        }
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Origin of the chat page: its scheme security and its host (with port).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    secure: bool,
    host: String,
}

impl Origin {
    /// Parse the origin out of an `http` or `https` page URL.
    ///
    /// Only the scheme, host and explicit port are kept; userinfo, path,
    /// query and fragment are dropped.
    pub fn parse(url: &str) -> Result<Self, ValueObjectError> {
        let invalid = || ValueObjectError::OriginInvalidFormat(url.to_string());

        let parsed = Url::parse(url.trim()).map_err(|_| invalid())?;
        let secure = match parsed.scheme() {
            "https" => true,
            "http" => false,
            _ => return Err(invalid()),
        };

        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(invalid()),
        };
        let host = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self { secure, host })
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Socket scheme mirroring the page scheme.
    pub fn socket_scheme(&self) -> &'static str {
        if self.secure { "wss" } else { "ws" }
    }

    /// Chat endpoint for the given conversation.
    pub fn chat_endpoint(&self, conversation_id: &ConversationId) -> String {
        format!(
            "{}://{}/ws/chat/{}/",
            self.socket_scheme(),
            self.host,
            conversation_id
        )
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.secure { "https" } else { "http" };
        write!(f, "{}://{}", scheme, self.host)
    }
}

/// Sender role of a rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
    System,
}

impl Role {
    /// Class name used for the role in rendered markup.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Ai => "ai",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide what, if anything, should be sent for the raw input buffer.
///
/// # Returns
///
/// `Some(trimmed)` when the trimmed text is non-empty, `None` otherwise
pub fn prepare_outgoing(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Prefix a server-reported error for display.
pub fn error_notice_text(error: &str) -> String {
    format!("Error: {}", error)
}
