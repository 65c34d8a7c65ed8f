//! Error types for the Kotoba chat client.

use thiserror::Error;

/// Errors related to value object validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ConversationId validation error
    #[error("ConversationId cannot be empty")]
    ConversationIdEmpty,

    /// ConversationId contains characters that cannot appear in a path segment
    #[error("ConversationId must be a single URL path segment (got: {0:?})")]
    ConversationIdInvalidFormat(String),

    /// Origin could not be parsed
    #[error("Origin must look like http://host or https://host (got: {0:?})")]
    OriginInvalidFormat(String),
}

/// Errors raised while decoding an incoming payload
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload is not valid JSON
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors raised while handing a frame to the connection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Outgoing envelope could not be encoded
    #[error("Failed to encode outgoing message: {0}")]
    Encode(String),

    /// The connection refused the frame (closed or broken)
    #[error("Failed to send message: {0}")]
    SendFailed(String),
}

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Invalid command line configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValueObjectError),

    /// The chat page could not be fetched or did not embed a conversation
    #[error("Page discovery failed: {0}")]
    PageDiscovery(String),

    /// Local I/O failure (line editor, transcript)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::PageDiscovery(e.to_string())
    }
}
