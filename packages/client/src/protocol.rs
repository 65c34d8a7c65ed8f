//! WebSocket message DTOs for the conversation endpoint.
//!
//! Outgoing frames carry only the user's text. Incoming frames are decoded
//! into [`IncomingEnvelope`], a closed set of variants; anything the client
//! does not understand becomes [`IncomingEnvelope::Unrecognized`].

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Tag the server uses for assistant replies.
pub const AI_RESPONSE_TYPE: &str = "ai_response";

/// Message sent from the client to the conversation endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub message: String,
}

impl OutgoingMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Encode as the JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Shape of an incoming object before it is classified.
///
/// Fields are kept as raw JSON values so that a wrongly typed field makes the
/// frame unrecognized instead of failing the whole decode.
#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    r#type: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Message received from the conversation endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingEnvelope {
    /// Assistant turn to render
    AiResponse(String),
    /// Server-reported failure to render as a system turn
    ErrorNotice(String),
    /// Well-formed JSON the client has no rendering for
    Unrecognized,
}

impl IncomingEnvelope {
    /// Decode one text frame.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Malformed` if the payload is not JSON at all.
    pub fn decode(payload: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(payload)?;
        if !value.is_object() {
            return Ok(Self::Unrecognized);
        }

        let raw: RawEnvelope = serde_json::from_value(value)?;
        Ok(Self::classify(raw))
    }

    fn classify(raw: RawEnvelope) -> Self {
        let is_ai_response = raw
            .r#type
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .is_some_and(|t| t == AI_RESPONSE_TYPE);

        if is_ai_response {
            return match raw.message {
                Some(serde_json::Value::String(text)) => Self::AiResponse(text),
                _ => Self::Unrecognized,
            };
        }

        match raw.error {
            Some(serde_json::Value::String(error)) if !error.is_empty() => {
                Self::ErrorNotice(error)
            }
            _ => Self::Unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outgoing_message_to_json() {
        // テスト項目: 送信メッセージが {"message": ...} 形式にエンコードされる
        // given (前提条件):
        let msg = OutgoingMessage::new("Hello \"world\"");

        // when (操作):
        let json = msg.to_json().unwrap();

        // then (期待する結果):
        assert_eq!(json, r#"{"message":"Hello \"world\""}"#);
    }

    #[test]
    fn test_decode_ai_response() {
        // テスト項目: ai_response がアシスタント応答として解釈される
        // given (前提条件):
        let payload = r#"{"type":"ai_response","message":"**hi**"}"#;

        // when (操作):
        let result = IncomingEnvelope::decode(payload).unwrap();

        // then (期待する結果):
        assert_eq!(result, IncomingEnvelope::AiResponse("**hi**".to_string()));
    }

    #[test]
    fn test_decode_ai_response_ignores_extra_fields() {
        // テスト項目: is_final などの追加フィールドは無視される
        // given (前提条件):
        let payload = r#"{"type":"ai_response","message":"done","is_final":true}"#;

        // when (操作):
        let result = IncomingEnvelope::decode(payload).unwrap();

        // then (期待する結果):
        assert_eq!(result, IncomingEnvelope::AiResponse("done".to_string()));
    }

    #[test]
    fn test_decode_error_notice() {
        // テスト項目: error フィールドがエラー通知として解釈される
        // given (前提条件):
        let payload = r#"{"error":"rate limited"}"#;

        // when (操作):
        let result = IncomingEnvelope::decode(payload).unwrap();

        // then (期待する結果):
        assert_eq!(
            result,
            IncomingEnvelope::ErrorNotice("rate limited".to_string())
        );
    }

    #[test]
    fn test_decode_ai_response_takes_precedence_over_error() {
        // テスト項目: type が ai_response の場合は error より優先される
        // given (前提条件):
        let payload = r#"{"type":"ai_response","message":"ok","error":"ignored"}"#;

        // when (操作):
        let result = IncomingEnvelope::decode(payload).unwrap();

        // then (期待する結果):
        assert_eq!(result, IncomingEnvelope::AiResponse("ok".to_string()));
    }

    #[test]
    fn test_decode_unknown_shapes_are_unrecognized() {
        // テスト項目: 未知の形式はエラーにならず Unrecognized になる
        // given (前提条件):
        let payloads = [
            r#"{"type":"unknown_type"}"#,
            r#"{}"#,
            r#"{"error":""}"#,
            r#"{"error":42}"#,
            r#"{"type":"ai_response"}"#,
            r#"{"type":"ai_response","message":null}"#,
            r#"{"type":7,"message":"x"}"#,
            r#"[1,2,3]"#,
            r#""text""#,
            r#"null"#,
        ];

        for payload in payloads {
            // when (操作):
            let result = IncomingEnvelope::decode(payload).unwrap();

            // then (期待する結果):
            assert_eq!(result, IncomingEnvelope::Unrecognized, "{payload}");
        }
    }

    #[test]
    fn test_decode_malformed_payload() {
        // テスト項目: JSON として解析できないペイロードは Malformed エラーになる
        // given (前提条件):
        let payload = "not json {";

        // when (操作):
        let result = IncomingEnvelope::decode(payload);

        // then (期待する結果):
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }
}
