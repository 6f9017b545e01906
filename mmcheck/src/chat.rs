//! Chat-completion requests and reply parsing.
//!
//! The same endpoint serves plain chat, role-play (system-prompt
//! persona), and image understanding; only the message content
//! changes.

use crate::error::{ApiError, Result};
use crate::message::ChatMessage;
use serde::Serialize;
use serde_json::Value;

/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "abab6.5s-chat";

/// A chat-completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Create a request for the given model and messages.
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
        }
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Assistant reply extracted from a chat-completion envelope.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// The generated text.
    pub content: String,
    /// Total tokens consumed, when reported.
    pub total_tokens: Option<u64>,
}

/// Interpret a chat-completion response envelope.
///
/// Success requires a non-empty `choices[0].message.content`; a
/// declared `base_resp` failure or a missing/empty completion becomes
/// an [`ApiError`].
pub(crate) fn parse_reply(json: &Value) -> Result<ChatReply> {
    if let Some(err) = ApiError::from_envelope(json) {
        return Err(err.into());
    }

    let content = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|choice| choice.pointer("/message/content"))
        .and_then(Value::as_str);

    match content {
        Some(text) if !text.is_empty() => Ok(ChatReply {
            content: text.to_string(),
            total_tokens: json.pointer("/usage/total_tokens").and_then(Value::as_u64),
        }),
        Some(_) => Err(ApiError::message("empty completion content").into()),
        None => Err(ApiError::message("missing choices in response").into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let request = ChatRequest::new(
            DEFAULT_CHAT_MODEL,
            vec![
                ChatMessage::system("你是一个专业的传记采访者。"),
                ChatMessage::user("你好"),
            ],
        );
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "abab6.5s-chat");
        assert_eq!(value["messages"].as_array().unwrap().len(), 2);
        assert!(value.get("temperature").is_none());
    }

    #[test]
    fn request_with_temperature() {
        let request = ChatRequest::new("abab6.5s-chat", vec![]).with_temperature(0.7);
        let value = serde_json::to_value(&request).unwrap();
        assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn two_message_reply_is_success() {
        let json = json!({
            "choices": [ { "message": { "role": "assistant", "content": "很高兴认识你" } } ],
            "usage": { "total_tokens": 42 },
            "base_resp": { "status_code": 0, "status_msg": "success" }
        });
        let reply = parse_reply(&json).unwrap();
        assert_eq!(reply.content, "很高兴认识你");
        assert_eq!(reply.total_tokens, Some(42));
    }

    #[test]
    fn declared_failure_from_envelope() {
        let json = json!({
            "base_resp": { "status_code": 1004, "status_msg": "invalid api key" }
        });
        let err = parse_reply(&json).unwrap_err();
        assert!(err.is_declared());
        assert!(err.to_string().contains("invalid api key"));
    }

    #[test]
    fn missing_choices_is_declared_not_exceptional() {
        // HTTP 200 with no choices and a quiet envelope still counts
        // as a failure the service declared, not a local error.
        let json = json!({ "base_resp": { "status_code": 0, "status_msg": "" } });
        let err = parse_reply(&json).unwrap_err();
        assert!(err.is_declared());
        assert!(err.to_string().contains("missing choices"));
    }

    #[test]
    fn empty_content_is_declared() {
        let json = json!({
            "choices": [ { "message": { "content": "" } } ]
        });
        let err = parse_reply(&json).unwrap_err();
        assert!(matches!(err, Error::Api(_)));
    }

    #[test]
    fn usage_is_optional() {
        let json = json!({
            "choices": [ { "message": { "content": "ok" } } ]
        });
        let reply = parse_reply(&json).unwrap();
        assert_eq!(reply.total_tokens, None);
    }
}
