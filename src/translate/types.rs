//! Wire types shared by the adapter, the normalizer and the HTTP surface.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Inbound (what callers send TO us)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Every field is optional here so validation, not the JSON decoder, decides
/// what a missing field looks like to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<MessageList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_endpoint: Option<String>,
}

/// The `messages` field as sent. A value that is not a JSON array is kept
/// as-is so validation can reject it with its own message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageList {
    Sequence(Vec<ChatMessage>),
    NotASequence(serde_json::Value),
}

impl MessageList {
    #[must_use]
    pub fn as_slice(&self) -> Option<&[ChatMessage]> {
        match self {
            Self::Sequence(messages) => Some(messages),
            Self::NotASequence(_) => None,
        }
    }
}

impl From<Vec<ChatMessage>> for MessageList {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self::Sequence(messages)
    }
}

impl Serialize for MessageList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Sequence(messages) => messages.serialize(serializer),
            Self::NotASequence(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for MessageList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            array @ serde_json::Value::Array(_) => serde_json::from_value(array)
                .map(Self::Sequence)
                .map_err(D::Error::custom),
            other => Ok(Self::NotASequence(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound (what we send TO the provider)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: serde_json::Value,
}

impl ProviderRequest {
    /// URL with any `key=` query value masked, safe to log.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let Some((base, query)) = self.url.split_once('?') else {
            return self.url.clone();
        };
        let masked: Vec<String> = query
            .split('&')
            .map(|pair| match pair.split_once('=') {
                Some(("key", _)) => "key=***".to_string(),
                _ => pair.to_string(),
            })
            .collect();
        format!("{}?{}", base, masked.join("&"))
    }
}

// ---------------------------------------------------------------------------
// Result (what we send BACK to the caller)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatResult {
    Success { response: String },
    Failure { error: String },
}

impl ChatResult {
    pub fn success(response: impl Into<String>) -> Self {
        Self::Success {
            response: response.into(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Serialize, Deserialize)]
struct ChatResultWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Serialize for ChatResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Success { response } => ChatResultWire {
                success: true,
                response: Some(response.clone()),
                error: None,
            },
            Self::Failure { error } => ChatResultWire {
                success: false,
                response: None,
                error: Some(error.clone()),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ChatResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = ChatResultWire::deserialize(deserializer)?;
        match (wire.success, wire.response, wire.error) {
            (true, Some(response), _) => Ok(Self::Success { response }),
            (false, _, Some(error)) => Ok(Self::Failure { error }),
            (true, None, _) => Err(D::Error::missing_field("response")),
            (false, _, None) => Err(D::Error::missing_field("error")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_uses_camel_case_keys() {
        let req: ChatRequest = serde_json::from_value(json!({
            "provider": "custom",
            "apiKey": "k",
            "customEndpoint": "https://llm.internal/v1/chat",
            "messages": [{"role": "system", "content": "be brief"}]
        }))
        .unwrap();

        assert_eq!(req.api_key.as_deref(), Some("k"));
        assert_eq!(
            req.custom_endpoint.as_deref(),
            Some("https://llm.internal/v1/chat")
        );
        let messages = req.messages.as_ref().and_then(MessageList::as_slice).unwrap();
        assert_eq!(messages[0].role, Role::System);
        assert!(req.model.is_none());
    }

    #[test]
    fn test_messages_that_are_not_an_array_still_decode() {
        let req: ChatRequest = serde_json::from_value(json!({
            "provider": "openai",
            "apiKey": "k",
            "messages": "hi"
        }))
        .unwrap();
        assert_eq!(req.messages, Some(MessageList::NotASequence(json!("hi"))));

        let req: ChatRequest = serde_json::from_value(json!({"messages": null})).unwrap();
        assert!(req.messages.is_none());
    }

    #[test]
    fn test_bad_message_inside_array_is_rejected() {
        let parsed: Result<ChatRequest, _> = serde_json::from_value(json!({
            "messages": [{"role": "tool", "content": "x"}]
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let parsed: Result<ChatMessage, _> =
            serde_json::from_value(json!({"role": "tool", "content": "x"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_result_wire_shape() {
        assert_eq!(
            serde_json::to_value(ChatResult::success("hi")).unwrap(),
            json!({"success": true, "response": "hi"})
        );
        assert_eq!(
            serde_json::to_value(ChatResult::failure("nope")).unwrap(),
            json!({"success": false, "error": "nope"})
        );
    }

    #[test]
    fn test_result_rejects_success_without_response() {
        let parsed: Result<ChatResult, _> = serde_json::from_value(json!({"success": true}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_redacted_url_masks_key_only() {
        let req = ProviderRequest {
            url: "https://g.example/models/m:generateContent?key=secret&alt=json".to_string(),
            headers: BTreeMap::new(),
            body: json!({}),
        };
        assert_eq!(
            req.redacted_url(),
            "https://g.example/models/m:generateContent?key=***&alt=json"
        );
    }

    #[test]
    fn test_redacted_url_without_query_is_unchanged() {
        let req = ProviderRequest {
            url: "https://api.openai.com/v1/chat/completions".to_string(),
            headers: BTreeMap::new(),
            body: json!({}),
        };
        assert_eq!(req.redacted_url(), req.url);
    }
}
