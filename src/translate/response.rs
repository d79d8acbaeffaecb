//! Normalize provider replies into plain text.
//!
//! Extraction never fails outward: a reply that does not have the expected
//! shape degrades to a sentinel string and the call still counts as a success.

use serde_json::Value;

use crate::providers::{Provider, ProviderSpec};

pub const NO_RESPONSE: &str = "No response generated";
pub const UNKNOWN_FORMAT: &str = "Unknown response format";
pub const PARSE_FAILURE: &str = "Error parsing response";

/// One step into a JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Key(&'static str),
    Index(usize),
}

use Segment::{Index, Key};

/// What to return when none of a provider's paths hold text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    NoResponse,
    WholeBody,
}

const GEMINI_TEXT: &[Segment] = &[
    Key("candidates"),
    Index(0),
    Key("content"),
    Key("parts"),
    Index(0),
    Key("text"),
];
const OPENAI_TEXT: &[Segment] = &[Key("choices"), Index(0), Key("message"), Key("content")];
const ANTHROPIC_TEXT: &[Segment] = &[Key("content"), Index(0), Key("text")];

pub const GEMINI_PATHS: &[&[Segment]] = &[GEMINI_TEXT];
pub const OPENAI_PATHS: &[&[Segment]] = &[OPENAI_TEXT];
pub const ANTHROPIC_PATHS: &[&[Segment]] = &[ANTHROPIC_TEXT];
pub const CUSTOM_PATHS: &[&[Segment]] = &[
    &[Key("response")],
    &[Key("message")],
    &[Key("text")],
    OPENAI_TEXT,
    ANTHROPIC_TEXT,
];

/// The reply is not a JSON object, so no path can apply.
#[derive(Debug)]
struct Malformed;

/// Pull the generated text out of a provider reply.
pub fn extract(provider: &str, body: &Value) -> String {
    match provider.parse::<Provider>() {
        Ok(p) => extract_with(p.spec(), body),
        Err(_) => UNKNOWN_FORMAT.to_string(),
    }
}

pub fn extract_with(spec: &ProviderSpec, body: &Value) -> String {
    match first_text(body, spec.extract) {
        Ok(Some(text)) => text,
        Ok(None) => match spec.fallback {
            Fallback::NoResponse => NO_RESPONSE.to_string(),
            Fallback::WholeBody => body.to_string(),
        },
        Err(Malformed) => {
            tracing::debug!(provider = %spec.provider, "Unexpected reply shape");
            PARSE_FAILURE.to_string()
        }
    }
}

fn first_text(body: &Value, paths: &[&[Segment]]) -> Result<Option<String>, Malformed> {
    if !body.is_object() {
        return Err(Malformed);
    }
    Ok(paths
        .iter()
        .find_map(|path| follow(body, path).and_then(leaf_text)))
}

/// Walk one path. A missing key, a short array or a node of the wrong type
/// all mean this path is absent.
fn follow<'a>(body: &'a Value, path: &[Segment]) -> Option<&'a Value> {
    path.iter().try_fold(body, |node, segment| match (segment, node) {
        (Key(key), Value::Object(map)) => map.get(*key),
        (Index(i), Value::Array(items)) => items.get(*i),
        _ => None,
    })
}

/// `null` and empty strings count as absent; other scalars and objects are
/// rendered as JSON text.
fn leaf_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Caller-facing message for a non-success upstream reply.
///
/// `error` as a string is used verbatim; as an object its `message` wins
/// (rendered like an extracted leaf), otherwise the whole object is
/// serialized. Anything else gets a generic message naming the status.
pub fn upstream_error_message(status: u16, body: Option<&Value>) -> String {
    let generic = || format!("Provider returned status {}", status);

    match body.and_then(|b| b.get("error")) {
        Some(Value::String(message)) if !message.is_empty() => message.clone(),
        Some(err @ Value::Object(fields)) => fields
            .get("message")
            .and_then(leaf_text)
            .unwrap_or_else(|| err.to_string()),
        _ => generic(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gemini_text() {
        let body = json!({"candidates": [{"content": {"parts": [{"text": "hi"}]}}]});
        assert_eq!(extract("gemini", &body), "hi");
    }

    #[test]
    fn test_gemini_empty_body() {
        assert_eq!(extract("gemini", &json!({})), NO_RESPONSE);
        assert_eq!(extract("gemini", &json!({"candidates": []})), NO_RESPONSE);
    }

    #[test]
    fn test_openai_text() {
        let body = json!({"choices": [{"message": {"content": "hi"}}]});
        assert_eq!(extract("openai", &body), "hi");
    }

    #[test]
    fn test_openai_null_content() {
        let body = json!({"choices": [{"message": {"content": null, "tool_calls": []}}]});
        assert_eq!(extract("openai", &body), NO_RESPONSE);
    }

    #[test]
    fn test_anthropic_text() {
        let body = json!({"content": [{"type": "text", "text": "hi"}]});
        assert_eq!(extract("anthropic", &body), "hi");
    }

    #[test]
    fn test_custom_field_precedence() {
        assert_eq!(extract("custom", &json!({"response": "r", "message": "m"})), "r");
        assert_eq!(extract("custom", &json!({"message": "m", "text": "t"})), "m");
        assert_eq!(extract("custom", &json!({"text": "t"})), "t");
        assert_eq!(
            extract("custom", &json!({"choices": [{"message": {"content": "c"}}]})),
            "c"
        );
        assert_eq!(extract("custom", &json!({"content": [{"text": "a"}]})), "a");
    }

    #[test]
    fn test_custom_falls_back_to_whole_body() {
        let body = json!({"foo": "bar"});
        assert_eq!(extract("custom", &body), r#"{"foo":"bar"}"#);
    }

    #[test]
    fn test_custom_empty_response_falls_through() {
        assert_eq!(extract("custom", &json!({"response": "", "text": "t"})), "t");
    }

    #[test]
    fn test_non_string_leaf_is_rendered() {
        assert_eq!(extract("custom", &json!({"response": 42})), "42");
    }

    #[test]
    fn test_unknown_provider() {
        assert_eq!(extract("cohere", &json!({"text": "x"})), UNKNOWN_FORMAT);
    }

    #[test]
    fn test_wrong_type_on_path_is_absent() {
        assert_eq!(extract("gemini", &json!({"candidates": "oops"})), NO_RESPONSE);
        assert_eq!(extract("openai", &json!({"choices": [42]})), NO_RESPONSE);
    }

    #[test]
    fn test_custom_skips_mistyped_path() {
        let body = json!({"choices": {"0": 1}, "content": [{"text": "a"}]});
        assert_eq!(extract("custom", &body), "a");
    }

    #[test]
    fn test_custom_unrecognised_content_falls_back_to_body() {
        let body = json!({"content": "hello"});
        assert_eq!(extract("custom", &body), r#"{"content":"hello"}"#);
    }

    #[test]
    fn test_non_object_body_degrades() {
        assert_eq!(extract("anthropic", &Value::Null), PARSE_FAILURE);
        assert_eq!(extract("openai", &json!("plain text")), PARSE_FAILURE);
        assert_eq!(extract("custom", &json!([1, 2])), PARSE_FAILURE);
    }

    #[test]
    fn test_upstream_error_string() {
        let body = json!({"error": "quota exceeded"});
        assert_eq!(upstream_error_message(429, Some(&body)), "quota exceeded");
    }

    #[test]
    fn test_upstream_error_object_message() {
        let body = json!({"error": {"message": "bad key", "type": "authentication_error"}});
        assert_eq!(upstream_error_message(401, Some(&body)), "bad key");
    }

    #[test]
    fn test_upstream_error_object_without_message() {
        let body = json!({"error": {"code": 7}});
        assert_eq!(upstream_error_message(500, Some(&body)), r#"{"code":7}"#);
    }

    #[test]
    fn test_upstream_error_non_string_message() {
        let body = json!({"error": {"message": 404, "status": "NOT_FOUND"}});
        assert_eq!(upstream_error_message(404, Some(&body)), "404");
    }

    #[test]
    fn test_upstream_error_generic() {
        assert_eq!(
            upstream_error_message(503, Some(&json!({"detail": "down"}))),
            "Provider returned status 503"
        );
        assert_eq!(upstream_error_message(502, None), "Provider returned status 502");
    }
}
