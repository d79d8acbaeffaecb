//! Shape a normalized chat request into a provider's wire request.
//!
//! Body builders are pure; `adapt` looks the provider up in the rule table and
//! assembles url, headers and body. No I/O happens here.

use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::types::{ChatMessage, ProviderRequest, Role};
use crate::config::Endpoints;
use crate::error::Result;
use crate::providers::Provider;

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 2000;

/// Everything the adapter needs from a validated request.
#[derive(Debug, Clone, Copy)]
pub struct AdaptInput<'a> {
    pub provider: &'a str,
    pub model: Option<&'a str>,
    pub messages: &'a [ChatMessage],
    pub custom_endpoint: Option<&'a str>,
    pub api_key: &'a str,
}

/// Build the provider-specific request for one call.
pub fn adapt(endpoints: &Endpoints, input: &AdaptInput<'_>) -> Result<ProviderRequest> {
    let provider: Provider = input.provider.parse()?;
    let spec = provider.spec();

    let model = input
        .model
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .or(spec.default_model);

    let mut url = (spec.url)(endpoints, model, input.custom_endpoint)?;
    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    spec.auth.apply(input.api_key, endpoints, &mut url, &mut headers);

    Ok(ProviderRequest {
        url,
        headers,
        body: (spec.body)(model, input.messages),
    })
}

/// Gemini `generateContent`. Assistant turns become `model`; everything else,
/// system turns included, is sent as `user`.
pub fn gemini_body(_model: Option<&str>, messages: &[ChatMessage]) -> Value {
    let contents: Vec<Value> = messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::Assistant => "model",
                Role::System | Role::User => "user",
            };
            json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect();

    json!({ "contents": contents })
}

pub fn openai_body(model: Option<&str>, messages: &[ChatMessage]) -> Value {
    json!({
        "model": model,
        "messages": messages,
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
    })
}

/// Anthropic Messages API. The first system turn moves to the top-level
/// `system` field; no system turn is ever left in `messages`.
pub fn anthropic_body(model: Option<&str>, messages: &[ChatMessage]) -> Value {
    let system = messages
        .iter()
        .find(|m| m.role == Role::System)
        .map(|m| m.content.clone());

    let turns: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != Role::System).collect();

    let mut body = json!({
        "model": model,
        "messages": turns,
        "max_tokens": MAX_TOKENS,
    });
    if let Some(system) = system {
        body["system"] = Value::String(system);
    }
    body
}

/// Custom endpoints get the messages untouched. `model` is not forwarded.
pub fn passthrough_body(_model: Option<&str>, messages: &[ChatMessage]) -> Value {
    json!({ "messages": messages })
}
