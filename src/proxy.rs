//! The dispatch path: validate, adapt, send once, normalize.
//!
//! Every outcome, including transport failures, comes back as a
//! [`Dispatched`] value; nothing here returns an error to the caller.

use crate::config::Endpoints;
use crate::error::{RelayError, Result};
use crate::logging::{DispatchRecord, SharedLogger};
use crate::translate::request::{adapt, AdaptInput};
use crate::translate::response::{extract, upstream_error_message};
use crate::translate::types::{ChatRequest, ChatResult, ProviderRequest};

use async_trait::async_trait;
use std::time::Instant;
use tracing::{info, warn};

const MISSING_FIELDS: &str = "Missing required fields: provider, apiKey, and messages are required";
const EMPTY_MESSAGES: &str = "messages must be a non-empty array";

/// Raw reply from a provider. The body is left undecoded so the dispatcher
/// decides what an unreadable body means for each status.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

/// The one outbound capability the relay needs: POST a request, get the
/// status and body back, or a transport failure.
#[async_trait]
pub trait HttpSender: Send + Sync {
    async fn send(&self, request: &ProviderRequest) -> Result<UpstreamResponse>;
}

/// `HttpSender` over a pooled `reqwest::Client`. Timeouts are whatever the
/// client was built with.
#[derive(Debug, Clone)]
pub struct ReqwestSender {
    client: reqwest::Client,
}

impl ReqwestSender {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSender for ReqwestSender {
    async fn send(&self, request: &ProviderRequest) -> Result<UpstreamResponse> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .json(&request.body)
            .send()
            .await
            // reqwest errors print the URL, which for Gemini carries the key
            .map_err(|e| RelayError::transport(format!("Request failed: {}", e.without_url())))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            RelayError::transport(format!("Failed to read response body: {}", e.without_url()))
        })?;

        Ok(UpstreamResponse { status, body })
    }
}

/// Final outcome of one call, with its HTTP classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub status: u16,
    pub result: ChatResult,
}

impl Dispatched {
    fn ok(response: String) -> Self {
        Self {
            status: 200,
            result: ChatResult::success(response),
        }
    }

    fn from_error(err: RelayError) -> Self {
        Self {
            status: err.status_code(),
            result: err.into_result(),
        }
    }
}

/// Check the inbound request and borrow what the adapter needs from it.
pub fn validate(req: &ChatRequest) -> Result<AdaptInput<'_>> {
    let provider = non_blank(req.provider.as_deref());
    let api_key = non_blank(req.api_key.as_deref());

    let (Some(provider), Some(api_key), Some(messages)) =
        (provider, api_key, req.messages.as_ref())
    else {
        return Err(RelayError::validation(MISSING_FIELDS));
    };

    let messages = match messages.as_slice() {
        Some(messages) if !messages.is_empty() => messages,
        _ => return Err(RelayError::validation(EMPTY_MESSAGES)),
    };

    Ok(AdaptInput {
        provider,
        model: req.model.as_deref(),
        messages,
        custom_endpoint: req.custom_endpoint.as_deref(),
        api_key,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Relay one chat request through the selected provider.
pub async fn dispatch(
    req: &ChatRequest,
    endpoints: &Endpoints,
    sender: &dyn HttpSender,
    logger: &SharedLogger,
) -> Dispatched {
    let started = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string();

    let mut record = DispatchRecord {
        request_id: request_id.clone(),
        provider: req.provider.clone(),
        url: None,
        status: 0,
        success: false,
        elapsed_ms: 0,
    };

    let outcome = match validate(req) {
        Ok(input) => relay(&input, endpoints, sender, &mut record).await,
        Err(e) => Dispatched::from_error(e),
    };

    record.status = outcome.status;
    record.success = outcome.result.is_success();
    record.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match &outcome.result {
        ChatResult::Success { response } => info!(
            request_id = %request_id,
            provider = record.provider.as_deref().unwrap_or("-"),
            elapsed_ms = record.elapsed_ms,
            chars = response.len(),
            "Relayed"
        ),
        ChatResult::Failure { error } => warn!(
            request_id = %request_id,
            provider = record.provider.as_deref().unwrap_or("-"),
            status = outcome.status,
            error = %error,
            "Relay failed"
        ),
    }
    logger.log_dispatch(&record);

    outcome
}

async fn relay(
    input: &AdaptInput<'_>,
    endpoints: &Endpoints,
    sender: &dyn HttpSender,
    record: &mut DispatchRecord,
) -> Dispatched {
    let request = match adapt(endpoints, input) {
        Ok(r) => r,
        Err(e) => return Dispatched::from_error(e),
    };
    record.url = Some(request.redacted_url());

    let reply = match sender.send(&request).await {
        Ok(r) => r,
        Err(e) => return Dispatched::from_error(e),
    };

    let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str(&reply.body);

    if !(200..300).contains(&reply.status) {
        let message = upstream_error_message(reply.status, parsed.as_ref().ok());
        return Dispatched::from_error(RelayError::upstream(reply.status, message));
    }

    match parsed {
        Ok(body) => Dispatched::ok(extract(input.provider, &body)),
        Err(e) => Dispatched::from_error(RelayError::transport(format!(
            "Invalid JSON from provider: {}",
            e
        ))),
    }
}
