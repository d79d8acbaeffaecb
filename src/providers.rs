//! The provider rule table.
//!
//! Each supported provider is one `ProviderSpec` entry: where the request
//! goes, how the key is attached, how the body is shaped and where the reply
//! text lives. Adding a provider means adding an entry, not a branch.

use crate::config::Endpoints;
use crate::error::{RelayError, Result};
use crate::translate::request::{anthropic_body, gemini_body, openai_body, passthrough_body};
use crate::translate::response::{
    Fallback, Segment, ANTHROPIC_PATHS, CUSTOM_PATHS, GEMINI_PATHS, OPENAI_PATHS,
};
use crate::translate::types::ChatMessage;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    OpenAi,
    Anthropic,
    Custom,
}

impl Provider {
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Custom => "custom",
        }
    }

    #[must_use]
    pub fn spec(self) -> &'static ProviderSpec {
        match self {
            Self::Gemini => &GEMINI,
            Self::OpenAi => &OPENAI,
            Self::Anthropic => &ANTHROPIC,
            Self::Custom => &CUSTOM,
        }
    }
}

impl FromStr for Provider {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        PROVIDERS
            .iter()
            .find(|p| p.provider.id() == s)
            .map(|p| p.provider)
            .ok_or_else(|| RelayError::UnsupportedProvider(s.to_string()))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Where the API key goes on the outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPlacement {
    /// `?key=` on the URL.
    QueryKey,
    /// `Authorization: Bearer`.
    Bearer,
    /// `x-api-key` plus the pinned `anthropic-version`.
    AnthropicKey,
}

impl AuthPlacement {
    pub fn apply(
        self,
        api_key: &str,
        endpoints: &Endpoints,
        url: &mut String,
        headers: &mut BTreeMap<String, String>,
    ) {
        match self {
            Self::QueryKey => {
                let sep = if url.contains('?') { '&' } else { '?' };
                url.push(sep);
                url.push_str("key=");
                url.push_str(&urlencoding::encode(api_key));
            }
            Self::Bearer => {
                headers.insert("Authorization".to_string(), format!("Bearer {}", api_key));
            }
            Self::AnthropicKey => {
                headers.insert("x-api-key".to_string(), api_key.to_string());
                headers.insert(
                    "anthropic-version".to_string(),
                    endpoints.anthropic_version.clone(),
                );
            }
        }
    }
}

pub type UrlBuilder = fn(&Endpoints, Option<&str>, Option<&str>) -> Result<String>;
pub type BodyBuilder = fn(Option<&str>, &[ChatMessage]) -> serde_json::Value;

pub struct ProviderSpec {
    pub provider: Provider,
    pub default_model: Option<&'static str>,
    pub auth: AuthPlacement,
    /// `(endpoints, model, custom_endpoint) -> url`, before auth is applied.
    pub url: UrlBuilder,
    pub body: BodyBuilder,
    pub extract: &'static [&'static [Segment]],
    pub fallback: Fallback,
}

impl fmt::Debug for ProviderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSpec")
            .field("provider", &self.provider)
            .field("default_model", &self.default_model)
            .field("auth", &self.auth)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

static GEMINI: ProviderSpec = ProviderSpec {
    provider: Provider::Gemini,
    default_model: Some(GEMINI_DEFAULT_MODEL),
    auth: AuthPlacement::QueryKey,
    url: gemini_url,
    body: gemini_body,
    extract: GEMINI_PATHS,
    fallback: Fallback::NoResponse,
};

static OPENAI: ProviderSpec = ProviderSpec {
    provider: Provider::OpenAi,
    default_model: Some(OPENAI_DEFAULT_MODEL),
    auth: AuthPlacement::Bearer,
    url: openai_url,
    body: openai_body,
    extract: OPENAI_PATHS,
    fallback: Fallback::NoResponse,
};

static ANTHROPIC: ProviderSpec = ProviderSpec {
    provider: Provider::Anthropic,
    default_model: Some(ANTHROPIC_DEFAULT_MODEL),
    auth: AuthPlacement::AnthropicKey,
    url: anthropic_url,
    body: anthropic_body,
    extract: ANTHROPIC_PATHS,
    fallback: Fallback::NoResponse,
};

static CUSTOM: ProviderSpec = ProviderSpec {
    provider: Provider::Custom,
    default_model: None,
    auth: AuthPlacement::Bearer,
    url: custom_url,
    body: passthrough_body,
    extract: CUSTOM_PATHS,
    fallback: Fallback::WholeBody,
};

/// Every supported provider, in listing order.
pub static PROVIDERS: [&ProviderSpec; 4] = [&GEMINI, &OPENAI, &ANTHROPIC, &CUSTOM];

fn gemini_url(endpoints: &Endpoints, model: Option<&str>, _custom: Option<&str>) -> Result<String> {
    Ok(format!(
        "{}/{}:generateContent",
        endpoints.gemini_base.trim_end_matches('/'),
        model.unwrap_or(GEMINI_DEFAULT_MODEL)
    ))
}

fn openai_url(endpoints: &Endpoints, _model: Option<&str>, _custom: Option<&str>) -> Result<String> {
    Ok(endpoints.openai_url.clone())
}

fn anthropic_url(
    endpoints: &Endpoints,
    _model: Option<&str>,
    _custom: Option<&str>,
) -> Result<String> {
    Ok(endpoints.anthropic_url.clone())
}

fn custom_url(_endpoints: &Endpoints, _model: Option<&str>, custom: Option<&str>) -> Result<String> {
    custom
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RelayError::config("Custom endpoint is required for custom provider"))
}
