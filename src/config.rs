use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub endpoints: Endpoints,
}

/// Upstream locations for the built-in providers. The request and response
/// shapes are fixed; only where they are sent can be repointed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_gemini_base")]
    pub gemini_base: String,
    #[serde(default = "default_openai_url")]
    pub openai_url: String,
    #[serde(default = "default_anthropic_url")]
    pub anthropic_url: String,
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_anthropic_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_anthropic_version() -> String {
    "2023-06-01".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gemini_base: default_gemini_base(),
            openai_url: default_openai_url(),
            anthropic_url: default_anthropic_url(),
            anthropic_version: default_anthropic_version(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            endpoints: Endpoints::default(),
        }
    }
}

impl RelayConfig {
    /// Load config from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::settings(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Search standard locations for a config file.
    /// Priority: CLI arg > CWD > XDG config > home dir > built-in defaults
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        for candidate in config_search_paths() {
            if candidate.exists() {
                tracing::info!(path = %candidate.display(), "Loading config");
                return Self::load(&candidate);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load the file, then layer `PORT` and finally the command-line port.
    pub fn resolve(explicit_path: Option<&Path>, cli_port: Option<u16>) -> Result<Self> {
        let mut config = Self::find_and_load(explicit_path)?;
        config.apply_env()?;
        if let Some(port) = cli_port {
            config.port = port;
        }
        Ok(config)
    }

    /// Apply the `PORT` environment variable on top of the file value.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var(PORT_ENV) {
            self.port = parse_port(&raw)?;
        }
        Ok(())
    }
}

fn parse_port(raw: &str) -> Result<u16> {
    raw.trim().parse::<u16>().map_err(|_| {
        RelayError::settings(format!("{} must be a port number, got '{}'", PORT_ENV, raw))
    })
}

pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("chat-relay.toml")];

    if cfg!(target_os = "macos") {
        if let Some(home) = home_dir() {
            paths.push(
                home.join("Library")
                    .join("Application Support")
                    .join("chat-relay")
                    .join("config.toml"),
            );
        }
    } else {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("chat-relay").join("config.toml"));
        }
        if let Some(home) = home_dir() {
            paths.push(home.join(".config").join("chat-relay").join("config.toml"));
        }
    }

    if let Some(home) = home_dir() {
        paths.push(home.join(".chat-relay.toml"));
    }

    paths
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
