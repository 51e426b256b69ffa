//! Channel configuration
//!
//! A single `ChannelConfig` is built at startup (file, then CLI/env
//! overrides) and shared as `Arc<ChannelConfig>` with every component.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Policy prompt prepended to every user message
pub const DEFAULT_POLICY_PROMPT: &str = r#"You are a helpful manager and assistant of a cooking channel. You can help the user with any cooking related question. When a user provides a recipe always provide an estimate of the main 8 nutritional facts, also provide suggestions or tips that can help the user.
If the user requests anything that is not related to cooking or includes any harmful content, please inform the user that this channel is not targeted towards the requested content, and explain why the exact request is not allowed.
Strictly respond in json format with the following structure:
in case of a valid response {
    "response": "Here are some tips for the recipe you provided...",
    "allowed": true
}
in case of an invalid response {
    "response": "This channel is not targeted towards the requested content...",
    "allowed": false
}.
This is the user's request:
"#;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel display name, reported by `GET /health` and to the hub
    pub name: String,

    /// Public URL the hub uses to reach this channel
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Shared secret expected in `Authorization: authkey <secret>`
    pub authkey: String,

    /// Snapshot file holding the message log
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Service-type tag sent at registration
    #[serde(default = "default_type_of_service")]
    pub type_of_service: String,

    /// Prompt prepended to each inbound message before moderation
    #[serde(default = "default_policy_prompt")]
    pub policy_prompt: String,

    /// Maximum accepted request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default)]
    pub moderation: ModerationConfig,

    #[serde(default)]
    pub hub: HubConfig,
}

/// Remote moderation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Full URL of the chat endpoint
    #[serde(default = "default_moderation_url")]
    pub url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            url: default_moderation_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Hub registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_hub_url")]
    pub url: String,

    #[serde(default)]
    pub authkey: String,

    /// Registration request timeout in milliseconds
    #[serde(default = "default_hub_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            url: default_hub_url(),
            authkey: String::new(),
            timeout_ms: default_hub_timeout_ms(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:5001".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("messages.json")
}

fn default_type_of_service() -> String {
    "aiweb24:chat".to_string()
}

fn default_policy_prompt() -> String {
    DEFAULT_POLICY_PROMPT.to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_moderation_url() -> String {
    "http://localhost:8080/chat".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_hub_url() -> String {
    "http://localhost:5555".to_string()
}

fn default_hub_timeout_ms() -> u64 {
    10_000
}

impl ChannelConfig {
    /// Create a configuration with defaults for everything but identity
    pub fn new(name: impl Into<String>, authkey: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: default_endpoint(),
            authkey: authkey.into(),
            store_path: default_store_path(),
            type_of_service: default_type_of_service(),
            policy_prompt: default_policy_prompt(),
            max_body_bytes: default_max_body_bytes(),
            moderation: ModerationConfig::default(),
            hub: HubConfig::default(),
        }
    }

    /// Load from a TOML, YAML or JSON file, chosen by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "json" => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(format!("TOML error: {}", e)))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(format!("YAML error: {}", e)))
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(format!("JSON error: {}", e)))
    }

    /// Expected value of the `Authorization` header
    pub fn authorization_header(&self) -> String {
        format!("authkey {}", self.authkey)
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".into()));
        }
        if self.authkey.is_empty() {
            return Err(ConfigError::Invalid("authkey must not be empty".into()));
        }
        if self.moderation.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "moderation.timeout_ms must be greater than zero".into(),
            ));
        }
        if self.hub.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "hub.timeout_ms must be greater than zero".into(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".into(),
            ));
        }
        for (field, url) in [
            ("endpoint", &self.endpoint),
            ("moderation.url", &self.moderation.url),
            ("hub.url", &self.hub.url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be an http(s) URL, got '{}'",
                    field, url
                )));
            }
        }
        Ok(())
    }
}
