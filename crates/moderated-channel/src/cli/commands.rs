//! CLI command definitions for the Moderated Channel
//!
//! Every setting can come from a config file, and each override flag also
//! reads its environment variable.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{ChannelConfig, ConfigError};

/// Moderated Channel CLI
#[derive(Parser, Debug)]
#[command(name = "moderated-channel")]
#[command(about = "Moderated Channel - LLM-moderated chat channel for the hub", long_about = None)]
#[command(version)]
pub struct ChannelCli {
    /// Path to a TOML, YAML or JSON config file
    #[arg(short, long, global = true, env = "CHANNEL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: ChannelCommands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum ChannelCommands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5001", env = "PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },

    /// Register this channel with the hub and exit
    Register,
}

/// Flags that take precedence over the config file
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Channel display name
    #[arg(long, global = true, env = "CHANNEL_NAME")]
    pub name: Option<String>,

    /// Shared secret clients must present
    #[arg(long, global = true, env = "CHANNEL_AUTHKEY", hide_env_values = true)]
    pub authkey: Option<String>,

    /// Public URL the hub uses to reach this channel
    #[arg(long, global = true, env = "CHANNEL_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Message log snapshot file
    #[arg(long, global = true, env = "CHANNEL_STORE")]
    pub store: Option<PathBuf>,

    /// Moderation service chat URL
    #[arg(long, global = true, env = "MODERATION_URL")]
    pub moderation_url: Option<String>,

    /// Hub base URL
    #[arg(long, global = true, env = "HUB_URL")]
    pub hub_url: Option<String>,

    /// Hub registration secret
    #[arg(long, global = true, env = "HUB_AUTHKEY", hide_env_values = true)]
    pub hub_authkey: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut ChannelConfig) {
        if let Some(name) = &self.name {
            config.name = name.clone();
        }
        if let Some(authkey) = &self.authkey {
            config.authkey = authkey.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(store) = &self.store {
            config.store_path = store.clone();
        }
        if let Some(url) = &self.moderation_url {
            config.moderation.url = url.clone();
        }
        if let Some(url) = &self.hub_url {
            config.hub.url = url.clone();
        }
        if let Some(authkey) = &self.hub_authkey {
            config.hub.authkey = authkey.clone();
        }
    }
}

impl ChannelCli {
    /// Build the effective configuration: file (if any), then overrides
    pub fn load_config(&self) -> Result<ChannelConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ChannelConfig::from_file(path)?,
            None => ChannelConfig::new("", ""),
        };
        self.overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}
