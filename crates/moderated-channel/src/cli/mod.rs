//! CLI module for the Moderated Channel
//!
//! `serve` runs the HTTP channel; `register` announces it to the hub once.

pub mod commands;

pub use commands::{ChannelCli, ChannelCommands, ConfigOverrides};

use std::net::SocketAddr;

use crate::client::HubClient;
use crate::error::{ChannelError, Result};
use crate::handler::{self, AppState};

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Clean shutdown or successful registration
    Success = 0,
    /// Runtime failure (bind, store, moderation or hub unreachable)
    InternalError = 1,
    /// Invalid configuration or a registration the hub refused
    InvalidInput = 2,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    pub fn from_error(err: &ChannelError) -> Self {
        if err.is_user_error() {
            ExitCode::InvalidInput
        } else {
            ExitCode::InternalError
        }
    }
}

/// Run the CLI to completion
pub async fn run(cli: ChannelCli) -> Result<()> {
    let config = cli.load_config()?;

    match cli.command {
        ChannelCommands::Serve { port, host } => {
            let addr: SocketAddr = format!("{}:{}", host, port).parse().map_err(|e| {
                crate::config::ConfigError::Invalid(format!("bad listen address: {}", e))
            })?;

            tracing::info!(
                channel = %config.name,
                store = %config.store_path.display(),
                version = crate::CHANNEL_VERSION,
                "Starting Moderated Channel"
            );

            let state = AppState::from_config(config)?;
            handler::serve(state, addr).await
        }

        ChannelCommands::Register => {
            let hub = HubClient::from_config(&config)?;
            hub.register(&config).await?;
            Ok(())
        }
    }
}

/// Run the CLI and map the outcome to a process exit code
pub async fn run_cli(cli: ChannelCli) -> ExitCode {
    match run(cli).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            tracing::error!(error = %e, "Moderated Channel failed");
            eprintln!("Error: {}", e);
            ExitCode::from_error(&e)
        }
    }
}
