//! Moderated Channel entry point
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Runtime failure
//! - 2: Invalid configuration or registration refused by the hub

use clap::Parser;
use moderated_channel::cli::{self, ChannelCli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cli = ChannelCli::parse();

    let exit_code = cli::run_cli(cli).await;
    std::process::exit(exit_code.into());
}
