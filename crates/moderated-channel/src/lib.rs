//! Moderated Channel
//!
//! A hub-registered chat channel. Every inbound message is sent to a remote
//! language model together with a policy prompt; the model's verdict decides
//! whether the message is kept or replaced by a server warning, and the
//! model's reply is appended as a server message. The log keeps at most
//! `MESSAGE_WINDOW` entries, oldest evicted first.
//!
//! # Design Principles
//! - Authorized: every route requires `Authorization: authkey <secret>`
//! - Fail closed: no verdict means no write
//! - Serialized: the read-modify-write of the log runs under one lock

pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod store;
pub mod telemetry;

// Re-export contracts
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use config::ChannelConfig;
pub use contracts::*;
pub use error::{ChannelError, Result};

/// Crate version reported at startup
pub const CHANNEL_VERSION: &str = env!("CARGO_PKG_VERSION");
