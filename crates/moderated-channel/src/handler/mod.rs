//! HTTP handler for the Moderated Channel
//!
//! The handler module is organized into:
//! - `routes`: `GET /health`, `GET /`, `POST /`, `GET /metrics`
//! - `middleware`: shared-secret authorization applied to every route
//!
//! Authorization runs before any handler, so a rejected request never
//! reaches the store or the moderation service.

pub mod middleware;
pub mod routes;

pub use middleware::{is_authorized, require_authkey};
pub use routes::{create_router, ApiError};

use std::net::SocketAddr;
use std::sync::Arc;

use crate::client::{HttpModerationClient, Moderator};
use crate::config::ChannelConfig;
use crate::engine::InboundPipeline;
use crate::error::Result;
use crate::store::{FileMessageStore, MessageStore};
use crate::telemetry::ChannelMetrics;

/// Application state shared by all routes
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ChannelConfig>,
    pub pipeline: Arc<InboundPipeline>,
    pub metrics: Arc<ChannelMetrics>,
}

impl AppState {
    /// Wire the pipeline from explicit collaborators
    pub fn new(
        config: ChannelConfig,
        moderator: Arc<dyn Moderator>,
        store: Arc<dyn MessageStore>,
    ) -> Result<Self> {
        let metrics = Arc::new(ChannelMetrics::new()?);
        let pipeline = Arc::new(InboundPipeline::new(moderator, store, Arc::clone(&metrics)));

        Ok(Self {
            config: Arc::new(config),
            pipeline,
            metrics,
        })
    }

    /// Production wiring: HTTP moderation client and file-backed store
    pub fn from_config(config: ChannelConfig) -> Result<Self> {
        config.validate()?;
        let moderator = HttpModerationClient::new(&config.moderation, config.policy_prompt.clone())?;
        tracing::info!(
            moderation_url = moderator.url(),
            timeout_ms = moderator.timeout_ms(),
            "Moderation client ready"
        );
        let store = FileMessageStore::new(config.store_path.clone());
        Self::new(config, Arc::new(moderator), Arc::new(store))
    }
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "Channel listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Channel stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}
