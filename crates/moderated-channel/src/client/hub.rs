//! Hub registration client

use reqwest::Client;
use std::time::Duration;

use super::ClientError;
use crate::config::ChannelConfig;
use crate::contracts::ChannelRegistration;

/// Client for announcing this channel to the hub
pub struct HubClient {
    client: Client,
    base_url: String,
    authkey: String,
    timeout_ms: u64,
}

impl HubClient {
    pub fn new(
        base_url: impl Into<String>,
        authkey: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            authkey: authkey.into(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    /// Build a client from the `[hub]` section of the channel config
    pub fn from_config(config: &ChannelConfig) -> Result<Self, ClientError> {
        Self::new(
            config.hub.url.clone(),
            config.hub.authkey.clone(),
            Duration::from_millis(config.hub.timeout_ms),
        )
    }

    /// Registration payload for `config`
    pub fn registration(config: &ChannelConfig) -> ChannelRegistration {
        ChannelRegistration {
            name: config.name.clone(),
            endpoint: config.endpoint.clone(),
            authkey: config.authkey.clone(),
            type_of_service: config.type_of_service.clone(),
        }
    }

    /// Register the channel once. A non-success status is logged and returned.
    pub async fn register(&self, config: &ChannelConfig) -> Result<(), ClientError> {
        let url = format!("{}/channels", self.base_url);
        let registration = Self::registration(config);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("authkey {}", self.authkey))
            .json(&registration)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout(self.timeout_ms)
                } else {
                    ClientError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(
                channel = %registration.name,
                endpoint = %registration.endpoint,
                "Channel registered with hub"
            );
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = %message,
                "Error creating channel"
            );
            Err(ClientError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }
}
