//! Moderation service HTTP client
//!
//! Sends one stateless `user` turn per inbound message: the channel policy
//! prompt followed by the message text and sender name. Prior channel
//! history is never forwarded.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{ClientError, Moderator};
use crate::config::ModerationConfig;
use crate::contracts::{ConversationTurn, ModerationReply, ModerationRequest};

/// Compose the single user turn sent to the model
pub fn build_user_text(policy_prompt: &str, content: &str, sender: &str) -> String {
    format!(
        "{} {} the name of the user is {}, address them nicely",
        policy_prompt, content, sender
    )
}

/// reqwest-backed moderation client
pub struct HttpModerationClient {
    client: Client,
    url: String,
    policy_prompt: String,
    timeout_ms: u64,
}

impl HttpModerationClient {
    /// Create a client for `config.url` with the configured timeout
    pub fn new(
        config: &ModerationConfig,
        policy_prompt: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            policy_prompt: policy_prompt.into(),
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn build_request(&self, user_text: &str, sender: &str, images: &[String]) -> ModerationRequest {
        ModerationRequest {
            conversation_history: vec![ConversationTurn::user(
                build_user_text(&self.policy_prompt, user_text, sender),
                images.to_vec(),
            )],
        }
    }
}

#[async_trait]
impl Moderator for HttpModerationClient {
    async fn classify(
        &self,
        user_text: &str,
        sender: &str,
        images: &[String],
    ) -> Result<String, ClientError> {
        let request = self.build_request(user_text, sender, images);

        let response = self
            .client
            .post(&self.url)
            .json(&request)
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
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                body = %message,
                "Moderation service returned an error status"
            );
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let reply: ModerationReply = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        Ok(reply.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpModerationClient {
        let config = ModerationConfig {
            url: "http://localhost:9/chat".to_string(),
            timeout_ms: 250,
        };
        HttpModerationClient::new(&config, "POLICY").unwrap()
    }

    #[test]
    fn test_build_user_text() {
        assert_eq!(
            build_user_text("POLICY", "How long do I boil eggs?", "Ada"),
            "POLICY How long do I boil eggs? the name of the user is Ada, address them nicely"
        );
    }

    #[test]
    fn test_request_is_single_user_turn() {
        let request = client().build_request("hi", "Ada", &[]);
        assert_eq!(request.conversation_history.len(), 1);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["conversation_history"][0]["role"], "user");
        assert_eq!(
            json["conversation_history"][0]["images"],
            serde_json::json!([])
        );
        assert!(json["conversation_history"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("POLICY hi"));
    }

    #[test]
    fn test_client_accessors() {
        let client = client();
        assert_eq!(client.url(), "http://localhost:9/chat");
        assert_eq!(client.timeout_ms(), 250);
    }
}
