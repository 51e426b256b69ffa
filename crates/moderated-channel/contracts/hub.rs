//! Hub registration payload

use serde::{Deserialize, Serialize};

/// Body of `POST {hub}/channels`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRegistration {
    pub name: String,
    pub endpoint: String,
    pub authkey: String,
    pub type_of_service: String,
}
