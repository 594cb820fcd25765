use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    switchboard_common::{Message, REPLY_ENDPOINT},
};

use crate::{Error, Result};

/// Outbound side of the router.
///
/// Implementations stamp `routing_endpoint` on the published message with
/// the endpoint it was sent to.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Send a message to the user on the reply endpoint.
    async fn publish_outbound(&self, msg: Message) -> Result<()>;

    /// Send a message to an application endpoint.
    async fn publish_inbound(&self, msg: Message, endpoint: &str) -> Result<()>;
}

/// A message together with the endpoint it was published on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub endpoint: String,
    pub message: Message,
}

impl Envelope {
    /// Wrap `message` for `endpoint`, setting its routing tag.
    pub fn new(endpoint: impl Into<String>, mut message: Message) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(Error::invalid_input("empty endpoint"));
        }
        message.routing_endpoint = Some(endpoint.clone());
        Ok(Self { endpoint, message })
    }

    /// Envelope for the user-facing reply endpoint.
    pub fn reply(message: Message) -> Self {
        let mut message = message;
        message.routing_endpoint = Some(REPLY_ENDPOINT.to_string());
        Self {
            endpoint: REPLY_ENDPOINT.to_string(),
            message,
        }
    }

    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.endpoint == REPLY_ENDPOINT
    }
}
