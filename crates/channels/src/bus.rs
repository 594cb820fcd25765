//! In-process gateway: one bounded mpsc queue per endpoint.

use {
    async_trait::async_trait,
    dashmap::DashMap,
    switchboard_common::{Message, REPLY_ENDPOINT},
    tokio::sync::mpsc,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use switchboard_metrics::{channels as ch_metrics, counter};

use crate::{Envelope, Error, MessageGateway, Result};

const DEFAULT_CAPACITY: usize = 64;

/// Endpoint registry backed by tokio channels.
///
/// Consumers [`register`](Self::register) an endpoint and drain the returned
/// receiver. Publishing to an endpoint nobody registered fails with
/// [`Error::UnknownEndpoint`]; publishing after the receiver was dropped
/// fails with [`Error::Closed`].
pub struct ChannelBus {
    senders: DashMap<String, mpsc::Sender<Message>>,
    capacity: usize,
}

impl Default for ChannelBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            senders: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Register (or replace) the consumer for `endpoint`.
    pub fn register(&self, endpoint: impl Into<String>) -> mpsc::Receiver<Message> {
        let endpoint = endpoint.into();
        let (tx, rx) = mpsc::channel(self.capacity);
        if self.senders.insert(endpoint.clone(), tx).is_some() {
            debug!(endpoint = %endpoint, "replaced endpoint consumer");
        }
        rx
    }

    /// Register the user-facing reply endpoint.
    pub fn register_reply(&self) -> mpsc::Receiver<Message> {
        self.register(REPLY_ENDPOINT)
    }

    /// Remove the consumer for `endpoint`. Returns whether one existed.
    pub fn unregister(&self, endpoint: &str) -> bool {
        self.senders.remove(endpoint).is_some()
    }

    /// Registered endpoint names, sorted.
    pub fn endpoints(&self) -> Vec<String> {
        let mut names: Vec<String> = self.senders.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    async fn deliver(&self, envelope: Envelope) -> Result<()> {
        let Envelope { endpoint, message } = envelope;
        // Clone the sender out so no map guard is held across the await.
        let Some(tx) = self.senders.get(&endpoint).map(|e| e.value().clone()) else {
            warn!(endpoint = %endpoint, "no consumer registered");
            #[cfg(feature = "metrics")]
            counter!(ch_metrics::UNDELIVERABLE_TOTAL, "endpoint" => endpoint.clone()).increment(1);
            return Err(Error::unknown_endpoint(endpoint));
        };
        if tx.send(message).await.is_err() {
            self.senders.remove(&endpoint);
            #[cfg(feature = "metrics")]
            counter!(ch_metrics::UNDELIVERABLE_TOTAL, "endpoint" => endpoint.clone()).increment(1);
            return Err(Error::closed(endpoint));
        }
        #[cfg(feature = "metrics")]
        counter!(ch_metrics::PUBLISHED_TOTAL, "endpoint" => endpoint.clone()).increment(1);
        debug!(endpoint = %endpoint, "message published");
        Ok(())
    }
}

#[async_trait]
impl MessageGateway for ChannelBus {
    async fn publish_outbound(&self, msg: Message) -> Result<()> {
        self.deliver(Envelope::reply(msg)).await
    }

    async fn publish_inbound(&self, msg: Message, endpoint: &str) -> Result<()> {
        self.deliver(Envelope::new(endpoint, msg)?).await
    }
}
