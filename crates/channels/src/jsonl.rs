//! Gateway that serializes every published message as one JSON line.

use {
    async_trait::async_trait,
    switchboard_common::Message,
    tokio::{
        io::{AsyncWrite, AsyncWriteExt},
        sync::Mutex,
    },
    tracing::debug,
};

#[cfg(feature = "metrics")]
use switchboard_metrics::{channels as ch_metrics, counter};

use crate::{Envelope, MessageGateway, Result};

/// Writes `{"endpoint": ..., "message": ...}` lines to any async writer.
///
/// Lines are written whole under a lock and flushed, so concurrent
/// publishers never interleave within a line.
pub struct JsonLinesGateway<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesGateway<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    async fn write(&self, envelope: &Envelope) -> Result<()> {
        let mut line = serde_json::to_vec(envelope)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;

        #[cfg(feature = "metrics")]
        counter!(ch_metrics::PUBLISHED_TOTAL, "endpoint" => envelope.endpoint.clone()).increment(1);
        debug!(endpoint = %envelope.endpoint, bytes = line.len(), "wrote envelope");
        Ok(())
    }
}

#[async_trait]
impl<W> MessageGateway for JsonLinesGateway<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn publish_outbound(&self, msg: Message) -> Result<()> {
        self.write(&Envelope::reply(msg)).await
    }

    async fn publish_inbound(&self, msg: Message, endpoint: &str) -> Result<()> {
        self.write(&Envelope::new(endpoint, msg)?).await
    }
}
