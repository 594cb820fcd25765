//! Per-user ordered dispatch onto a fixed pool of workers.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
};

use {
    switchboard_common::Message,
    switchboard_config::{ConfigHandle, DispatchConfig},
    tokio::{sync::mpsc, task::JoinHandle},
    tracing::{debug, error, info},
};

#[cfg(feature = "metrics")]
use switchboard_metrics::{counter, router as router_metrics};

use crate::{ApplicationMultiplexer, Error, Result};

/// Shards inbound messages by user onto worker tasks.
///
/// Every user maps to exactly one worker and each worker handles its queue
/// one message at a time, so a user's message is fully handled (session
/// saved) before that user's next message is loaded. Each message is run
/// against the config snapshot current when the worker picks it up.
pub struct Dispatcher {
    senders: Vec<mpsc::Sender<Message>>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawn `settings.workers` workers on the current tokio runtime.
    pub fn spawn(
        router: Arc<ApplicationMultiplexer>,
        config: ConfigHandle,
        settings: &DispatchConfig,
    ) -> Self {
        let count = settings.workers.max(1);
        let depth = settings.queue_depth.max(1);

        let mut senders = Vec::with_capacity(count);
        let mut workers = Vec::with_capacity(count);
        for index in 0..count {
            let (tx, rx) = mpsc::channel(depth);
            senders.push(tx);
            workers.push(tokio::spawn(run_worker(
                index,
                Arc::clone(&router),
                config.clone(),
                rx,
            )));
        }
        info!(workers = count, queue_depth = depth, "dispatcher started");

        Self { senders, workers }
    }

    /// Worker index that handles `user_id`.
    #[must_use]
    pub fn worker_for(&self, user_id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        user_id.hash(&mut hasher);
        (hasher.finish() % self.senders.len() as u64) as usize
    }

    /// Queue a user message, waiting while that worker's queue is full.
    pub async fn dispatch(&self, msg: Message) -> Result<()> {
        let index = self.worker_for(&msg.from_addr);
        self.senders[index]
            .send(msg)
            .await
            .map_err(|_| Error::QueueClosed)
    }

    /// Stop accepting messages and wait for queued ones to finish.
    pub async fn shutdown(self) {
        let Self { senders, workers } = self;
        drop(senders);
        for (index, handle) in workers.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!(worker = index, error = %e, "dispatch worker failed");
            }
        }
        info!("dispatcher stopped");
    }
}

async fn run_worker(
    index: usize,
    router: Arc<ApplicationMultiplexer>,
    config: ConfigHandle,
    mut rx: mpsc::Receiver<Message>,
) {
    debug!(worker = index, "dispatch worker started");
    while let Some(msg) = rx.recv().await {
        let snapshot = config.snapshot();
        let user_id = msg.from_addr.clone();
        match router.handle_inbound(&snapshot, msg).await {
            Ok(()) => {},
            Err(Error::Store(e)) => {
                error!(worker = index, user_id = %user_id, error = %e, "session store failed, message dropped");
                #[cfg(feature = "metrics")]
                counter!(router_metrics::STORE_FAILURES_TOTAL).increment(1);
            },
            Err(e) => {
                error!(worker = index, user_id = %user_id, error = %e, "inbound message failed");
            },
        }
    }
    debug!(worker = index, "dispatch worker stopped");
}
