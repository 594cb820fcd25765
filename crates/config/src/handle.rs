//! Shared, hot-swappable router configuration.

use std::sync::Arc;

use {tokio::sync::watch, tracing::info};

use crate::schema::RouterConfig;

/// Cheap-to-clone holder of the current [`RouterConfig`].
///
/// Readers take a [`snapshot`](Self::snapshot) per message and keep using it
/// until that message is done, so a concurrent [`replace`](Self::replace)
/// never changes the config underneath an in-flight message.
#[derive(Clone)]
pub struct ConfigHandle {
    tx: Arc<watch::Sender<Arc<RouterConfig>>>,
}

impl ConfigHandle {
    pub fn new(config: RouterConfig) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(config));
        Self { tx: Arc::new(tx) }
    }

    /// Current configuration.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RouterConfig> {
        Arc::clone(&self.tx.borrow())
    }

    /// Swap in a new configuration. Returns the previous one.
    pub fn replace(&self, config: RouterConfig) -> Arc<RouterConfig> {
        let previous = self.tx.send_replace(Arc::new(config));
        info!(
            entries = self.tx.borrow().entries.len(),
            "router configuration replaced"
        );
        previous
    }
}
