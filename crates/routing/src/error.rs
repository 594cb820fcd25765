/// Errors that abort handling of a message.
///
/// Handler faults are not among them: the router recovers from those by
/// ending the session (see [`HandlerFault`]).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("session store failed: {0}")]
    Store(#[from] switchboard_sessions::Error),

    #[error("gateway failed: {0}")]
    Gateway(#[from] switchboard_channels::Error),

    #[error("dispatcher queue closed")]
    QueueClosed,
}

pub type Result<T> = std::result::Result<T, Error>;

/// A state handler could not complete.
#[derive(Debug, thiserror::Error)]
pub enum HandlerFault {
    #[error("publish failed: {0}")]
    Gateway(#[from] switchboard_channels::Error),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerFault {
    /// Short label used in logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Gateway(_) => "gateway",
            Self::Panicked(_) => "panic",
        }
    }
}
