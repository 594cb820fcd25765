use std::error::Error as StdError;

/// Crate-wide result type for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No consumer is registered for the endpoint.
    #[error("unknown endpoint: {endpoint}")]
    UnknownEndpoint { endpoint: String },

    /// The endpoint's consumer has gone away.
    #[error("endpoint closed: {endpoint}")]
    Closed { endpoint: String },

    /// Input payload or parameter is invalid.
    #[error("invalid gateway input: {message}")]
    InvalidInput { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// Wrapped source error from an external transport.
    #[error("gateway operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn unknown_endpoint(endpoint: impl std::fmt::Display) -> Self {
        Self::UnknownEndpoint {
            endpoint: endpoint.to_string(),
        }
    }

    #[must_use]
    pub fn closed(endpoint: impl std::fmt::Display) -> Self {
        Self::Closed {
            endpoint: endpoint.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
