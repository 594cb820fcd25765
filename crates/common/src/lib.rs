//! Shared message envelope and error helpers used across all switchboard crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    types::{Message, REPLY_ENDPOINT, SessionEvent},
};
