//! Message gateway: where the router publishes replies and forwards.
//!
//! The router talks to the outside world only through [`MessageGateway`].
//! Replies to users go out on the fixed reply endpoint
//! ([`switchboard_common::REPLY_ENDPOINT`]); forwards go to the endpoint of
//! the application the user selected. Two gateways ship here: an in-process
//! [`ChannelBus`] and a [`JsonLinesGateway`] that writes one envelope per line.

pub mod bus;
pub mod error;
pub mod gateway;
pub mod jsonl;

pub use {
    bus::ChannelBus,
    error::{Error, Result},
    gateway::{Envelope, MessageGateway},
    jsonl::JsonLinesGateway,
};
