//! Metrics collection and export for switchboard.
//!
//! This crate provides metric names and recorder setup on top of the
//! `metrics` crate facade. When the `prometheus` feature is enabled, metrics
//! are exported in Prometheus text format.
//!
//! # Usage
//!
//! ```rust,ignore
//! use switchboard_metrics::{counter, router};
//!
//! counter!(router::INBOUND_TOTAL).increment(1);
//! ```
//!
//! # Features
//!
//! - `prometheus`: install a Prometheus recorder whose output can be rendered
//!   with [`MetricsHandle::render`]

mod definitions;
pub mod error;
mod recorder;

pub use {
    definitions::*,
    error::{Error, Result},
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
