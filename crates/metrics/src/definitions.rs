//! Metric name and label definitions.
//!
//! All metric names used by switchboard live here so the set of exported
//! series is documented in one place.

/// Router state machine metrics
pub mod router {
    /// Inbound user messages handled
    pub const INBOUND_TOTAL: &str = "switchboard_router_inbound_total";
    /// Sessions created on first contact or after expiry
    pub const SESSIONS_CREATED_TOTAL: &str = "switchboard_router_sessions_created_total";
    /// State transitions, labelled by `from` and `to`
    pub const TRANSITIONS_TOTAL: &str = "switchboard_router_transitions_total";
    /// Messages forwarded to application endpoints
    pub const FORWARDED_TOTAL: &str = "switchboard_router_forwarded_total";
    /// Application messages relayed to users
    pub const OUTBOUND_RELAYED_TOTAL: &str = "switchboard_router_outbound_relayed_total";
    /// Sessions ended because their endpoint left the menu
    pub const STALE_ENDPOINT_TOTAL: &str = "switchboard_router_stale_endpoint_total";
    /// Handler faults recovered by ending the session
    pub const HANDLER_FAULTS_TOTAL: &str = "switchboard_router_handler_faults_total";
    /// Messages dropped because the session store failed
    pub const STORE_FAILURES_TOTAL: &str = "switchboard_router_store_failures_total";
    /// Time spent handling one inbound message, in seconds
    pub const HANDLE_DURATION_SECONDS: &str = "switchboard_router_handle_duration_seconds";
}

/// Message gateway metrics
pub mod channels {
    /// Messages published, labelled by endpoint
    pub const PUBLISHED_TOTAL: &str = "switchboard_channel_published_total";
    /// Publishes that found no live consumer, labelled by endpoint
    pub const UNDELIVERABLE_TOTAL: &str = "switchboard_channel_undeliverable_total";
}

/// Common label keys used across metrics
pub mod labels {
    pub const ENDPOINT: &str = "endpoint";
    pub const FROM: &str = "from";
    pub const TO: &str = "to";
    pub const FAULT: &str = "fault";
}

/// Standard histogram buckets
pub mod buckets {
    /// Per-message handling duration buckets (in seconds)
    /// Covers 100µs to 5s
    pub const HANDLE_DURATION: &[f64] = &[
        0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0,
    ];
}
