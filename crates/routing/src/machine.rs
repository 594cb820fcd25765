//! Per-user menu state machine.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use {
    futures::FutureExt,
    switchboard_channels::MessageGateway,
    switchboard_common::{Message, SessionEvent},
    switchboard_config::RouterConfig,
    switchboard_sessions::{SessionState, SessionStore},
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use switchboard_metrics::{counter, histogram, labels, router as router_metrics};

use crate::{
    HandlerFault, Result,
    input::{matches_keyword, parse_choice},
    menu::render_menu,
};

/// Outcome of a state handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Persist the session in this state.
    Next(SessionState),
    /// Drop the session; the user's next message starts afresh.
    End,
}

type HandlerResult = std::result::Result<Transition, HandlerFault>;

/// Routes user messages between a menu and the selected application.
///
/// Handlers only publish messages and return a [`Transition`]; loading,
/// saving and clearing sessions happens here, after the handler returns.
pub struct ApplicationMultiplexer {
    store: Arc<dyn SessionStore>,
    gateway: Arc<dyn MessageGateway>,
}

impl ApplicationMultiplexer {
    pub fn new(store: Arc<dyn SessionStore>, gateway: Arc<dyn MessageGateway>) -> Self {
        Self { store, gateway }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Process one message from a user.
    ///
    /// Handler faults end the session with a closing `error_message` reply
    /// and are not returned. Store failures are returned.
    pub async fn handle_inbound(&self, config: &RouterConfig, msg: Message) -> Result<()> {
        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();
        #[cfg(feature = "metrics")]
        counter!(router_metrics::INBOUND_TOTAL).increment(1);

        let user_id = msg.from_addr.as_str();
        debug!(user_id, message_id = %msg.message_id, "processing inbound message");

        let mut record = match self.store.load(user_id).await? {
            Some(record) => {
                debug!(user_id, state = %record.state, "session loaded");
                record
            },
            None => {
                let record = self
                    .store
                    .create(
                        user_id,
                        config.session_data_version,
                        config.session_expiry(),
                    )
                    .await?;
                info!(user_id, version = record.version, "session created");
                #[cfg(feature = "metrics")]
                counter!(router_metrics::SESSIONS_CREATED_TOTAL).increment(1);
                record
            },
        };

        let from = record.state.clone();
        let outcome = AssertUnwindSafe(self.dispatch(config, &from, &msg))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(HandlerFault::Panicked(panic_message(payload))));

        match outcome {
            Ok(Transition::Next(state)) => {
                if state != from {
                    info!(user_id, from = %from, to = %state, "state transition");
                    #[cfg(feature = "metrics")]
                    counter!(
                        router_metrics::TRANSITIONS_TOTAL,
                        labels::FROM => from.name(),
                        labels::TO => state.name()
                    )
                    .increment(1);
                }
                record.advance(state);
                self.store.save(&record, config.session_expiry()).await?;
            },
            Ok(Transition::End) => {
                info!(user_id, from = %from, "session ended");
                self.store.clear(user_id).await?;
            },
            Err(fault) => self.recover(config, &msg, fault).await?,
        }

        #[cfg(feature = "metrics")]
        histogram!(router_metrics::HANDLE_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        Ok(())
    }

    /// Relay a message from an application to its user, unchanged.
    pub async fn handle_outbound(&self, msg: Message) -> Result<()> {
        debug!(
            to = %msg.to_addr,
            endpoint = msg.routing_endpoint.as_deref().unwrap_or_default(),
            "relaying outbound message"
        );
        self.gateway.publish_outbound(msg).await?;
        #[cfg(feature = "metrics")]
        counter!(router_metrics::OUTBOUND_RELAYED_TOTAL).increment(1);
        Ok(())
    }

    async fn dispatch(
        &self,
        config: &RouterConfig,
        state: &SessionState,
        msg: &Message,
    ) -> HandlerResult {
        match state {
            SessionState::Start => self.handle_start(config, msg).await,
            SessionState::Select => self.handle_select(config, msg).await,
            SessionState::Selected { active_endpoint } => {
                self.handle_selected(config, active_endpoint, msg).await
            },
            SessionState::BadInput => self.handle_bad_input(config, msg).await,
        }
    }

    async fn handle_start(&self, config: &RouterConfig, msg: &Message) -> HandlerResult {
        self.send_menu(config, msg).await?;
        Ok(Transition::Next(SessionState::Select))
    }

    /// The choice is checked against the current entries, which may differ
    /// from the ones the user was shown.
    async fn handle_select(&self, config: &RouterConfig, msg: &Message) -> HandlerResult {
        let count = u32::try_from(config.entries.len()).unwrap_or(u32::MAX);
        let Some(entry) = parse_choice(msg.text(), 1..=count).and_then(|c| config.entry(c)) else {
            self.send_invalid_input(config, msg).await?;
            return Ok(Transition::Next(SessionState::BadInput));
        };

        let endpoint = entry.endpoint.clone();
        self.forward(msg.forwarded(SessionEvent::Start), &endpoint)
            .await?;
        info!(user_id = %msg.from_addr, endpoint = %endpoint, "switched to endpoint");
        Ok(Transition::Next(SessionState::Selected {
            active_endpoint: endpoint,
        }))
    }

    async fn handle_selected(
        &self,
        config: &RouterConfig,
        active_endpoint: &str,
        msg: &Message,
    ) -> HandlerResult {
        if !config.has_endpoint(active_endpoint) {
            warn!(
                user_id = %msg.from_addr,
                endpoint = active_endpoint,
                "active endpoint no longer configured"
            );
            #[cfg(feature = "metrics")]
            counter!(router_metrics::STALE_ENDPOINT_TOTAL).increment(1);
            self.gateway
                .publish_outbound(msg.reply(config.error_message.as_str(), false))
                .await?;
            return Ok(Transition::End);
        }

        if matches_keyword(msg.text(), &[config.keyword.as_str()]) {
            self.forward(msg.forwarded(SessionEvent::Close), active_endpoint)
                .await?;
            info!(user_id = %msg.from_addr, endpoint = active_endpoint, "session close sent");
            self.send_menu(config, msg).await?;
            return Ok(Transition::Next(SessionState::Select));
        }

        self.forward(msg.clone(), active_endpoint).await?;
        Ok(Transition::Next(SessionState::Selected {
            active_endpoint: active_endpoint.to_string(),
        }))
    }

    async fn handle_bad_input(&self, config: &RouterConfig, msg: &Message) -> HandlerResult {
        if parse_choice(msg.text(), 1..=1).is_some() {
            self.send_menu(config, msg).await?;
            return Ok(Transition::Next(SessionState::Select));
        }
        self.send_invalid_input(config, msg).await?;
        Ok(Transition::Next(SessionState::BadInput))
    }

    async fn send_menu(
        &self,
        config: &RouterConfig,
        msg: &Message,
    ) -> std::result::Result<(), HandlerFault> {
        let menu = render_menu(&config.menu_title.content, &config.labels());
        self.gateway.publish_outbound(msg.reply(menu, true)).await?;
        Ok(())
    }

    async fn send_invalid_input(
        &self,
        config: &RouterConfig,
        msg: &Message,
    ) -> std::result::Result<(), HandlerFault> {
        self.gateway
            .publish_outbound(msg.reply(config.invalid_input_message.as_str(), true))
            .await?;
        Ok(())
    }

    async fn forward(&self, msg: Message, endpoint: &str) -> std::result::Result<(), HandlerFault> {
        self.gateway.publish_inbound(msg, endpoint).await?;
        #[cfg(feature = "metrics")]
        counter!(router_metrics::FORWARDED_TOTAL, labels::ENDPOINT => endpoint.to_string())
            .increment(1);
        Ok(())
    }

    /// End the session after a handler fault and tell the user.
    async fn recover(&self, config: &RouterConfig, msg: &Message, fault: HandlerFault) -> Result<()> {
        let user_id = msg.from_addr.as_str();
        error!(user_id, fault = fault.kind(), error = %fault, "handler fault, ending session");
        #[cfg(feature = "metrics")]
        counter!(router_metrics::HANDLER_FAULTS_TOTAL, labels::FAULT => fault.kind()).increment(1);

        self.store.clear(user_id).await?;
        self.gateway
            .publish_outbound(msg.reply(config.error_message.as_str(), false))
            .await?;
        Ok(())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
