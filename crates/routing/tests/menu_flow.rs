#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end flows through the in-process bus and memory store.

use std::sync::Arc;

use {
    switchboard_channels::ChannelBus,
    switchboard_common::{Message, REPLY_ENDPOINT, SessionEvent},
    switchboard_config::{MenuEntry, MenuTitle, RouterConfig},
    switchboard_routing::ApplicationMultiplexer,
    switchboard_sessions::{MemorySessionStore, SessionRecord, SessionState, SessionStore},
    tokio::sync::mpsc::Receiver,
};

const USER: &str = "+27831234567";
const MENU: &str = "Pick one\n1) Weather\n2) News";

struct Harness {
    router: ApplicationMultiplexer,
    store: Arc<MemorySessionStore>,
    bus: Arc<ChannelBus>,
    replies: Receiver<Message>,
    weather: Receiver<Message>,
    news: Receiver<Message>,
    config: RouterConfig,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemorySessionStore::new());
        let bus = Arc::new(ChannelBus::new());
        let replies = bus.register_reply();
        let weather = bus.register("a");
        let news = bus.register("b");
        let router = ApplicationMultiplexer::new(store.clone(), bus.clone());
        Self {
            router,
            store,
            bus,
            replies,
            weather,
            news,
            config: RouterConfig {
                menu_title: MenuTitle {
                    content: "Pick one".into(),
                },
                entries: vec![MenuEntry::new("a", "Weather"), MenuEntry::new("b", "News")],
                ..Default::default()
            },
        }
    }

    async fn send(&self, content: &str) {
        self.router
            .handle_inbound(&self.config, Message::inbound(USER, "*120#", content))
            .await
            .unwrap();
    }

    async fn session(&self) -> Option<SessionRecord> {
        self.store.load(USER).await.unwrap()
    }

    async fn state(&self) -> Option<SessionState> {
        self.session().await.map(|r| r.state)
    }

    fn assert_quiet(&mut self) {
        assert!(self.replies.try_recv().is_err(), "unexpected reply");
        assert!(self.weather.try_recv().is_err(), "unexpected forward to a");
        assert!(self.news.try_recv().is_err(), "unexpected forward to b");
    }
}

fn selected(endpoint: &str) -> SessionState {
    SessionState::Selected {
        active_endpoint: endpoint.into(),
    }
}

#[tokio::test]
async fn full_menu_round_trip() {
    let mut h = Harness::new();

    h.send("hi").await;
    let menu = h.replies.recv().await.unwrap();
    assert_eq!(menu.content.as_deref(), Some(MENU));
    assert_eq!(menu.to_addr, USER);
    assert!(menu.continues_session());
    assert_eq!(h.state().await, Some(SessionState::Select));
    h.assert_quiet();

    h.send("2").await;
    let start = h.news.recv().await.unwrap();
    assert_eq!(start.session_event, Some(SessionEvent::Start));
    assert_eq!(start.content, None);
    assert_eq!(start.from_addr, USER);
    assert_eq!(h.state().await, Some(selected("b")));
    h.assert_quiet();

    h.send("hello").await;
    let forwarded = h.news.recv().await.unwrap();
    assert_eq!(forwarded.content.as_deref(), Some("hello"));
    assert_eq!(forwarded.session_event, None);
    assert_eq!(h.state().await, Some(selected("b")));
    h.assert_quiet();

    h.send(":menu").await;
    let close = h.news.recv().await.unwrap();
    assert_eq!(close.session_event, Some(SessionEvent::Close));
    assert_eq!(close.content, None);
    let menu = h.replies.recv().await.unwrap();
    assert_eq!(menu.content.as_deref(), Some(MENU));
    assert_eq!(h.state().await, Some(SessionState::Select));
    assert_eq!(h.state().await.unwrap().active_endpoint(), None);
    h.assert_quiet();
}

#[tokio::test]
async fn keyword_is_case_and_space_insensitive() {
    let mut h = Harness::new();
    h.send("hi").await;
    h.send("1").await;
    h.replies.recv().await.unwrap();
    h.weather.recv().await.unwrap();

    h.send("  :MENU   now").await;
    assert_eq!(
        h.weather.recv().await.unwrap().session_event,
        Some(SessionEvent::Close)
    );
    assert_eq!(h.replies.recv().await.unwrap().content.as_deref(), Some(MENU));
    assert_eq!(h.state().await, Some(SessionState::Select));
}

#[tokio::test]
async fn invalid_choices_then_recovery() {
    let mut h = Harness::new();
    let invalid = h.config.invalid_input_message.clone();

    h.send("hi").await;
    h.replies.recv().await.unwrap();

    for bad in ["0", "3", "news", ""] {
        h.send(bad).await;
        let reply = h.replies.recv().await.unwrap();
        assert_eq!(reply.content.as_deref(), Some(invalid.as_str()));
        assert!(reply.continues_session());
        assert_eq!(h.state().await, Some(SessionState::BadInput));
        h.assert_quiet();
    }

    // Only "1" (try again) leaves bad input, even though "2" is a menu item.
    h.send("2").await;
    assert_eq!(
        h.replies.recv().await.unwrap().content.as_deref(),
        Some(invalid.as_str())
    );
    assert_eq!(h.state().await, Some(SessionState::BadInput));

    h.send("1").await;
    assert_eq!(h.replies.recv().await.unwrap().content.as_deref(), Some(MENU));
    assert_eq!(h.state().await, Some(SessionState::Select));
    h.assert_quiet();
}

#[tokio::test]
async fn removed_endpoint_ends_session_gracefully() {
    let mut h = Harness::new();
    h.send("hi").await;
    h.send("1").await;
    h.replies.recv().await.unwrap();
    h.weather.recv().await.unwrap();

    h.config.entries.retain(|e| e.endpoint != "a");
    h.send("weather please").await;

    let reply = h.replies.recv().await.unwrap();
    assert_eq!(reply.content.as_deref(), Some(h.config.error_message.as_str()));
    assert_eq!(reply.session_event, Some(SessionEvent::Close));
    assert!(h.session().await.is_none());
    h.assert_quiet();

    // The next message starts over with the new menu.
    h.send("hi").await;
    assert_eq!(
        h.replies.recv().await.unwrap().content.as_deref(),
        Some("Pick one\n1) News")
    );
}

#[tokio::test]
async fn unreachable_application_closes_session() {
    let mut h = Harness::new();
    h.send("hi").await;
    h.replies.recv().await.unwrap();

    assert!(h.bus.unregister("b"));
    h.send("2").await;

    let reply = h.replies.recv().await.unwrap();
    assert_eq!(reply.content.as_deref(), Some(h.config.error_message.as_str()));
    assert_eq!(reply.session_event, Some(SessionEvent::Close));
    assert!(h.session().await.is_none());
    h.assert_quiet();
}

#[tokio::test]
async fn fault_while_selected_clears_session() {
    let mut h = Harness::new();
    h.send("hi").await;
    h.send("2").await;
    h.replies.recv().await.unwrap();
    h.news.recv().await.unwrap();

    drop(std::mem::replace(&mut h.news, h.bus.register("unused")));
    h.send("hello").await;

    let reply = h.replies.recv().await.unwrap();
    assert_eq!(reply.content.as_deref(), Some(h.config.error_message.as_str()));
    assert!(!reply.continues_session());
    assert!(h.session().await.is_none());
}

#[tokio::test]
async fn expired_session_restarts_with_menu() {
    let mut h = Harness::new();
    h.config.session_expiry = 0;

    h.send("hi").await;
    h.replies.recv().await.unwrap();
    assert!(h.session().await.is_none());

    // With no live session the "2" is treated as a first contact.
    h.send("2").await;
    assert_eq!(h.replies.recv().await.unwrap().content.as_deref(), Some(MENU));
    h.assert_quiet();
}

#[tokio::test]
async fn session_keeps_creation_version() {
    let mut h = Harness::new();
    h.config.session_data_version = 3;
    h.send("hi").await;

    h.config.session_data_version = 4;
    h.send("1").await;

    let record = h.session().await.unwrap();
    assert_eq!(record.version, 3);
    assert!(record.updated_at >= record.created_at);
}

#[tokio::test]
async fn application_replies_are_relayed() {
    let mut h = Harness::new();
    let mut reply = Message::inbound(USER, "*120#", "hi").reply("Sunny, 24C", false);
    reply.routing_endpoint = Some("a".into());

    h.router.handle_outbound(reply.clone()).await.unwrap();

    let relayed = h.replies.recv().await.unwrap();
    assert_eq!(relayed.message_id, reply.message_id);
    assert_eq!(relayed.content, reply.content);
    assert_eq!(relayed.session_event, Some(SessionEvent::Close));
    assert_eq!(relayed.routing_endpoint.as_deref(), Some(REPLY_ENDPOINT));
    assert!(h.session().await.is_none());
}

#[tokio::test]
async fn relay_without_reply_consumer_is_an_error() {
    let h = Harness::new();
    assert!(h.bus.unregister(REPLY_ENDPOINT));
    let reply = Message::inbound(USER, "*120#", "hi").reply("x", true);
    assert!(h.router.handle_outbound(reply).await.is_err());
}

#[tokio::test]
async fn users_are_independent() {
    let mut h = Harness::new();
    h.send("hi").await;
    h.replies.recv().await.unwrap();

    h.router
        .handle_inbound(&h.config, Message::inbound("+27000000000", "*120#", "hi"))
        .await
        .unwrap();
    let other = h.replies.recv().await.unwrap();
    assert_eq!(other.to_addr, "+27000000000");

    h.send("1").await;
    h.weather.recv().await.unwrap();
    assert_eq!(h.state().await, Some(selected("a")));
    assert_eq!(
        h.store
            .load("+27000000000")
            .await
            .unwrap()
            .map(|r| r.state),
        Some(SessionState::Select)
    );
    assert_eq!(h.store.list().await.unwrap().len(), 2);
}
