//! `switchboard serve`: JSON-lines router on stdin/stdout.

use std::{path::Path, sync::Arc};

use {
    anyhow::{Result, bail},
    switchboard_channels::JsonLinesGateway,
    switchboard_common::Message,
    switchboard_config::{ConfigHandle, validate::validate_config},
    switchboard_metrics::{MetricsRecorderConfig, init_metrics},
    switchboard_routing::{ApplicationMultiplexer, Dispatcher},
    tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    tracing::{debug, error, info, warn},
};

use crate::{config_commands::print_diagnostics, setup};

/// Lines read from the input, by outcome.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub inbound: u64,
    pub relayed: u64,
    pub rejected: u64,
}

pub async fn run(path: Option<&Path>) -> Result<()> {
    let (config, found) = setup::load(path)?;
    let validation = validate_config(&config);
    if validation.has_errors() {
        print_diagnostics(&validation, false);
        bail!("refusing to start with an invalid configuration");
    }

    let metrics = init_metrics(MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        ..Default::default()
    })?;

    let store = setup::open_store(&config.store).await?;
    let purged = store.purge_expired().await?;
    if purged > 0 {
        info!(purged, "dropped expired sessions");
    }

    let gateway = Arc::new(JsonLinesGateway::new(tokio::io::stdout()));
    let router = Arc::new(ApplicationMultiplexer::new(store, gateway));
    let handle = ConfigHandle::new(config.router.clone());
    let dispatcher = Dispatcher::spawn(Arc::clone(&router), handle.clone(), &config.dispatch);

    #[cfg(unix)]
    if let Some(path) = found {
        spawn_reload_on_hangup(path, handle.clone())?;
    }
    #[cfg(not(unix))]
    let _ = found;

    let stats = pump(
        BufReader::new(tokio::io::stdin()),
        &router,
        &dispatcher,
        &handle,
    )
    .await?;
    dispatcher.shutdown().await;
    info!(
        inbound = stats.inbound,
        relayed = stats.relayed,
        rejected = stats.rejected,
        "input closed"
    );

    if metrics.is_recording() {
        eprint!("{}", metrics.render());
    }
    Ok(())
}

/// Route every line of `input` until EOF.
///
/// A message whose `routing_endpoint` names a configured application is
/// that application's reply and is relayed to the user; every other message
/// is user input for the state machine. Lines that are not valid messages
/// are logged and skipped.
pub async fn pump<R>(
    input: R,
    router: &ApplicationMultiplexer,
    dispatcher: &Dispatcher,
    config: &ConfigHandle,
) -> Result<PumpStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = PumpStats::default();
    let mut lines = input.lines();
    let mut line_no = 0_u64;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let msg = match Message::from_json(&line) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping malformed message");
                stats.rejected += 1;
                continue;
            },
        };

        let from_application = msg
            .routing_endpoint
            .as_deref()
            .is_some_and(|endpoint| config.snapshot().has_endpoint(endpoint));

        if from_application {
            if let Err(e) = router.handle_outbound(msg).await {
                error!(line = line_no, error = %e, "failed to relay application message");
            }
            stats.relayed += 1;
        } else {
            debug!(line = line_no, from = %msg.from_addr, "queueing user message");
            dispatcher.dispatch(msg).await?;
            stats.inbound += 1;
        }
    }

    Ok(stats)
}

#[cfg(unix)]
fn spawn_reload_on_hangup(path: std::path::PathBuf, handle: ConfigHandle) -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!(path = %path.display(), "SIGHUP received, reloading config");
            reload(&path, &handle);
        }
    });
    Ok(())
}

/// Replace the router config from `path`, keeping the current one if the
/// file fails to load or validate.
pub fn reload(path: &Path, handle: &ConfigHandle) -> bool {
    let config = match switchboard_config::load_config(path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "reload failed, keeping current config");
            return false;
        },
    };
    let validation = validate_config(&config);
    if validation.has_errors() {
        for d in validation
            .diagnostics
            .iter()
            .filter(|d| d.severity == switchboard_config::Severity::Error)
        {
            warn!(path = %d.path, message = %d.message, "invalid config");
        }
        warn!("reload rejected, keeping current config");
        return false;
    }
    handle.replace(config.router);
    true
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        switchboard_channels::Envelope,
        switchboard_common::{REPLY_ENDPOINT, SessionEvent},
        switchboard_config::{DispatchConfig, MenuEntry, RouterConfig},
        switchboard_sessions::MemorySessionStore,
        tokio::io::AsyncReadExt,
    };

    fn router_config() -> RouterConfig {
        RouterConfig {
            entries: vec![MenuEntry::new("a", "Weather"), MenuEntry::new("b", "News")],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn pump_routes_user_and_application_lines() {
        let (writer, mut reader) = tokio::io::duplex(64 * 1024);
        let router = Arc::new(ApplicationMultiplexer::new(
            Arc::new(MemorySessionStore::new()),
            Arc::new(JsonLinesGateway::new(writer)),
        ));
        let handle = ConfigHandle::new(router_config());
        let dispatcher = Dispatcher::spawn(Arc::clone(&router), handle.clone(), &DispatchConfig {
            workers: 2,
            queue_depth: 8,
        });

        let input = [
            r#"{"from_addr":"+2771","to_addr":"*120#","content":"hi"}"#,
            "",
            "not json",
            r#"{"from_addr":"+2771","to_addr":"*120#","content":"2"}"#,
            r#"{"from_addr":"*120#","to_addr":"+2771","content":"Headlines","routing_endpoint":"b"}"#,
        ]
        .join("\n");

        let stats = pump(input.as_bytes(), &router, &dispatcher, &handle)
            .await
            .unwrap();
        dispatcher.shutdown().await;
        drop(router);

        assert_eq!(stats, PumpStats {
            inbound: 2,
            relayed: 1,
            rejected: 1,
        });

        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        let envelopes: Vec<Envelope> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(envelopes.len(), 3);

        let menu = envelopes
            .iter()
            .find(|e| e.endpoint == REPLY_ENDPOINT && e.message.to_addr == "+2771" && e.message.text().starts_with("Please select"))
            .unwrap();
        assert_eq!(menu.message.text(), "Please select a choice.\n1) Weather\n2) News");

        let start = envelopes.iter().find(|e| e.endpoint == "b").unwrap();
        assert_eq!(start.message.session_event, Some(SessionEvent::Start));

        assert!(
            envelopes
                .iter()
                .any(|e| e.is_reply() && e.message.text() == "Headlines")
        );
    }

    #[test]
    fn reload_keeps_config_on_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("switchboard.toml");
        let handle = ConfigHandle::new(router_config());

        std::fs::write(&path, "[router]\nsession_expiry = 0\n").unwrap();
        assert!(!reload(&path, &handle));
        assert_eq!(handle.snapshot().entries.len(), 2);

        std::fs::write(&path, "[router\n").unwrap();
        assert!(!reload(&path, &handle));

        std::fs::write(
            &path,
            "[[router.entries]]\nendpoint = \"c\"\nlabel = \"Sport\"\n",
        )
        .unwrap();
        assert!(reload(&path, &handle));
        assert!(handle.snapshot().has_endpoint("c"));
        assert!(!handle.snapshot().has_endpoint("a"));
    }
}
