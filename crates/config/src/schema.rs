/// Config schema types (router snapshot, session store, dispatch, metrics).
use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchboardConfig {
    pub router: RouterConfig,
    pub store: StoreConfig,
    pub dispatch: DispatchConfig,
    pub metrics: MetricsConfig,
}

/// Per-message router configuration.
///
/// Resolved once per inbound message and treated as immutable while that
/// message is processed. `entries` order is the menu numbering shown to
/// users, so reordering entries renumbers the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Seconds an untouched session is kept before it expires.
    pub session_expiry: u64,
    /// Schema tag written to newly created sessions.
    pub session_data_version: u32,
    pub menu_title: MenuTitle,
    pub entries: Vec<MenuEntry>,
    /// Input that returns an active session to the menu.
    pub keyword: String,
    pub invalid_input_message: String,
    /// Closing reply used when a session cannot continue.
    pub error_message: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            session_expiry: 1800,
            session_data_version: 1,
            menu_title: MenuTitle::default(),
            entries: Vec::new(),
            keyword: ":menu".into(),
            invalid_input_message: "That is an incorrect choice. Please enter the number next \
                                    to the menu item you wish to choose.\n\n 1) Try Again"
                .into(),
            error_message: "Oops! We experienced a temporary error. Please dial the line again."
                .into(),
        }
    }
}

impl RouterConfig {
    #[must_use]
    pub fn session_expiry(&self) -> Duration {
        Duration::from_secs(self.session_expiry)
    }

    #[must_use]
    pub fn has_endpoint(&self, endpoint: &str) -> bool {
        self.entries.iter().any(|e| e.endpoint == endpoint)
    }

    /// Menu labels in numbering order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    /// Entry for a 1-based menu choice.
    #[must_use]
    pub fn entry(&self, choice: u32) -> Option<&MenuEntry> {
        let index = usize::try_from(choice).ok()?.checked_sub(1)?;
        self.entries.get(index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuTitle {
    pub content: String,
}

impl Default for MenuTitle {
    fn default() -> Self {
        Self {
            content: "Please select a choice.".into(),
        }
    }
}

/// One selectable application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub endpoint: String,
    pub label: String,
}

impl MenuEntry {
    pub fn new(endpoint: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            label: label.into(),
        }
    }
}

/// Session store backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map; sessions vanish on restart.
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// SQLite database file. Defaults to `<data_dir>/sessions.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Inbound worker pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Number of workers; each user is pinned to one worker.
    pub workers: usize,
    /// Pending messages buffered per worker before senders wait.
    pub queue_depth: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_depth: 256,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}
