use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Where a user is in the menu dialogue.
///
/// Only [`SessionState::Selected`] carries an endpoint, so a session can
/// never point at an application while it is showing the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Fresh session; the next message is answered with the menu.
    Start,
    /// Menu shown, waiting for a numeric choice.
    Select,
    /// Attached to an application endpoint; messages are forwarded there.
    Selected { active_endpoint: String },
    /// Last choice was invalid; waiting for "try again".
    BadInput,
}

impl SessionState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    #[must_use]
    pub fn active_endpoint(&self) -> Option<&str> {
        match self {
            Self::Selected { active_endpoint } => Some(active_endpoint.as_str()),
            _ => None,
        }
    }

    fn kind(&self) -> StateKind {
        match self {
            Self::Start => StateKind::Start,
            Self::Select => StateKind::Select,
            Self::Selected { .. } => StateKind::Selected,
            Self::BadInput => StateKind::BadInput,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StateKind {
    Start,
    Select,
    Selected,
    BadInput,
}

impl StateKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Select => "select",
            Self::Selected => "selected",
            Self::BadInput => "bad_input",
        }
    }
}

/// Persisted session for one user.
///
/// Stored flat (`state` plus an optional `active_endpoint`) and checked on
/// load, so a record whose endpoint disagrees with its state is rejected
/// instead of reaching the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecord", into = "StoredRecord")]
pub struct SessionRecord {
    pub user_id: String,
    /// Schema tag written at creation; never changed afterwards.
    pub version: u32,
    pub state: SessionState,
    pub created_at: u64,
    pub updated_at: u64,
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl SessionRecord {
    /// New session in [`SessionState::Start`].
    pub fn new(user_id: impl Into<String>, version: u32) -> Self {
        let now = now_ms();
        Self {
            user_id: user_id.into(),
            version,
            state: SessionState::Start,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `state` and bump `updated_at`.
    pub fn advance(&mut self, state: SessionState) {
        self.state = state;
        self.updated_at = now_ms().max(self.created_at);
    }
}

#[derive(Serialize, Deserialize)]
struct StoredRecord {
    user_id: String,
    #[serde(default = "default_version")]
    version: u32,
    state: StateKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_endpoint: Option<String>,
    #[serde(default)]
    created_at: u64,
    #[serde(default)]
    updated_at: u64,
}

fn default_version() -> u32 {
    1
}

impl TryFrom<StoredRecord> for SessionRecord {
    type Error = Error;

    fn try_from(r: StoredRecord) -> Result<Self, Self::Error> {
        let state = match (r.state, r.active_endpoint) {
            (StateKind::Selected, Some(active_endpoint)) => SessionState::Selected { active_endpoint },
            (StateKind::Selected, None) => {
                return Err(Error::corrupt(r.user_id, "selected without an endpoint"));
            },
            (kind, Some(endpoint)) => {
                return Err(Error::corrupt(
                    r.user_id,
                    format!("state {} carries endpoint {endpoint}", kind.as_str()),
                ));
            },
            (StateKind::Start, None) => SessionState::Start,
            (StateKind::Select, None) => SessionState::Select,
            (StateKind::BadInput, None) => SessionState::BadInput,
        };
        Ok(Self {
            user_id: r.user_id,
            version: r.version,
            state,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

impl From<SessionRecord> for StoredRecord {
    fn from(r: SessionRecord) -> Self {
        let state = r.state.kind();
        let active_endpoint = match r.state {
            SessionState::Selected { active_endpoint } => Some(active_endpoint),
            _ => None,
        };
        Self {
            user_id: r.user_id,
            version: r.version,
            state,
            active_endpoint,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn new_session_starts_at_start() {
        let record = SessionRecord::new("u1", 3);
        assert_eq!(record.state, SessionState::Start);
        assert_eq!(record.version, 3);
        assert_eq!(record.state.active_endpoint(), None);
    }

    #[test]
    fn selected_is_stored_flat() {
        let mut record = SessionRecord::new("u1", 1);
        record.advance(SessionState::Selected {
            active_endpoint: "b".into(),
        });

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["state"], "selected");
        assert_eq!(value["active_endpoint"], "b");

        let back: SessionRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.state.active_endpoint(), Some("b"));
    }

    #[test]
    fn non_selected_omits_endpoint() {
        let mut record = SessionRecord::new("u1", 1);
        record.advance(SessionState::BadInput);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["state"], "bad_input");
        assert!(value.get("active_endpoint").is_none());
    }

    #[test]
    fn rejects_selected_without_endpoint() {
        let err = serde_json::from_value::<SessionRecord>(json!({
            "user_id": "u1",
            "state": "selected",
        }))
        .unwrap_err();
        assert!(err.to_string().contains("selected without an endpoint"));
    }

    #[test]
    fn rejects_endpoint_outside_selected() {
        let result = serde_json::from_value::<SessionRecord>(json!({
            "user_id": "u1",
            "state": "select",
            "active_endpoint": "a",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn missing_version_defaults_to_one() {
        let record: SessionRecord = serde_json::from_value(json!({
            "user_id": "u1",
            "state": "start",
        }))
        .unwrap();
        assert_eq!(record.version, 1);
    }
}
