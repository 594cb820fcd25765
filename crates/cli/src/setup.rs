//! Config loading and store construction shared by the commands.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    anyhow::{Context, Result, bail},
    switchboard_config::{
        StoreBackend, StoreConfig, SwitchboardConfig, data_dir, find_config_file, load_config,
    },
    switchboard_sessions::{MemorySessionStore, SessionStore, SqliteSessionStore},
    tracing::{debug, info},
};

const SESSIONS_DB: &str = "sessions.db";

/// Load the config at `path`, or the discovered one, or defaults.
///
/// Unlike [`switchboard_config::discover_and_load`] a file that exists but
/// does not parse is an error here.
pub fn load(path: Option<&Path>) -> Result<(SwitchboardConfig, Option<PathBuf>)> {
    let Some(path) = path.map(Path::to_path_buf).or_else(find_config_file) else {
        debug!("no config file found, using defaults");
        return Ok((SwitchboardConfig::default(), None));
    };
    let config = load_config(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    info!(path = %path.display(), entries = config.router.entries.len(), "config loaded");
    Ok((config, Some(path)))
}

/// SQLite database path for a store config.
pub fn sqlite_path(store: &StoreConfig) -> Result<PathBuf> {
    match &store.path {
        Some(path) => Ok(path.clone()),
        None => Ok(data_dir()?.join(SESSIONS_DB)),
    }
}

/// Open the configured session store.
pub async fn open_store(store: &StoreConfig) -> Result<Arc<dyn SessionStore>> {
    match store.backend {
        StoreBackend::Memory => {
            info!("using in-memory session store");
            Ok(Arc::new(MemorySessionStore::new()))
        },
        StoreBackend::Sqlite => Ok(Arc::new(open_sqlite(store).await?)),
    }
}

/// Open the SQLite store, failing for any other backend.
pub async fn open_sqlite(store: &StoreConfig) -> Result<SqliteSessionStore> {
    if store.backend != StoreBackend::Sqlite {
        bail!("sessions are kept in memory; set store.backend = \"sqlite\" to inspect them");
    }
    let path = sqlite_path(store)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let url = format!("sqlite:{}?mode=rwc", path.display());
    let sqlite = SqliteSessionStore::new(&url)
        .await
        .with_context(|| format!("failed to open session store at {}", path.display()))?;
    info!(path = %path.display(), "using sqlite session store");
    Ok(sqlite)
}
