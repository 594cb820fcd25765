//! Per-user router session records and the stores that keep them.
//!
//! A session is keyed by the user's address and carries the state the router
//! uses to interpret that user's next message. Every store honours an expiry:
//! a session not saved within its expiry window is treated as absent.

pub mod error;
pub mod memory;
pub mod record;
pub mod sqlite;
pub mod store;

pub use {
    error::{Error, Result},
    memory::MemorySessionStore,
    record::{SessionRecord, SessionState},
    sqlite::SqliteSessionStore,
    store::SessionStore,
};

/// Run database migrations for the sessions crate.
///
/// Creates the `router_sessions` table. Call at startup before handing the
/// pool to [`SqliteSessionStore::with_pool`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
