//! SQLite-backed session store using sqlx.

use std::time::Duration;

use {
    async_trait::async_trait,
    sqlx::{Row, SqlitePool, sqlite::SqlitePoolOptions},
    tracing::debug,
};

use crate::{Result, SessionRecord, SessionStore, record::now_ms};

/// Sessions stored one row per user, with the record JSON-encoded and the
/// deadline kept in its own indexed column.
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Open (creating if needed) the database at `database_url` and run
    /// migrations.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        crate::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Store on an existing pool. [`crate::run_migrations`] must have run.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the sessions table directly.
    ///
    /// Used by tests on in-memory databases; production code goes through
    /// [`crate::run_migrations`].
    #[doc(hidden)]
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS router_sessions (
                user_id    TEXT    PRIMARY KEY,
                data       TEXT    NOT NULL,
                expires_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Absolute deadline in unix milliseconds, saturating at `i64::MAX`.
fn deadline_ms(expiry: Duration) -> i64 {
    let expiry_ms = u64::try_from(expiry.as_millis()).unwrap_or(u64::MAX);
    i64::try_from(now_ms().saturating_add(expiry_ms)).unwrap_or(i64::MAX)
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, user_id: &str) -> Result<Option<SessionRecord>> {
        let data = sqlx::query_scalar::<_, String>(
            "SELECT data FROM router_sessions WHERE user_id = ? AND expires_at > ?",
        )
        .bind(user_id)
        .bind(now_ms() as i64)
        .fetch_optional(&self.pool)
        .await?;
        data.map(|d| serde_json::from_str(&d))
            .transpose()
            .map_err(Into::into)
    }

    async fn save(&self, record: &SessionRecord, expiry: Duration) -> Result<()> {
        let data = serde_json::to_string(record)?;
        sqlx::query(
            r#"INSERT INTO router_sessions (user_id, data, expires_at, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                 data = excluded.data,
                 expires_at = excluded.expires_at,
                 updated_at = excluded.updated_at"#,
        )
        .bind(&record.user_id)
        .bind(&data)
        .bind(deadline_ms(expiry))
        .bind(record.updated_at as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM router_sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            debug!(user_id, "clear on absent session");
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionRecord>> {
        let rows = sqlx::query(
            "SELECT data FROM router_sessions WHERE expires_at > ? ORDER BY updated_at DESC",
        )
        .bind(now_ms() as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row.get("data");
            records.push(serde_json::from_str(&data)?);
        }
        Ok(records)
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM router_sessions WHERE expires_at <= ?")
            .bind(now_ms() as i64)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
