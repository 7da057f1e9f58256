//! Session storage backends
//!
//! In-memory and SQLite implementations of [`SessionStore`]. Both make
//! `insert_if_absent` and `save` single atomic writes.

use async_trait::async_trait;
use gatekeeper_core::{AccessLevel, GatekeeperResult, Session, SessionStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory session storage (default implementation)
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored rows
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find_by_token(&self, token: &str) -> GatekeeperResult<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(token).cloned())
    }

    async fn find_latest_for(
        &self,
        principal_id: &str,
        grant: AccessLevel,
    ) -> GatekeeperResult<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .filter(|s| s.grant == grant && s.principal_id.as_deref() == Some(principal_id))
            .max_by_key(|s| s.expires_at)
            .cloned())
    }

    async fn insert_if_absent(&self, session: &Session) -> GatekeeperResult<bool> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.token) {
            return Ok(false);
        }
        sessions.insert(session.token.clone(), session.clone());
        debug!(grant = %session.grant, "Created session in memory storage");
        Ok(true)
    }

    async fn save(&self, session: &Session) -> GatekeeperResult<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token.clone(), session.clone());
        debug!(grant = %session.grant, "Saved session to memory storage");
        Ok(())
    }
}

/// SQLite session storage implementation
#[cfg(feature = "sqlite")]
pub struct SqliteSessionStore {
    pool: sqlx::SqlitePool,
}

#[cfg(feature = "sqlite")]
impl SqliteSessionStore {
    const COMPONENT: &'static str = "sqlite_session_store";

    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect and make sure the schema exists
    pub async fn from_url(database_url: &str) -> GatekeeperResult<Self> {
        let options: sqlx::sqlite::SqliteConnectOptions = database_url.parse().map_err(|e| {
            gatekeeper_core::storage_error!(
                format!("Invalid SQLite URL '{}'", database_url),
                Self::COMPONENT,
                e
            )
        })?;

        let pool = Self::pool_options(database_url)
            .connect_with(options.create_if_missing(true))
            .await
            .map_err(|e| {
                gatekeeper_core::storage_error!(
                    "Failed to connect to SQLite database",
                    Self::COMPONENT,
                    e
                )
            })?;

        let store = Self::new(pool);
        store.create_tables().await?;
        Ok(store)
    }

    /// Pool settings for `database_url`
    ///
    /// An in-memory database lives and dies with its one connection, so that
    /// connection is pinned: never reaped as idle and never recycled.
    pub fn pool_options(database_url: &str) -> sqlx::sqlite::SqlitePoolOptions {
        let options = sqlx::sqlite::SqlitePoolOptions::new();
        if database_url.contains(":memory:") {
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options.max_connections(5)
        }
    }

    /// Create the sessions table and its lookup index
    pub async fn create_tables(&self) -> GatekeeperResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                principal_id TEXT,
                grant_level INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            gatekeeper_core::storage_error!("Failed to create sessions table", Self::COMPONENT, e)
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sessions_principal ON sessions (principal_id, grant_level, expires_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            gatekeeper_core::storage_error!("Failed to create sessions index", Self::COMPONENT, e)
        })?;

        Ok(())
    }

    fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> GatekeeperResult<Session> {
        use sqlx::Row;

        let column_error = |column: &str, e: sqlx::Error| {
            gatekeeper_core::storage_error!(
                format!("Failed to get {} column", column),
                Self::COMPONENT,
                e
            )
        };

        let rank: i64 = row
            .try_get("grant_level")
            .map_err(|e| column_error("grant_level", e))?;
        let grant = u8::try_from(rank)
            .ok()
            .and_then(AccessLevel::from_rank)
            .ok_or_else(|| {
                gatekeeper_core::storage_error!(
                    format!("Unknown grant level {} in sessions table", rank),
                    Self::COMPONENT
                )
            })?;

        let millis: i64 = row
            .try_get("expires_at")
            .map_err(|e| column_error("expires_at", e))?;
        let expires_at = chrono::DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            gatekeeper_core::storage_error!(
                format!("Out of range expiry {} in sessions table", millis),
                Self::COMPONENT
            )
        })?;

        Ok(Session {
            token: row.try_get("token").map_err(|e| column_error("token", e))?,
            principal_id: row
                .try_get("principal_id")
                .map_err(|e| column_error("principal_id", e))?,
            grant,
            expires_at,
        })
    }
}

#[cfg(feature = "sqlite")]
#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn find_by_token(&self, token: &str) -> GatekeeperResult<Option<Session>> {
        let row = sqlx::query(
            "SELECT token, principal_id, grant_level, expires_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            gatekeeper_core::storage_error!("Failed to load session", Self::COMPONENT, e)
        })?;

        row.as_ref().map(Self::row_to_session).transpose()
    }

    async fn find_latest_for(
        &self,
        principal_id: &str,
        grant: AccessLevel,
    ) -> GatekeeperResult<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT token, principal_id, grant_level, expires_at FROM sessions
            WHERE principal_id = ? AND grant_level = ?
            ORDER BY expires_at DESC
            LIMIT 1
            "#,
        )
        .bind(principal_id)
        .bind(grant.rank() as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            gatekeeper_core::storage_error!("Failed to query latest session", Self::COMPONENT, e)
        })?;

        row.as_ref().map(Self::row_to_session).transpose()
    }

    async fn insert_if_absent(&self, session: &Session) -> GatekeeperResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO sessions (token, principal_id, grant_level, expires_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(token) DO NOTHING
            "#,
        )
        .bind(&session.token)
        .bind(&session.principal_id)
        .bind(session.grant.rank() as i64)
        .bind(session.expires_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            gatekeeper_core::storage_error!("Failed to create session", Self::COMPONENT, e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn save(&self, session: &Session) -> GatekeeperResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, principal_id, grant_level, expires_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(token) DO UPDATE SET
                principal_id = excluded.principal_id,
                grant_level = excluded.grant_level,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(&session.token)
        .bind(&session.principal_id)
        .bind(session.grant.rank() as i64)
        .bind(session.expires_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            gatekeeper_core::storage_error!("Failed to save session", Self::COMPONENT, e)
        })?;

        debug!(grant = %session.grant, "Saved session to SQLite storage");
        Ok(())
    }

    async fn health_check(&self) -> GatekeeperResult<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                gatekeeper_core::storage_error!("SQLite health check failed", Self::COMPONENT, e)
            })?;

        Ok(())
    }
}
