//! Core trait definitions

use crate::error::GatekeeperResult;
use crate::types::*;
use async_trait::async_trait;

/// Session persistence contract.
///
/// Implementations must make `insert_if_absent` and `save` single atomic
/// writes keyed by token; callers rely on that instead of read-then-write.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look a session up by its token
    async fn find_by_token(&self, token: &str) -> GatekeeperResult<Option<Session>>;

    /// Most recent session issued to `(principal_id, grant)`, ordered by
    /// `expires_at` descending
    async fn find_latest_for(
        &self,
        principal_id: &str,
        grant: AccessLevel,
    ) -> GatekeeperResult<Option<Session>>;

    /// Create the row unless one with the same token exists.
    ///
    /// Returns `true` when the row was created.
    async fn insert_if_absent(&self, session: &Session) -> GatekeeperResult<bool>;

    /// Upsert by token
    async fn save(&self, session: &Session) -> GatekeeperResult<()>;

    /// Health check for the storage backend
    async fn health_check(&self) -> GatekeeperResult<()> {
        Ok(())
    }
}
