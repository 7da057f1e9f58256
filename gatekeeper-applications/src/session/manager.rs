//! Session Manager
//!
//! Creates anonymous sessions on first contact, evaluates expiry lazily, and
//! promotes a session to an authenticated principal at a given tier.

use super::SessionCookie;
use crate::gate::RequestContext;
use crate::tokens::TokenGenerator;
use crate::{ApplicationError, ApplicationResult};
use chrono::Duration;
use gatekeeper_core::{AccessLevel, Clock, Session, SessionStore, SESSION_TOKEN_BYTES};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

type PromotionKey = (String, AccessLevel);

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    tokens: Arc<dyn TokenGenerator>,
    clock: Arc<dyn Clock>,
    ttl_seconds: i64,
    /// One async lock per (principal, level) being promoted
    promotions: Mutex<HashMap<PromotionKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        tokens: Arc<dyn TokenGenerator>,
        clock: Arc<dyn Clock>,
        ttl_seconds: u32,
    ) -> Self {
        Self {
            store,
            tokens,
            clock,
            ttl_seconds: i64::from(ttl_seconds),
            promotions: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Token this request should use.
    ///
    /// A token already recorded on `ctx` wins. Otherwise a non-empty
    /// `incoming` token is adopted as is. Failing both, a fresh anonymous
    /// session is created and its cookie recorded on `ctx`.
    pub async fn ensure_session_token(
        &self,
        ctx: &RequestContext,
        incoming: Option<&str>,
    ) -> ApplicationResult<String> {
        if let Some(token) = ctx.session_token() {
            return Ok(token);
        }

        if let Some(token) = incoming.filter(|t| !t.is_empty()) {
            ctx.set_session_token(token);
            return Ok(token.to_string());
        }

        let token = self.tokens.hex_token(SESSION_TOKEN_BYTES);
        let session = Session::anonymous(
            token.clone(),
            self.clock.now() + Duration::seconds(self.ttl_seconds),
        );

        if !self.store.insert_if_absent(&session).await? {
            return Err(ApplicationError::internal(
                "Freshly generated session token already exists",
            ));
        }

        debug!("Minted anonymous session");
        ctx.record_minted_session(SessionCookie::new(token.clone(), self.ttl_seconds));
        Ok(token)
    }

    pub async fn find_by_token(&self, token: &str) -> ApplicationResult<Option<Session>> {
        Ok(self.store.find_by_token(token).await?)
    }

    /// An absent session counts as expired
    pub fn is_expired(&self, session: Option<&Session>) -> bool {
        session.map_or(true, |s| s.is_expired_at(self.clock.now()))
    }

    /// Hand out a session for `principal_id` at `grant`.
    ///
    /// An unexpired session already issued to the pair is reused with its
    /// remaining lifetime. Otherwise `candidate_token` is promoted in place
    /// with a full TTL.
    pub async fn resolve_authenticated_session(
        &self,
        principal_id: &str,
        grant: AccessLevel,
        candidate_token: &str,
    ) -> ApplicationResult<SessionCookie> {
        if principal_id.is_empty() {
            return Err(ApplicationError::precondition(
                "Authenticated session requested without a principal",
            ));
        }
        if candidate_token.is_empty() {
            return Err(ApplicationError::precondition(
                "Authenticated session requested without a session token",
            ));
        }

        let lock = self.promotion_lock(principal_id, grant);
        let _guard = lock.lock().await;

        let now = self.clock.now();
        if let Some(latest) = self.store.find_latest_for(principal_id, grant).await? {
            if !latest.is_expired_at(now) {
                debug!(principal = principal_id, grant = %grant, "Reusing live session");
                let remaining = latest.remaining_seconds(now);
                return Ok(SessionCookie::new(latest.token, remaining));
            }
        }

        let renewed_until = now + Duration::seconds(self.ttl_seconds);
        let session = match self.store.find_by_token(candidate_token).await? {
            Some(mut existing) => {
                existing.principal_id = Some(principal_id.to_string());
                existing.grant = grant;
                existing.expires_at = existing.expires_at.max(renewed_until);
                existing
            }
            None => Session {
                token: candidate_token.to_string(),
                principal_id: Some(principal_id.to_string()),
                grant,
                expires_at: renewed_until,
            },
        };

        self.store.save(&session).await?;
        info!(principal = principal_id, grant = %grant, "Promoted session");

        Ok(SessionCookie::new(session.token, self.ttl_seconds))
    }

    fn promotion_lock(&self, principal_id: &str, grant: AccessLevel) -> Arc<tokio::sync::Mutex<()>> {
        let mut promotions = self.promotions.lock().unwrap_or_else(|e| e.into_inner());
        // Drop locks nobody is holding or waiting on
        promotions.retain(|_, lock| Arc::strong_count(lock) > 1);
        promotions
            .entry((principal_id.to_string(), grant))
            .or_default()
            .clone()
    }
}
