//! Request gatekeeper
//!
//! Runs once per request context and walks
//! `Unchecked -> SessionResolved -> PolicyResolved` before ending in
//! `Allowed` or one of the two denial kinds.

use super::{IncomingRequest, RequestContext};
use crate::auth::PolicyRegistry;
use crate::csrf::{CsrfGuard, CsrfViolation};
use crate::session::{SessionManager, GRANT_COOKIE};
use crate::{ApplicationError, ApplicationResult};
use gatekeeper_core::{AccessLevel, Principal};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Successful gate results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Downstream handling may proceed
    Allowed,
    /// The context was already gated earlier in this request
    Skipped,
}

/// Gate denials and failures
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("invalid access level")]
    AccessDenied { required: AccessLevel },

    #[error(transparent)]
    Csrf(#[from] CsrfViolation),

    #[error(transparent)]
    Application(#[from] ApplicationError),
}

impl From<gatekeeper_core::GatekeeperError> for GateError {
    fn from(error: gatekeeper_core::GatekeeperError) -> Self {
        GateError::Application(ApplicationError::Core(error))
    }
}

/// Progress of one request through the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unchecked,
    SessionResolved,
    PolicyResolved,
    Allowed,
    AccessDenied,
    CsrfDenied,
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GateState::Unchecked => "unchecked",
            GateState::SessionResolved => "session_resolved",
            GateState::PolicyResolved => "policy_resolved",
            GateState::Allowed => "allowed",
            GateState::AccessDenied => "access_denied",
            GateState::CsrfDenied => "csrf_denied",
        };
        f.write_str(name)
    }
}

pub struct Gatekeeper {
    sessions: Arc<SessionManager>,
    csrf: Arc<CsrfGuard>,
    policies: Arc<PolicyRegistry>,
}

impl Gatekeeper {
    pub fn new(
        sessions: Arc<SessionManager>,
        csrf: Arc<CsrfGuard>,
        policies: Arc<PolicyRegistry>,
    ) -> Self {
        Self {
            sessions,
            csrf,
            policies,
        }
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    /// Decide whether `request` may proceed.
    ///
    /// Cookies to emit are recorded on `ctx` whatever the outcome; a minted
    /// anonymous session already exists in the store even when the request is
    /// denied.
    pub async fn check(
        &self,
        request: &IncomingRequest,
        ctx: &RequestContext,
    ) -> Result<GateOutcome, GateError> {
        if !ctx.mark_gated() {
            debug!(path = %request.path, "Request already gated");
            return Ok(GateOutcome::Skipped);
        }
        let mut state = GateState::Unchecked;

        let token = self
            .sessions
            .ensure_session_token(ctx, request.cookie(GRANT_COOKIE))
            .await?;
        let session = self.sessions.find_by_token(&token).await?;
        state = self.advance(request, state, GateState::SessionResolved);

        let Some(policy) = self.policies.match_for(&request.path) else {
            self.advance(request, state, GateState::Allowed);
            return Ok(GateOutcome::Allowed);
        };
        state = self.advance(request, state, GateState::PolicyResolved);

        let held = session
            .as_ref()
            .filter(|s| !self.sessions.is_expired(Some(*s)))
            .map(|s| s.grant);
        let effective = held.or(policy.allow_anonymous.then(AccessLevel::lowest));

        if policy.required.exceeds(effective) {
            self.advance(request, state, GateState::AccessDenied);
            warn!(
                path = %request.path,
                policy = %policy.name,
                required = %policy.required,
                held = ?held,
                "Access denied"
            );
            return Err(GateError::AccessDenied {
                required: policy.required,
            });
        }

        if let Err(violation) = self.csrf.validate(request) {
            self.advance(request, state, GateState::CsrfDenied);
            warn!(path = %request.path, policy = %policy.name, %violation, "CSRF check failed");
            return Err(violation.into());
        }

        self.advance(request, state, GateState::Allowed);
        info!(path = %request.path, policy = %policy.name, "Request allowed");
        Ok(GateOutcome::Allowed)
    }

    /// Record an authentication event on a gated request.
    ///
    /// Resolves the principal's session, issues a fresh CSRF token and leaves
    /// both on `ctx` for the response.
    pub async fn authenticate(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
    ) -> ApplicationResult<bool> {
        let candidate = ctx.session_token().ok_or_else(|| {
            ApplicationError::precondition("Authentication attempted on an ungated request")
        })?;

        let session = self
            .sessions
            .resolve_authenticated_session(&principal.id, principal.level, &candidate)
            .await?;
        let csrf = self.csrf.issue();

        info!(principal = %principal.id, level = %principal.level, "Authenticated");
        ctx.record_authentication(session, csrf);
        Ok(true)
    }

    fn advance(&self, request: &IncomingRequest, from: GateState, to: GateState) -> GateState {
        debug!(path = %request.path, %from, %to, "Gate transition");
        to
    }
}
