//! Gatekeeper Applications - session, CSRF and access enforcement
//!
//! This crate holds the transport-agnostic gate built on gatekeeper-core:
//!
//! - Session lifecycle: anonymous creation, lazy expiry, promotion
//! - Tiered access enforcement against an ordered policy registry
//! - Double-submit CSRF validation
//!
//! ## Architecture
//!
//! - **Core** (gatekeeper-core): types, store contract, config, logging
//! - **Applications** (this crate): the gate pipeline and its services
//! - **Presentation** (gatekeeper-web): HTTP adapter, identity, server

pub mod auth;
pub mod csrf;
pub mod gate;
pub mod session;
pub mod tokens;

pub use auth::{
    IdentityProvider, PathMatcher, PolicyRegistry, ResourcePolicy, StaticIdentityProvider,
};
pub use csrf::{CsrfCookie, CsrfGuard, CsrfViolation};
pub use gate::{
    GateError, GateOutcome, GateState, Gatekeeper, IncomingRequest, PendingCookies,
    RequestContext,
};
pub use session::{
    MemorySessionStore, SessionCookie, SessionManager, CSRF_COOKIE, GRANT_COOKIE, XSRF_HEADER,
};
#[cfg(feature = "sqlite")]
pub use session::SqliteSessionStore;
pub use tokens::{SecureTokenGenerator, TokenGenerator};

use gatekeeper_core::{Clock, GatekeeperConfig, SessionStore, SystemClock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Core error: {0}")]
    Core(#[from] gatekeeper_core::GatekeeperError),

    /// A caller broke an operation's contract; fails only the current request
    #[error("Precondition failed: {message}")]
    Precondition { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;

impl ApplicationError {
    /// Create a precondition error
    pub fn precondition<S: Into<String>>(message: S) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }
}

/// Fully wired gatekeeper services
pub struct GatekeeperApplication {
    config: GatekeeperConfig,
    gatekeeper: Arc<Gatekeeper>,
    sessions: Arc<SessionManager>,
    csrf: Arc<CsrfGuard>,
    store: Arc<dyn SessionStore>,
}

/// Builder for GatekeeperApplication
pub struct GatekeeperApplicationBuilder {
    config: GatekeeperConfig,
    store: Option<Arc<dyn SessionStore>>,
    clock: Option<Arc<dyn Clock>>,
    tokens: Option<Arc<dyn TokenGenerator>>,
    static_paths: HashMap<String, Vec<String>>,
}

impl GatekeeperApplicationBuilder {
    pub fn new(config: GatekeeperConfig) -> Self {
        Self {
            config,
            store: None,
            clock: None,
            tokens: None,
            static_paths: HashMap::new(),
        }
    }

    /// Session store, in-memory by default
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Time source, system clock by default
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Request paths of the files under static directory `dir`, used by
    /// `static_dir` policy matchers
    pub fn with_static_paths<S: Into<String>>(mut self, dir: S, paths: Vec<String>) -> Self {
        self.static_paths.insert(dir.into(), paths);
        self
    }

    pub fn build(self) -> ApplicationResult<GatekeeperApplication> {
        self.config.validate()?;

        let store: Arc<dyn SessionStore> = match self.store {
            Some(store) => store,
            None => Arc::new(MemorySessionStore::new()),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let tokens: Arc<dyn TokenGenerator> = match self.tokens {
            Some(tokens) => tokens,
            None => Arc::new(SecureTokenGenerator),
        };

        let static_paths = self.static_paths;
        let policies = PolicyRegistry::from_config(&self.config.policies, |dir| {
            static_paths.get(dir).cloned().ok_or_else(|| {
                ApplicationError::config(format!("No static paths supplied for directory '{}'", dir))
            })
        })?;

        let sessions = Arc::new(SessionManager::new(
            store.clone(),
            tokens.clone(),
            clock.clone(),
            self.config.session.ttl_seconds,
        ));
        let csrf = Arc::new(CsrfGuard::new(self.config.csrf.ttl_seconds, tokens, clock));
        let gatekeeper = Arc::new(Gatekeeper::new(
            sessions.clone(),
            csrf.clone(),
            Arc::new(policies),
        ));

        info!(
            policies = self.config.policies.len(),
            session_ttl = self.config.session.ttl_seconds,
            csrf_ttl = self.config.csrf.ttl_seconds,
            "Gatekeeper application ready"
        );

        Ok(GatekeeperApplication {
            config: self.config,
            gatekeeper,
            sessions,
            csrf,
            store,
        })
    }
}

impl GatekeeperApplication {
    pub fn builder(config: GatekeeperConfig) -> GatekeeperApplicationBuilder {
        GatekeeperApplicationBuilder::new(config)
    }

    pub fn config(&self) -> &GatekeeperConfig {
        &self.config
    }

    pub fn gatekeeper(&self) -> Arc<Gatekeeper> {
        self.gatekeeper.clone()
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        self.sessions.clone()
    }

    pub fn csrf(&self) -> Arc<CsrfGuard> {
        self.csrf.clone()
    }

    pub fn store(&self) -> Arc<dyn SessionStore> {
        self.store.clone()
    }
}
