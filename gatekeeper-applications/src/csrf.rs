//! Double-submit CSRF protection
//!
//! A token is 8 random bytes as 16 upper-case hex characters, an underscore,
//! and the absolute expiry in epoch seconds:
//!
//! ```text
//! 9F86D081884C7D65_1767225600
//! ```
//!
//! The token travels in the `CSRF` cookie and must be echoed back verbatim in
//! the `XSRF` header (or `XSRF` query parameter).

use crate::gate::IncomingRequest;
use crate::session::{CSRF_COOKIE, XSRF_HEADER};
use crate::tokens::TokenGenerator;
use gatekeeper_core::{Clock, CSRF_TOKEN_BYTES};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use tracing::debug;

static TOKEN_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{16}_[0-9]{10}$").expect("token format regex is valid")
});

/// Why a request failed the CSRF check
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CsrfViolation {
    #[error("Either the CSRF Token or the XSRF token is missing.")]
    Missing,
    #[error("CSRF Token is not valid.")]
    Malformed,
    #[error("CSRF/XSRF failed validation.")]
    Mismatch,
    #[error("CSRF token expired.")]
    Expired,
}

/// A CSRF token to hand back to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfCookie {
    pub value: String,
    pub max_age_seconds: i64,
}

impl CsrfCookie {
    pub fn new<S: Into<String>>(value: S, max_age_seconds: i64) -> Self {
        Self {
            value: value.into(),
            max_age_seconds,
        }
    }
}

pub struct CsrfGuard {
    ttl_seconds: i64,
    tokens: Arc<dyn TokenGenerator>,
    clock: Arc<dyn Clock>,
}

impl CsrfGuard {
    pub fn new(ttl_seconds: u32, tokens: Arc<dyn TokenGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl_seconds: i64::from(ttl_seconds),
            tokens,
            clock,
        }
    }

    /// Mint a fresh token expiring one TTL from now
    pub fn issue(&self) -> CsrfCookie {
        let expires_at = self.clock.now().timestamp() + self.ttl_seconds;
        let value = format!(
            "{}_{:010}",
            self.tokens.hex_token(CSRF_TOKEN_BYTES),
            expires_at
        );
        CsrfCookie::new(value, self.ttl_seconds)
    }

    /// Check the echoed guard value against the cookie
    pub fn validate(&self, request: &IncomingRequest) -> Result<(), CsrfViolation> {
        let guard = request
            .header(XSRF_HEADER)
            .or_else(|| request.param(XSRF_HEADER));
        let cookie = request.cookie(CSRF_COOKIE);

        let cookie = match (guard, cookie) {
            (None, None) => return Err(CsrfViolation::Missing),
            (_, Some(cookie)) if TOKEN_FORMAT.is_match(cookie) => cookie,
            _ => return Err(CsrfViolation::Malformed),
        };

        if guard != Some(cookie) {
            return Err(CsrfViolation::Mismatch);
        }

        let expires_at = cookie
            .rsplit_once('_')
            .and_then(|(_, epoch)| epoch.parse::<i64>().ok())
            .ok_or(CsrfViolation::Malformed)?;

        if expires_at - self.clock.now().timestamp() <= 0 {
            return Err(CsrfViolation::Expired);
        }

        debug!(path = %request.path, "CSRF check passed");
        Ok(())
    }
}
