//! Session cookie types and names

use serde::{Deserialize, Serialize};

/// Cookie carrying the session token
pub const GRANT_COOKIE: &str = "GRANT";

/// Cookie carrying the CSRF token
pub const CSRF_COOKIE: &str = "CSRF";

/// Header, or query parameter, echoing the CSRF token back
pub const XSRF_HEADER: &str = "XSRF";

/// A session token to hand back to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub token: String,
    /// Seconds the client should keep the cookie
    pub max_age_seconds: i64,
}

impl SessionCookie {
    pub fn new<S: Into<String>>(token: S, max_age_seconds: i64) -> Self {
        Self {
            token: token.into(),
            max_age_seconds,
        }
    }
}
