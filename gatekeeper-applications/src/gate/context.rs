//! Transport-neutral request view and per-request gate state

use crate::csrf::CsrfCookie;
use crate::session::SessionCookie;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// The parts of an inbound request the gate looks at
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    pub method: String,
    pub path: String,
    /// Header names are stored lower-cased
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    params: HashMap<String, String>,
}

impl IncomingRequest {
    pub fn new<M: Into<String>, P: Into<String>>(method: M, path: P) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn get<P: Into<String>>(path: P) -> Self {
        Self::new("GET", path)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Default)]
struct ContextState {
    gated: bool,
    session_token: Option<String>,
    minted_session: Option<SessionCookie>,
    authenticated_session: Option<SessionCookie>,
    csrf_cookie: Option<CsrfCookie>,
    authenticated: bool,
}

/// Cookies the transport must set on the response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingCookies {
    pub session: Option<SessionCookie>,
    pub csrf: Option<CsrfCookie>,
}

/// Mutable per-request state shared between the gate, handlers and the
/// response writer. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    state: Arc<Mutex<ContextState>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Set the once-marker. Returns `false` if it was already set.
    pub fn mark_gated(&self) -> bool {
        let mut state = self.state();
        !std::mem::replace(&mut state.gated, true)
    }

    pub fn is_gated(&self) -> bool {
        self.state().gated
    }

    pub fn session_token(&self) -> Option<String> {
        self.state().session_token.clone()
    }

    pub fn set_session_token(&self, token: &str) {
        self.state().session_token = Some(token.to_string());
    }

    /// Record a session created for this request
    pub fn record_minted_session(&self, cookie: SessionCookie) {
        let mut state = self.state();
        state.session_token = Some(cookie.token.clone());
        state.minted_session = Some(cookie);
    }

    /// Record a successful authentication event
    pub fn record_authentication(&self, session: SessionCookie, csrf: CsrfCookie) {
        let mut state = self.state();
        state.session_token = Some(session.token.clone());
        state.authenticated_session = Some(session);
        state.csrf_cookie = Some(csrf);
        state.authenticated = true;
    }

    pub fn minted_session(&self) -> Option<SessionCookie> {
        self.state().minted_session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().authenticated
    }

    /// Cookies to emit; an authenticated session supersedes a minted one
    pub fn pending_cookies(&self) -> PendingCookies {
        let state = self.state();
        PendingCookies {
            session: state
                .authenticated_session
                .clone()
                .or_else(|| state.minted_session.clone()),
            csrf: state.csrf_cookie.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_case_insensitive() {
        let request = IncomingRequest::get("/x").with_header("XSRF", "abc");
        assert_eq!(request.header("xsrf"), Some("abc"));
        assert_eq!(request.header("Xsrf"), Some("abc"));
        assert_eq!(request.cookie("XSRF"), None);
    }

    #[test]
    fn test_once_marker() {
        let ctx = RequestContext::new();
        let shared = ctx.clone();
        assert!(ctx.mark_gated());
        assert!(!shared.mark_gated());
        assert!(shared.is_gated());
    }

    #[test]
    fn test_authenticated_session_supersedes_minted() {
        let ctx = RequestContext::new();
        ctx.record_minted_session(SessionCookie::new("ANON", 3600));
        assert_eq!(ctx.pending_cookies().session.unwrap().token, "ANON");

        ctx.record_authentication(
            SessionCookie::new("AUTH", 1200),
            CsrfCookie::new("0123456789ABCDEF_1999999999", 3600),
        );
        let cookies = ctx.pending_cookies();
        assert_eq!(cookies.session.unwrap().token, "AUTH");
        assert!(cookies.csrf.is_some());
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.session_token().as_deref(), Some("AUTH"));
    }
}
