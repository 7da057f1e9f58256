//! Set-Cookie rendering for gate tokens

use axum_extra::extract::cookie::{Cookie, CookieJar};
use gatekeeper_applications::{CsrfCookie, PendingCookies, SessionCookie, CSRF_COOKIE, GRANT_COOKIE};

/// `GRANT` cookie: script-inaccessible, site-wide
pub fn session_cookie(session: &SessionCookie) -> Cookie<'static> {
    Cookie::build((GRANT_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(session.max_age_seconds))
        .build()
}

/// `CSRF` cookie: readable by scripts so clients can echo it in `XSRF`
pub fn csrf_cookie(csrf: &CsrfCookie) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, csrf.value.clone()))
        .path("/")
        .max_age(time::Duration::seconds(csrf.max_age_seconds))
        .build()
}

/// Jar holding every pending cookie, ready to merge into a response
pub fn pending_jar(pending: &PendingCookies) -> CookieJar {
    let mut jar = CookieJar::new();
    if let Some(session) = &pending.session {
        jar = jar.add(session_cookie(session));
    }
    if let Some(csrf) = &pending.csrf {
        jar = jar.add(csrf_cookie(csrf));
    }
    jar
}
