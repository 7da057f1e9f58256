//! Gate middleware
//!
//! Converts each request into an [`IncomingRequest`], runs the gatekeeper and
//! writes the resulting cookies onto the response.

use crate::{
    cookies,
    responses::{GateRejection, Violation},
    AppState,
};
use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::CookieJar;
use gatekeeper_applications::{GateOutcome, IncomingRequest, RequestContext};
use std::collections::HashMap;
use tracing::{debug, warn};

/// The path the static file service resolves `raw` to.
///
/// Percent escapes are decoded, empty and `.` segments dropped, and a
/// trailing slash names the directory's `index.html`. `None` when the path
/// does not decode or climbs with `..`.
pub fn canonical_path(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).ok()?;

    let mut segments = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            segment => segments.push(segment),
        }
    }

    let mut path = format!("/{}", segments.join("/"));
    if decoded.ends_with('/') {
        if !segments.is_empty() {
            path.push('/');
        }
        path.push_str("index.html");
    }
    Some(path)
}

/// Build the gate's view of an HTTP request; `None` for an unusable path
pub fn incoming_request(request: &Request) -> Option<IncomingRequest> {
    let path = canonical_path(request.uri().path())?;
    let mut incoming = IncomingRequest::new(request.method().as_str(), path);

    for (name, value) in request.headers() {
        if let Ok(value) = value.to_str() {
            incoming = incoming.with_header(name.as_str(), value);
        }
    }

    for cookie in CookieJar::from_headers(request.headers()).iter() {
        incoming = incoming.with_cookie(cookie.name(), cookie.value());
    }

    if let Ok(Query(params)) = Query::<HashMap<String, String>>::try_from_uri(request.uri()) {
        for (name, value) in &params {
            incoming = incoming.with_param(name, value);
        }
    }

    Some(incoming)
}

/// Gate every request; denials never reach the inner service
pub async fn gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(incoming) = incoming_request(&request) else {
        warn!(path = %request.uri().path(), "Rejected request path");
        return (
            StatusCode::BAD_REQUEST,
            Json(Violation::message("invalid request path")),
        )
            .into_response();
    };

    // Share one context per request even when the gate is layered twice
    let ctx = match request.extensions().get::<RequestContext>() {
        Some(ctx) => ctx.clone(),
        None => {
            let ctx = RequestContext::new();
            request.extensions_mut().insert(ctx.clone());
            ctx
        }
    };

    let response = match state.gatekeeper.check(&incoming, &ctx).await {
        Ok(GateOutcome::Skipped) => return next.run(request).await,
        Ok(GateOutcome::Allowed) => next.run(request).await,
        Err(e) => GateRejection(e).into_response(),
    };

    // Handlers may have recorded an authentication event on the context
    let pending = ctx.pending_cookies();
    debug!(
        path = %incoming.path,
        session_cookie = pending.session.is_some(),
        csrf_cookie = pending.csrf.is_some(),
        "Writing gate cookies"
    );
    (cookies::pending_jar(&pending), response).into_response()
}
