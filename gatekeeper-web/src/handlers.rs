//! HTTP request handlers
//!
//! Access control happens in the gate middleware before any of these run.

use crate::{auth::BasicPrincipal, responses::GateRejection, AppState};
use axum::{extract::State, response::Json, Extension};
use gatekeeper_applications::RequestContext;
use serde::Serialize;

/// Outcome of a login attempt
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub authenticated: bool,
}

/// Static resources known to the server
#[derive(Debug, Serialize)]
pub struct ResourcesResponse {
    pub resources: Vec<String>,
}

/// Authenticate the Basic credentials and hand out `GRANT` and `CSRF` cookies.
///
/// The cookies are recorded on the request context; the middleware writes
/// them once this handler returns.
pub async fn access(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    BasicPrincipal(principal): BasicPrincipal,
) -> Result<Json<AccessResponse>, GateRejection> {
    let authenticated = state.gatekeeper.authenticate(&ctx, &principal).await?;
    Ok(Json(AccessResponse { authenticated }))
}

/// List every file under the static root
pub async fn resources(State(state): State<AppState>) -> Json<ResourcesResponse> {
    Json(ResourcesResponse {
        resources: state.resources.as_ref().clone(),
    })
}

pub async fn home() -> &'static str {
    "any-app"
}
