//! Route definitions for the gatekeeper web server

use crate::{handlers, AppState};
use axum::{routing::get, Router};

/// Routes served behind the gate; everything else falls through to static files
pub fn gate_routes() -> Router<AppState> {
    Router::new()
        .route("/access", get(handlers::access))
        .route("/resources", get(handlers::resources))
        .route("/home", get(handlers::home))
}
