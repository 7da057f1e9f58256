//! Authentication using Axum extractors
//!
//! `/access` logs callers in with HTTP Basic credentials whose username
//! names the requested tier: `"1#bob"` asks for `Level1` as `bob`.

pub mod users;

pub use users::CredentialStore;

use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::WWW_AUTHENTICATE, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use axum_extra::{
    headers::{authorization::Basic, Authorization},
    TypedHeader,
};
use gatekeeper_applications::IdentityProvider;
use gatekeeper_core::Principal;
use tracing::{debug, warn};

/// A caller whose Basic credentials were accepted
#[derive(Debug, Clone)]
pub struct BasicPrincipal(pub Principal);

/// Authentication failure with a Basic challenge
#[derive(Debug)]
pub struct Unauthorized {
    message: &'static str,
}

impl Unauthorized {
    fn missing() -> Self {
        Self {
            message: "Basic credentials required",
        }
    }

    fn rejected() -> Self {
        Self {
            message: "Invalid credentials or access level",
        }
    }
}

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "authenticated": false,
                "message": self.message,
            })),
        )
            .into_response();
        response.headers_mut().insert(
            WWW_AUTHENTICATE,
            HeaderValue::from_static("Basic realm=\"gatekeeper\""),
        );
        response
    }
}

impl<S> FromRequestParts<S> for BasicPrincipal
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Unauthorized;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let TypedHeader(Authorization(basic)) =
            TypedHeader::<Authorization<Basic>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    debug!("Missing or unreadable Basic credentials");
                    Unauthorized::missing()
                })?;

        match app_state
            .credentials
            .authenticate(basic.username(), basic.password())
            .await
        {
            Some(principal) => Ok(BasicPrincipal(principal)),
            None => {
                warn!(username = basic.username(), "Rejected login");
                Err(Unauthorized::rejected())
            }
        }
    }
}
