//! JSON denial bodies

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use gatekeeper_applications::{ApplicationError, GateError};
use gatekeeper_core::AccessLevel;
use serde::Serialize;
use tracing::error;

/// Body of a 403 or 400 denial
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_access: Option<AccessLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csrf_passed: Option<bool>,
}

impl Violation {
    pub fn message<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            required_access: None,
            csrf_passed: None,
        }
    }
}

/// A gate failure rendered as an HTTP response
#[derive(Debug)]
pub struct GateRejection(pub GateError);

impl From<GateError> for GateRejection {
    fn from(error: GateError) -> Self {
        Self(error)
    }
}

impl From<ApplicationError> for GateRejection {
    fn from(error: ApplicationError) -> Self {
        Self(GateError::Application(error))
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self.0 {
            GateError::AccessDenied { required } => (
                StatusCode::FORBIDDEN,
                Json(Violation {
                    required_access: Some(required),
                    ..Violation::message("invalid access level")
                }),
            )
                .into_response(),
            GateError::Csrf(violation) => (
                StatusCode::BAD_REQUEST,
                Json(Violation {
                    csrf_passed: Some(false),
                    ..Violation::message(violation.to_string())
                }),
            )
                .into_response(),
            GateError::Application(e) => {
                if let ApplicationError::Core(core) = &e {
                    core.log();
                } else {
                    error!(error = %e, "Gate failed");
                }
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(Violation::message("Internal server error")),
                )
                    .into_response()
            }
        }
    }
}
