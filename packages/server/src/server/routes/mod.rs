//! REST routes for the administrative and student-facing surface.

pub mod health;
pub mod registration;
pub mod results;
pub mod sessions;

pub use health::health_handler;
pub use registration::derive_registration_handler;
pub use results::{
    batch_decision_handler, decision_handler, list_records_handler, record_ledger_handler,
    student_results_handler, submit_score_handler,
};
pub use sessions::{activate_session_handler, current_session_handler};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Serialize;
use tracing::error;

use crate::domains::results::ApprovalError;
use crate::server::middleware::{AuthError, AuthUser};

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Unified error type for route handlers.
#[derive(Debug)]
pub enum ApiError {
    Approval(ApprovalError),
    Auth(AuthError),
    BadRequest(String),
}

impl From<ApprovalError> for ApiError {
    fn from(e: ApprovalError) -> Self {
        ApiError::Approval(e)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Auth(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Approval(e) => match &e {
                ApprovalError::InvalidTransition { .. } => {
                    let message = if e.is_already_processed() {
                        "this record has already moved past the expected state".to_string()
                    } else {
                        e.to_string()
                    };
                    (StatusCode::CONFLICT, "invalid_transition", message)
                }
                ApprovalError::MissingReason => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "missing_reason",
                    e.to_string(),
                ),
                ApprovalError::NotEnrolled { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "not_enrolled",
                    e.to_string(),
                ),
                ApprovalError::Validation(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "validation",
                    e.to_string(),
                ),
                ApprovalError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", e.to_string()),
                ApprovalError::Persistence(inner) => {
                    error!(error = %inner, "persistence failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal",
                        "internal error".to_string(),
                    )
                }
            },
            ApiError::Auth(e) => match &e {
                AuthError::AuthenticationRequired | AuthError::InvalidToken => {
                    (StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string())
                }
                AuthError::PermissionDenied(_) | AuthError::AdminRequired => {
                    (StatusCode::FORBIDDEN, "forbidden", e.to_string())
                }
            },
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}

/// Unwrap the `AuthUser` the JWT middleware put in request extensions.
/// Requests without a valid token fail 401 here.
pub fn require_auth(auth: Option<Extension<AuthUser>>) -> Result<AuthUser, ApiError> {
    auth.map(|Extension(user)| user)
        .ok_or(ApiError::Auth(AuthError::AuthenticationRequired))
}
