//! Active academic session management.

use axum::extract::Extension;
use axum::Json;
use serde::Deserialize;

use super::{require_auth, ApiError};
use crate::common::{AcademicYear, Semester};
use crate::domains::results::machine::ApprovalTier;
use crate::domains::results::ApprovalError;
use crate::domains::sessions::AcademicSession;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// GET /api/session: the currently active academic session.
pub async fn current_session_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
) -> Result<Json<AcademicSession>, ApiError> {
    require_auth(auth)?;

    let session = AcademicSession::current(&state.db_pool)
        .await
        .map_err(ApprovalError::Persistence)?
        .ok_or_else(|| ApprovalError::NotFound("active academic session".to_string()))?;

    Ok(Json(session))
}

#[derive(Debug, Deserialize)]
pub struct ActivateSessionRequest {
    pub academic_year: AcademicYear,
    pub semester: Semester,
}

/// PUT /api/session: make a session the active one (senate admins only).
pub async fn activate_session_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(request): Json<ActivateSessionRequest>,
) -> Result<Json<AcademicSession>, ApiError> {
    let auth = require_auth(auth)?;
    let activated_by = auth.require_tier(ApprovalTier::Senate)?;

    let session = AcademicSession::activate(
        &request.academic_year,
        request.semester,
        activated_by,
        &state.db_pool,
    )
    .await
    .map_err(ApprovalError::Persistence)?;

    Ok(Json(session))
}
