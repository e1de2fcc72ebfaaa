//! Registration approval and derivation.

use axum::extract::{Extension, Path};
use axum::Json;
use uuid::Uuid;

use super::{require_auth, ApiError};
use crate::common::RegistrationId;
use crate::domains::registration::activities::{derive_for_registration, DeriveOutcome};
use crate::domains::results::machine::ApprovalTier;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// POST /api/registrations/:id/derive
///
/// Approve a pending registration and derive its enrollments and initial
/// pending score records. Department admins own registration approval.
/// Safe to re-run: created counts come back zero the second time.
pub async fn derive_registration_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(registration_id): Path<Uuid>,
) -> Result<Json<DeriveOutcome>, ApiError> {
    let auth = require_auth(auth)?;
    let decided_by = auth.require_tier(ApprovalTier::Department)?;

    let outcome = derive_for_registration(
        RegistrationId::from_uuid(registration_id),
        decided_by,
        &state.db_pool,
    )
    .await?;

    Ok(Json(outcome))
}
