//! Score submission, approval decisions and result queries.

use axum::extract::{Extension, Path, Query};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{require_auth, ApiError};
use crate::common::{AcademicYear, CourseId, ScoreRecordId, Semester, StudentId};
use crate::domains::results::activities::{
    advance_batch, advance_record, notify_transition, submit_score, BulkAdvanceFilter,
    BulkAdvanceOutcome, ScoreSubmission,
};
use crate::domains::results::machine::{ApprovalTier, ReviewDecision, ScoreStatus};
use crate::domains::results::models::{ApprovalLedgerEntry, ScoreRecord};
use crate::domains::results::ApprovalError;
use crate::domains::sessions::AcademicSession;
use crate::domains::users::Role;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

// =============================================================================
// POST /api/results - lecturer score submission
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitScoreRequest {
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub academic_year: AcademicYear,
    pub semester: Semester,
    pub ca_score: i32,
    pub exam_score: i32,
}

pub async fn submit_score_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(request): Json<SubmitScoreRequest>,
) -> Result<Json<ScoreRecord>, ApiError> {
    let auth = require_auth(auth)?;
    auth.require_role(Role::Lecturer)?;

    let submission = ScoreSubmission {
        student_id: request.student_id,
        course_id: request.course_id,
        academic_year: request.academic_year,
        semester: request.semester,
        ca_score: request.ca_score,
        exam_score: request.exam_score,
    };

    let record = submit_score(&submission, &state.score_bounds, &state.db_pool).await?;
    Ok(Json(record))
}

// =============================================================================
// POST /api/results/:id/decision - advance one record
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub tier: ApprovalTier,
    pub decision: ReviewDecision,
    pub comments: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub record: ScoreRecord,
    pub entry: ApprovalLedgerEntry,
}

pub async fn decision_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(record_id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let auth = require_auth(auth)?;
    let decided_by = auth.require_tier(request.tier)?;

    let outcome = advance_record(
        ScoreRecordId::from_uuid(record_id),
        request.tier,
        request.decision,
        request.comments.as_deref(),
        decided_by,
        &state.db_pool,
    )
    .await?;

    notify_transition(
        &outcome,
        request.tier,
        request.decision,
        state.notifier.as_ref(),
        &state.db_pool,
    )
    .await;

    Ok(Json(DecisionResponse {
        record: outcome.record,
        entry: outcome.entry,
    }))
}

// =============================================================================
// POST /api/results/decisions - advance a filtered batch
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct BatchDecisionRequest {
    pub academic_year: Option<AcademicYear>,
    pub semester: Option<Semester>,
    pub tier: ApprovalTier,
    pub decision: ReviewDecision,
    pub comments: Option<String>,
}

pub async fn batch_decision_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(request): Json<BatchDecisionRequest>,
) -> Result<Json<BulkAdvanceOutcome>, ApiError> {
    let auth = require_auth(auth)?;
    let decided_by = auth.require_tier(request.tier)?;

    let (academic_year, semester) = resolve_term(
        request.academic_year,
        request.semester,
        &state,
    )
    .await?;

    let outcome = advance_batch(
        &BulkAdvanceFilter {
            academic_year,
            semester,
        },
        request.tier,
        request.decision,
        request.comments.as_deref(),
        decided_by,
        state.notifier.as_ref(),
        &state.db_pool,
    )
    .await?;

    Ok(Json(outcome))
}

/// A batch that names no term targets the active academic session. Naming
/// only half a term is a caller mistake.
async fn resolve_term(
    academic_year: Option<AcademicYear>,
    semester: Option<Semester>,
    state: &AppState,
) -> Result<(AcademicYear, Semester), ApiError> {
    match (academic_year, semester) {
        (Some(year), Some(semester)) => Ok((year, semester)),
        (None, None) => {
            let session = AcademicSession::current(&state.db_pool)
                .await
                .map_err(ApprovalError::Persistence)?
                .ok_or_else(|| {
                    ApiError::BadRequest(
                        "no active academic session; pass academic_year and semester".to_string(),
                    )
                })?;
            Ok((session.academic_year, session.semester))
        }
        _ => Err(ApiError::BadRequest(
            "academic_year and semester must be supplied together".to_string(),
        )),
    }
}

// =============================================================================
// GET /api/results - admin review listing
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListRecordsQuery {
    pub academic_year: AcademicYear,
    pub semester: Semester,
    pub status: Option<ScoreStatus>,
}

pub async fn list_records_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Query(query): Query<ListRecordsQuery>,
) -> Result<Json<Vec<ScoreRecord>>, ApiError> {
    let auth = require_auth(auth)?;
    auth.require_admin()?;

    let records = ScoreRecord::find_for_term(
        &query.academic_year,
        query.semester,
        query.status,
        &state.db_pool,
    )
    .await
    .map_err(ApprovalError::Persistence)?;

    Ok(Json(records))
}

// =============================================================================
// GET /api/results/:id/ledger - audit trail for one record
// =============================================================================

pub async fn record_ledger_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(record_id): Path<Uuid>,
) -> Result<Json<Vec<ApprovalLedgerEntry>>, ApiError> {
    let auth = require_auth(auth)?;
    auth.require_admin()?;

    let entries =
        ApprovalLedgerEntry::find_for_record(ScoreRecordId::from_uuid(record_id), &state.db_pool)
            .await
            .map_err(ApprovalError::Persistence)?;

    Ok(Json(entries))
}

// =============================================================================
// GET /api/students/:id/results - the visibility boundary
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct StudentResultsQuery {
    pub academic_year: AcademicYear,
    pub semester: Semester,
}

pub async fn student_results_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(student_id): Path<Uuid>,
    Query(query): Query<StudentResultsQuery>,
) -> Result<Json<Vec<ScoreRecord>>, ApiError> {
    let auth = require_auth(auth)?;
    let student_id = StudentId::from_uuid(student_id);
    auth.can_view_student(student_id)?;

    // Only senate-approved records ever leave this query.
    let records = ScoreRecord::find_visible_for_student(
        student_id,
        &query.academic_year,
        query.semester,
        &state.db_pool,
    )
    .await
    .map_err(ApprovalError::Persistence)?;

    Ok(Json(records))
}
