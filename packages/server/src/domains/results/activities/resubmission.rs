//! Lecturer score submission, correction and resubmission.
//!
//! The one write path for CA/exam scores. Creation is gated on an active
//! enrollment; edits coordinate with the approval machine instead of
//! silently overwriting a record that is inside the pipeline or already
//! published.

use sqlx::PgPool;
use tracing::info;

use crate::common::{AcademicYear, CourseId, Semester, StudentId};
use crate::domains::registration::models::Enrollment;
use crate::domains::results::error::ApprovalError;
use crate::domains::results::grading::{self, ScoreBounds};
use crate::domains::results::machine::ScoreStatus;
use crate::domains::results::models::{ApprovalLedgerEntry, ScoreRecord};

/// A lecturer's score entry for one enrollment.
#[derive(Debug, Clone)]
pub struct ScoreSubmission {
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub academic_year: AcademicYear,
    pub semester: Semester,
    pub ca_score: i32,
    pub exam_score: i32,
}

/// Create or update a score record from a lecturer submission.
///
/// - No record yet: insert pending with its cycle-1 ledger rows.
/// - Record pending: plain correction, status untouched.
/// - Record rejected: resubmission. New scores, back to pending on the
///   next approval cycle, fresh pending ledger rows. The full three-tier
///   pipeline must then repeat before the result becomes visible.
/// - Anything else: the record is mid-pipeline or published, the edit is
///   refused with `InvalidTransition`.
pub async fn submit_score(
    submission: &ScoreSubmission,
    bounds: &ScoreBounds,
    pool: &PgPool,
) -> Result<ScoreRecord, ApprovalError> {
    grading::validate_scores(submission.ca_score, submission.exam_score, bounds)?;

    let enrolled = Enrollment::is_active(
        submission.student_id,
        submission.course_id,
        &submission.academic_year,
        submission.semester,
        pool,
    )
    .await?;
    if !enrolled {
        return Err(ApprovalError::NotEnrolled {
            student_id: submission.student_id.into_uuid(),
            course_id: submission.course_id.into_uuid(),
        });
    }

    let existing = ScoreRecord::find_by_enrollment(
        submission.student_id,
        submission.course_id,
        &submission.academic_year,
        submission.semester,
        pool,
    )
    .await?;

    match existing {
        None => {
            let mut tx = pool.begin().await.map_err(anyhow::Error::from)?;
            let record = ScoreRecord::create(
                submission.student_id,
                submission.course_id,
                &submission.academic_year,
                submission.semester,
                submission.ca_score,
                submission.exam_score,
                &mut *tx,
            )
            .await?;
            ApprovalLedgerEntry::create_cycle(record.id, record.approval_cycle, &mut *tx).await?;
            tx.commit().await.map_err(anyhow::Error::from)?;

            info!(record_id = %record.id, "score record created pending");
            Ok(record)
        }

        Some(record) if record.status == ScoreStatus::Pending => {
            let mut tx = pool.begin().await.map_err(anyhow::Error::from)?;
            let updated = ScoreRecord::update_scores(
                record.id,
                submission.ca_score,
                submission.exam_score,
                &mut *tx,
            )
            .await?;
            tx.commit().await.map_err(anyhow::Error::from)?;

            match updated {
                Some(updated) => Ok(updated),
                // Advanced between our read and the guarded update.
                None => {
                    Err(stale_edit_error(record.id, pool).await)
                }
            }
        }

        Some(record) if record.status == ScoreStatus::Rejected => {
            let mut tx = pool.begin().await.map_err(anyhow::Error::from)?;
            let updated = ScoreRecord::reset_for_resubmission(
                record.id,
                submission.ca_score,
                submission.exam_score,
                &mut *tx,
            )
            .await?;
            let Some(updated) = updated else {
                drop(tx);
                return Err(stale_edit_error(record.id, pool).await);
            };
            ApprovalLedgerEntry::create_cycle(updated.id, updated.approval_cycle, &mut *tx)
                .await?;
            tx.commit().await.map_err(anyhow::Error::from)?;

            info!(
                record_id = %updated.id,
                cycle = updated.approval_cycle,
                "rejected record resubmitted"
            );
            Ok(updated)
        }

        Some(record) => Err(ApprovalError::InvalidTransition {
            expected: ScoreStatus::Pending,
            actual: record.status,
        }),
    }
}

/// Error for an edit that lost a race with the approval pipeline: report
/// the status the record actually holds now.
async fn stale_edit_error(
    record_id: crate::common::ScoreRecordId,
    pool: &PgPool,
) -> ApprovalError {
    let actual = match ScoreRecord::find_by_id(record_id, pool).await {
        Ok(Some(record)) => record.status,
        _ => ScoreStatus::Pending,
    };
    ApprovalError::InvalidTransition {
        expected: ScoreStatus::Pending,
        actual,
    }
}
