//! Registration derivation.
//!
//! Approving a course registration fans out into the term's enrollments and
//! their initial pending score records (with cycle-1 ledger rows), one per
//! gradable curriculum course for the student's level and semester.
//! Everything is keyed on natural uniqueness constraints and inserted with
//! `ON CONFLICT DO NOTHING`, so re-running the derivation duplicates
//! nothing.

use sqlx::PgPool;
use tracing::info;

use crate::common::{RegistrationId, UserId};
use crate::domains::registration::models::{Course, CourseRegistration, Enrollment, RegistrationStatus};
use crate::domains::results::error::ApprovalError;
use crate::domains::results::models::{ApprovalLedgerEntry, ScoreRecord};

/// What one derivation run created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DeriveOutcome {
    pub enrollments_created: u32,
    pub score_records_created: u32,
    /// Non-gradable curriculum courses (industrial training) left without
    /// score records.
    pub courses_skipped: u32,
}

/// Approve a registration and derive its enrollments and pending score
/// records. Idempotent: a second run returns zero-created counts.
pub async fn derive_for_registration(
    registration_id: RegistrationId,
    decided_by: UserId,
    pool: &PgPool,
) -> Result<DeriveOutcome, ApprovalError> {
    let registration = CourseRegistration::find_by_id(registration_id, pool)
        .await?
        .ok_or_else(|| ApprovalError::NotFound(format!("registration {registration_id}")))?;

    if registration.status == RegistrationStatus::Rejected {
        return Err(ApprovalError::Validation(
            "registration was rejected and cannot be derived".to_string(),
        ));
    }

    let courses =
        Course::find_for_level_semester(registration.level, registration.semester, pool).await?;

    let mut outcome = DeriveOutcome::default();
    let mut tx = pool.begin().await.map_err(anyhow::Error::from)?;

    if registration.status == RegistrationStatus::Pending {
        CourseRegistration::approve(registration_id, decided_by, &mut *tx).await?;
    }

    for course in &courses {
        if !course.course_type.is_gradable() {
            outcome.courses_skipped += 1;
            continue;
        }

        let enrollment = Enrollment::create_if_absent(
            registration.student_id,
            course.id,
            &registration.academic_year,
            registration.semester,
            Some(registration_id),
            &mut *tx,
        )
        .await?;
        if enrollment.is_some() {
            outcome.enrollments_created += 1;
        }

        let record = ScoreRecord::create_if_absent(
            registration.student_id,
            course.id,
            &registration.academic_year,
            registration.semester,
            &mut *tx,
        )
        .await?;
        if let Some(record) = record {
            ApprovalLedgerEntry::create_cycle(record.id, record.approval_cycle, &mut *tx).await?;
            outcome.score_records_created += 1;
        }
    }

    tx.commit().await.map_err(anyhow::Error::from)?;

    info!(
        registration_id = %registration_id,
        student_id = %registration.student_id,
        enrollments = outcome.enrollments_created,
        score_records = outcome.score_records_created,
        skipped = outcome.courses_skipped,
        "registration derived"
    );

    Ok(outcome)
}
