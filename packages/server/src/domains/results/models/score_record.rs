use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{AcademicYear, CourseId, ScoreRecordId, Semester, StudentId};
use crate::domains::results::grading;
use crate::domains::results::machine::ScoreStatus;

/// One student's outcome in one course for one term.
///
/// `total_score` and `letter_grade` are derived columns, recomputed by this
/// model on every write. `status` is only ever written through the guarded
/// methods below, which the approval activities drive.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScoreRecord {
    pub id: ScoreRecordId,
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub academic_year: AcademicYear,
    pub semester: Semester,
    pub ca_score: i32,
    pub exam_score: i32,
    pub total_score: i32,
    pub letter_grade: String,
    pub status: ScoreStatus,
    pub approval_cycle: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Queries
// =============================================================================

impl ScoreRecord {
    /// Insert a new pending record with computed totals.
    pub async fn create(
        student_id: StudentId,
        course_id: CourseId,
        academic_year: &AcademicYear,
        semester: Semester,
        ca_score: i32,
        exam_score: i32,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let total = grading::total_score(ca_score, exam_score);
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO score_records
                (id, student_id, course_id, academic_year, semester,
                 ca_score, exam_score, total_score, letter_grade)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(ScoreRecordId::new())
        .bind(student_id)
        .bind(course_id)
        .bind(academic_year)
        .bind(semester)
        .bind(ca_score)
        .bind(exam_score)
        .bind(total)
        .bind(grading::letter_grade(total))
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Insert a zero-score pending record unless one already exists for the
    /// natural key. Returns `None` when the record was already present, so
    /// registration derivation stays idempotent.
    pub async fn create_if_absent(
        student_id: StudentId,
        course_id: CourseId,
        academic_year: &AcademicYear,
        semester: Semester,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO score_records
                (id, student_id, course_id, academic_year, semester)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (student_id, course_id, academic_year, semester) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(ScoreRecordId::new())
        .bind(student_id)
        .bind(course_id)
        .bind(academic_year)
        .bind(semester)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: ScoreRecordId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM score_records WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_enrollment(
        student_id: StudentId,
        course_id: CourseId,
        academic_year: &AcademicYear,
        semester: Semester,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM score_records
            WHERE student_id = $1 AND course_id = $2
              AND academic_year = $3 AND semester = $4
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .bind(academic_year)
        .bind(semester)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// All records for a term, optionally restricted to one status.
    pub async fn find_for_term(
        academic_year: &AcademicYear,
        semester: Semester,
        status: Option<ScoreStatus>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        match status {
            Some(status) => sqlx::query_as::<_, Self>(
                r#"
                SELECT * FROM score_records
                WHERE academic_year = $1 AND semester = $2 AND status = $3
                ORDER BY created_at
                "#,
            )
            .bind(academic_year)
            .bind(semester)
            .bind(status)
            .fetch_all(pool)
            .await
            .map_err(Into::into),
            None => sqlx::query_as::<_, Self>(
                r#"
                SELECT * FROM score_records
                WHERE academic_year = $1 AND semester = $2
                ORDER BY created_at
                "#,
            )
            .bind(academic_year)
            .bind(semester)
            .fetch_all(pool)
            .await
            .map_err(Into::into),
        }
    }

    /// The student-facing query. Only senate-approved records are ever
    /// returned; intermediate tiers are invisible by construction.
    pub async fn find_visible_for_student(
        student_id: StudentId,
        academic_year: &AcademicYear,
        semester: Semester,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM score_records
            WHERE student_id = $1 AND academic_year = $2 AND semester = $3
              AND status = $4
            ORDER BY created_at
            "#,
        )
        .bind(student_id)
        .bind(academic_year)
        .bind(semester)
        .bind(ScoreStatus::SenateApproved)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Guarded status advance: succeeds only if the record is still at
    /// `from`. Returns `None` when a concurrent actor moved the record
    /// first (optimistic concurrency control).
    pub async fn advance_status(
        id: ScoreRecordId,
        from: ScoreStatus,
        to: ScoreStatus,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE score_records
            SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Score correction while the record is still pending. Recomputes the
    /// derived columns; status is untouched.
    pub async fn update_scores(
        id: ScoreRecordId,
        ca_score: i32,
        exam_score: i32,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let total = grading::total_score(ca_score, exam_score);
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE score_records
            SET ca_score = $2, exam_score = $3, total_score = $4,
                letter_grade = $5, updated_at = now()
            WHERE id = $1 AND status = $6
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ca_score)
        .bind(exam_score)
        .bind(total)
        .bind(grading::letter_grade(total))
        .bind(ScoreStatus::Pending)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Resubmission: new scores on a rejected record, back to pending on the
    /// next approval cycle. Guarded on `rejected` so a concurrent edit
    /// cannot double-bump the cycle.
    pub async fn reset_for_resubmission(
        id: ScoreRecordId,
        ca_score: i32,
        exam_score: i32,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let total = grading::total_score(ca_score, exam_score);
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE score_records
            SET ca_score = $2, exam_score = $3, total_score = $4,
                letter_grade = $5, status = $6,
                approval_cycle = approval_cycle + 1, updated_at = now()
            WHERE id = $1 AND status = $7
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ca_score)
        .bind(exam_score)
        .bind(total)
        .bind(grading::letter_grade(total))
        .bind(ScoreStatus::Pending)
        .bind(ScoreStatus::Rejected)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }
}
