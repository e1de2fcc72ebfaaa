use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{AcademicYear, CourseId, EnrollmentId, RegistrationId, Semester, StudentId};

/// A student's active registration in one course for one term. Score
/// records may only exist for an active enrollment.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub academic_year: AcademicYear,
    pub semester: Semester,
    pub registration_id: Option<RegistrationId>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Queries
// =============================================================================

impl Enrollment {
    /// Insert unless the (student, course, term) enrollment already exists.
    /// Returns `None` when it was already present, keeping registration
    /// derivation idempotent.
    pub async fn create_if_absent(
        student_id: StudentId,
        course_id: CourseId,
        academic_year: &AcademicYear,
        semester: Semester,
        registration_id: Option<RegistrationId>,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO enrollments
                (id, student_id, course_id, academic_year, semester, registration_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (student_id, course_id, academic_year, semester) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(EnrollmentId::new())
        .bind(student_id)
        .bind(course_id)
        .bind(academic_year)
        .bind(semester)
        .bind(registration_id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// The enrollment gate: does the student hold an active enrollment in
    /// this course for this term?
    pub async fn is_active(
        student_id: StudentId,
        course_id: CourseId,
        academic_year: &AcademicYear,
        semester: Semester,
        pool: &PgPool,
    ) -> Result<bool> {
        let row: Option<(bool,)> = sqlx::query_as(
            r#"
            SELECT active FROM enrollments
            WHERE student_id = $1 AND course_id = $2
              AND academic_year = $3 AND semester = $4
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .bind(academic_year)
        .bind(semester)
        .fetch_optional(pool)
        .await?;
        Ok(row.map_or(false, |(active,)| active))
    }

    /// Withdraw the student from the course; the enrollment row stays
    /// behind, inactive.
    pub async fn deactivate(id: EnrollmentId, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE enrollments SET active = false, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn find_for_student_term(
        student_id: StudentId,
        academic_year: &AcademicYear,
        semester: Semester,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM enrollments
            WHERE student_id = $1 AND academic_year = $2 AND semester = $3
            ORDER BY created_at
            "#,
        )
        .bind(student_id)
        .bind(academic_year)
        .bind(semester)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
