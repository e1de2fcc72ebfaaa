use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{AcademicYear, RegistrationId, Semester, StudentId, UserId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "registration_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// A student's term-level course-selection request. One per
/// (student, year, semester); enrollments and initial score records are
/// derived from it once approved.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseRegistration {
    pub id: RegistrationId,
    pub student_id: StudentId,
    pub academic_year: AcademicYear,
    pub semester: Semester,
    pub level: i32,
    pub status: RegistrationStatus,
    pub decided_by: Option<UserId>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Queries
// =============================================================================

impl CourseRegistration {
    pub async fn create(
        student_id: StudentId,
        academic_year: &AcademicYear,
        semester: Semester,
        level: i32,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO course_registrations (id, student_id, academic_year, semester, level)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(RegistrationId::new())
        .bind(student_id)
        .bind(academic_year)
        .bind(semester)
        .bind(level)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: RegistrationId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM course_registrations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Mark the registration approved. Idempotent: an already-approved
    /// registration is returned unchanged.
    pub async fn approve(
        id: RegistrationId,
        decided_by: UserId,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE course_registrations
            SET status = $2, decided_by = $3, decided_at = now(), updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(RegistrationStatus::Approved)
        .bind(decided_by)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn reject(id: RegistrationId, decided_by: UserId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE course_registrations
            SET status = $2, decided_by = $3, decided_at = now(), updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(RegistrationStatus::Rejected)
        .bind(decided_by)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}
