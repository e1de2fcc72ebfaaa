use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{CourseId, Semester, UserId};

/// How a course is graded. Industrial-training placements (SIWES) carry no
/// CA/exam split and are excluded from score-record derivation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "course_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CourseType {
    #[default]
    Core,
    Elective,
    IndustrialTraining,
}

impl CourseType {
    pub fn is_gradable(self) -> bool {
        !matches!(self, CourseType::IndustrialTraining)
    }
}

/// A catalogue course, pinned to a level and semester.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub title: String,
    pub units: i32,
    pub level: i32,
    pub semester: Semester,
    pub course_type: CourseType,
    pub lecturer_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Queries
// =============================================================================

impl Course {
    pub async fn create(
        code: &str,
        title: &str,
        units: i32,
        level: i32,
        semester: Semester,
        course_type: CourseType,
        lecturer_id: Option<UserId>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO courses (id, code, title, units, level, semester, course_type, lecturer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(CourseId::new())
        .bind(code)
        .bind(title)
        .bind(units)
        .bind(level)
        .bind(semester)
        .bind(course_type)
        .bind(lecturer_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: CourseId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Lecturers responsible for a set of courses (courses without an
    /// assigned lecturer are skipped).
    pub async fn find_lecturers_for(
        course_ids: &[CourseId],
        pool: &PgPool,
    ) -> Result<Vec<(CourseId, UserId)>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<uuid::Uuid> = course_ids.iter().map(|id| (*id).into_uuid()).collect();
        let rows = sqlx::query_as::<_, (CourseId, UserId)>(
            "SELECT id, lecturer_id FROM courses WHERE id = ANY($1) AND lecturer_id IS NOT NULL",
        )
        .bind(&uuids)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// The curriculum for a level and semester, in catalogue order.
    /// Includes non-gradable courses; derivation filters on `course_type`.
    pub async fn find_for_level_semester(
        level: i32,
        semester: Semester,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM courses WHERE level = $1 AND semester = $2 ORDER BY code",
        )
        .bind(level)
        .bind(semester)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
