use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{AcademicYear, Semester, SessionId, UserId};

/// An academic session (year + semester). Exactly one session is active at
/// a time; batch operations that omit a term default to it.
///
/// The active session is data with an admin-driven lifecycle, never a
/// constant baked into the code.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AcademicSession {
    pub id: SessionId,
    pub academic_year: AcademicYear,
    pub semester: Semester,
    pub is_active: bool,
    pub activated_by: Option<UserId>,
    pub activated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Queries
// =============================================================================

impl AcademicSession {
    /// Make (year, semester) the active session, creating the row if it
    /// does not exist. Deactivates any other active session in the same
    /// transaction so the single-active invariant holds throughout.
    pub async fn activate(
        academic_year: &AcademicYear,
        semester: Semester,
        activated_by: UserId,
        pool: &PgPool,
    ) -> Result<Self> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE academic_sessions SET is_active = false WHERE is_active")
            .execute(&mut *tx)
            .await?;

        let session = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO academic_sessions
                (id, academic_year, semester, is_active, activated_by, activated_at)
            VALUES ($1, $2, $3, true, $4, now())
            ON CONFLICT (academic_year, semester) DO UPDATE
            SET is_active = true, activated_by = $4, activated_at = now()
            RETURNING *
            "#,
        )
        .bind(SessionId::new())
        .bind(academic_year)
        .bind(semester)
        .bind(activated_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(session)
    }

    /// The currently active session, if an admin has set one.
    pub async fn current(pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM academic_sessions WHERE is_active")
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }
}
