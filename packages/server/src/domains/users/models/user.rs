use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;

use crate::common::UserId;
use crate::domains::results::machine::ApprovalTier;

/// Platform roles. The three admin roles map one-to-one onto approval
/// tiers; a caller may only record decisions for its own tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Lecturer,
    DepartmentAdmin,
    SchoolAdmin,
    SenateAdmin,
}

impl Role {
    /// The approval tier this role decides for, if any.
    pub fn approval_tier(self) -> Option<ApprovalTier> {
        match self {
            Role::DepartmentAdmin => Some(ApprovalTier::Department),
            Role::SchoolAdmin => Some(ApprovalTier::School),
            Role::SenateAdmin => Some(ApprovalTier::Senate),
            Role::Student | Role::Lecturer => None,
        }
    }

    pub fn is_admin(self) -> bool {
        self.approval_tier().is_some()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Student => "student",
            Role::Lecturer => "lecturer",
            Role::DepartmentAdmin => "department_admin",
            Role::SchoolAdmin => "school_admin",
            Role::SenateAdmin => "senate_admin",
        };
        f.write_str(s)
    }
}

/// A platform user: student, lecturer or approval admin.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub role: Role,
    /// Matric number for students, staff number for everyone else.
    pub identifier: String,
    pub expo_push_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Queries
// =============================================================================

impl User {
    pub async fn create(
        full_name: &str,
        role: Role,
        identifier: &str,
        expo_push_token: Option<&str>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO users (id, full_name, role, identifier, expo_push_token)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(UserId::new())
        .bind(full_name)
        .bind(role)
        .bind(identifier)
        .bind(expo_push_token)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: UserId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Push tokens for a set of users, skipping users without one.
    pub async fn find_push_tokens(ids: &[UserId], pool: &PgPool) -> Result<Vec<(UserId, String)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| (*id).into_uuid()).collect();
        let rows = sqlx::query_as::<_, (UserId, String)>(
            r#"
            SELECT id, expo_push_token FROM users
            WHERE id = ANY($1) AND expo_push_token IS NOT NULL
            "#,
        )
        .bind(&uuids)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

}
