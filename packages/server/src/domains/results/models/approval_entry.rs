use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{ApprovalEntryId, ScoreRecordId, UserId};
use crate::domains::results::machine::ApprovalTier;

/// Per-tier decision status on a ledger entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "entry_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// One tier's audit row for one score record and approval cycle.
///
/// Every record carries a trio of entries (department, school, senate) per
/// cycle, created pending when the cycle opens. Entries are never deleted:
/// a resubmission opens the next cycle rather than rewriting history.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApprovalLedgerEntry {
    pub id: ApprovalEntryId,
    pub score_record_id: ScoreRecordId,
    pub cycle: i32,
    pub tier: ApprovalTier,
    pub status: EntryStatus,
    pub decided_by: Option<UserId>,
    pub decided_at: Option<DateTime<Utc>>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Queries
// =============================================================================

impl ApprovalLedgerEntry {
    /// Open an approval cycle: insert the three pending tier entries.
    /// Idempotent (`ON CONFLICT DO NOTHING`), so derivation re-runs and
    /// crash-retries never duplicate rows.
    pub async fn create_cycle(
        score_record_id: ScoreRecordId,
        cycle: i32,
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO approval_entries (id, score_record_id, cycle, tier)
            VALUES ($1, $4, $5, 'department'),
                   ($2, $4, $5, 'school'),
                   ($3, $4, $5, 'senate')
            ON CONFLICT (score_record_id, cycle, tier) DO NOTHING
            "#,
        )
        .bind(ApprovalEntryId::new())
        .bind(ApprovalEntryId::new())
        .bind(ApprovalEntryId::new())
        .bind(score_record_id)
        .bind(cycle)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Record one tier's decision on the current cycle's entry.
    pub async fn record_decision(
        score_record_id: ScoreRecordId,
        cycle: i32,
        tier: ApprovalTier,
        status: EntryStatus,
        decided_by: UserId,
        comments: Option<&str>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE approval_entries
            SET status = $4, decided_by = $5, decided_at = now(), comments = $6
            WHERE score_record_id = $1 AND cycle = $2 AND tier = $3
            RETURNING *
            "#,
        )
        .bind(score_record_id)
        .bind(cycle)
        .bind(tier)
        .bind(status)
        .bind(decided_by)
        .bind(comments)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Full audit trail for a record, oldest cycle first, tiers in pipeline
    /// order within a cycle.
    pub async fn find_for_record(
        score_record_id: ScoreRecordId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM approval_entries
            WHERE score_record_id = $1
            ORDER BY cycle, tier
            "#,
        )
        .bind(score_record_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Entries for one approval cycle of a record.
    pub async fn find_for_cycle(
        score_record_id: ScoreRecordId,
        cycle: i32,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM approval_entries
            WHERE score_record_id = $1 AND cycle = $2
            ORDER BY tier
            "#,
        )
        .bind(score_record_id)
        .bind(cycle)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
