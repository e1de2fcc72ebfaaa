//! Single-record approval advance.
//!
//! The only write path for a score record's status. Re-reads the record,
//! runs the pure transition, then pairs the guarded status update with the
//! tier's ledger decision in one transaction: both rows move or neither
//! does.

use sqlx::PgPool;
use tracing::info;

use crate::common::{ScoreRecordId, UserId};
use crate::domains::notifications::Notifier;
use crate::domains::registration::models::Course;
use crate::domains::results::activities::notify::{self, NotificationIntent};
use crate::domains::results::error::ApprovalError;
use crate::domains::results::machine::{self, ApprovalTier, ReviewDecision};
use crate::domains::results::models::{ApprovalLedgerEntry, EntryStatus, ScoreRecord};

/// Result of one advance: the moved record and the ledger row that audited
/// the decision.
#[derive(Debug)]
pub struct AdvanceOutcome {
    pub record: ScoreRecord,
    pub entry: ApprovalLedgerEntry,
}

/// Apply one tier's decision to one score record.
///
/// The record's current status must be exactly the status the tier expects;
/// anything else fails `InvalidTransition` and the caller should refetch.
/// A concurrent advance between our read and our write loses the race on
/// the guarded UPDATE and is reported the same way.
pub async fn advance_record(
    record_id: ScoreRecordId,
    tier: ApprovalTier,
    decision: ReviewDecision,
    comments: Option<&str>,
    decided_by: UserId,
    pool: &PgPool,
) -> Result<AdvanceOutcome, ApprovalError> {
    let record = ScoreRecord::find_by_id(record_id, pool)
        .await?
        .ok_or_else(|| ApprovalError::NotFound(format!("score record {record_id}")))?;

    let target = machine::transition(record.status, tier, decision, comments)?;
    let entry_status = match decision {
        ReviewDecision::Approve => EntryStatus::Approved,
        ReviewDecision::Reject => EntryStatus::Rejected,
    };

    let mut tx = pool.begin().await.map_err(anyhow::Error::from)?;

    let Some(updated) =
        ScoreRecord::advance_status(record_id, record.status, target, &mut *tx).await?
    else {
        // Lost the race: someone else moved the record since our read.
        drop(tx);
        let actual = ScoreRecord::find_by_id(record_id, pool)
            .await?
            .map(|r| r.status)
            .unwrap_or(record.status);
        return Err(ApprovalError::InvalidTransition {
            expected: tier.expected_status(),
            actual,
        });
    };

    let entry = ApprovalLedgerEntry::record_decision(
        record_id,
        updated.approval_cycle,
        tier,
        entry_status,
        decided_by,
        comments,
        &mut *tx,
    )
    .await?;

    tx.commit().await.map_err(anyhow::Error::from)?;

    info!(
        record_id = %record_id,
        tier = %tier,
        status = %updated.status,
        decided_by = %decided_by,
        "score record advanced"
    );

    Ok(AdvanceOutcome {
        record: updated,
        entry,
    })
}

/// Notify the parties a transition concerns: the student once their result
/// is published (senate approval), the course lecturer when a result is
/// queried (rejection). Intermediate approvals are internal and silent.
///
/// Best-effort: failures are logged by the dispatcher, never returned.
pub async fn notify_transition(
    outcome: &AdvanceOutcome,
    tier: ApprovalTier,
    decision: ReviewDecision,
    notifier: &dyn Notifier,
    pool: &PgPool,
) {
    let record = &outcome.record;
    let course = match Course::find_by_id(record.course_id, pool).await {
        Ok(course) => course,
        Err(e) => {
            tracing::warn!(error = %e, "course lookup failed, skipping transition notification");
            return;
        }
    };
    let course_code = course
        .as_ref()
        .map(|c| c.code.clone())
        .unwrap_or_else(|| "course".to_string());

    let intent = match decision {
        ReviewDecision::Approve if tier == ApprovalTier::Senate => Some(NotificationIntent {
            user_id: record.student_id,
            title: "Result published".to_string(),
            body: format!(
                "Your {} result for {} ({} semester) is now available.",
                course_code, record.academic_year, record.semester
            ),
        }),
        ReviewDecision::Reject => course.and_then(|c| c.lecturer_id).map(|lecturer_id| {
            NotificationIntent {
                user_id: lecturer_id,
                title: "Result queried".to_string(),
                body: format!(
                    "The {} result for {} ({} semester) was queried: {}",
                    course_code,
                    record.academic_year,
                    record.semester,
                    outcome.entry.comments.as_deref().unwrap_or("no reason given")
                ),
            }
        }),
        _ => None,
    };

    if let Some(intent) = intent {
        notify::dispatch(vec![intent], notifier, pool).await;
    }
}
