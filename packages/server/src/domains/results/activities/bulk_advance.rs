//! Bulk transition orchestrator.
//!
//! Applies one tier decision to every score record of a term. Records are
//! processed in bounded chunks with per-record transactions, so one
//! record's failure never aborts its siblings and an interrupted batch is
//! resumable: records that already moved no longer match the expected
//! status and are counted as skipped on a re-run.

use futures::future::join_all;
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::common::{AcademicYear, CourseId, Semester, StudentId, UserId};
use crate::domains::notifications::Notifier;
use crate::domains::registration::models::Course;
use crate::domains::results::activities::advance::advance_record;
use crate::domains::results::activities::notify::{self, NotificationIntent};
use crate::domains::results::error::ApprovalError;
use crate::domains::results::machine::{self, ApprovalTier, ReviewDecision};
use crate::domains::results::models::ScoreRecord;

/// Chunk size for batch processing. Bounds concurrent transactions against
/// the pool's connection limit.
const BATCH_CHUNK_SIZE: usize = 25;

/// Which records a batch decision targets.
#[derive(Debug, Clone)]
pub struct BulkAdvanceFilter {
    pub academic_year: AcademicYear,
    pub semester: Semester,
}

/// Per-record tallies for one batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BulkAdvanceOutcome {
    /// Records the decision moved forward.
    pub advanced: u32,
    /// Records already past the expected status (previous run or a
    /// concurrent actor).
    pub skipped_stale: u32,
    /// Records that failed validation or persistence.
    pub failed: u32,
}

/// Apply one tier decision across a term's score records.
///
/// Rejections are refused up front when no reason is supplied; nothing is
/// touched in that case. Notifications go out once per affected student or
/// lecturer after the batch completes, in a single best-effort push.
pub async fn advance_batch(
    filter: &BulkAdvanceFilter,
    tier: ApprovalTier,
    decision: ReviewDecision,
    comments: Option<&str>,
    decided_by: UserId,
    notifier: &dyn Notifier,
    pool: &PgPool,
) -> Result<BulkAdvanceOutcome, ApprovalError> {
    // Input boundary: a batch rejection without a reason touches no record.
    machine::validate_decision(decision, comments)?;

    let records =
        ScoreRecord::find_for_term(&filter.academic_year, filter.semester, None, pool).await?;

    let expected = tier.expected_status();
    let mut outcome = BulkAdvanceOutcome::default();
    let mut eligible = Vec::new();

    for record in records {
        if record.status == expected {
            eligible.push(record);
        } else if matches!(
            (record.status.pipeline_rank(), expected.pipeline_rank()),
            (Some(actual), Some(wanted)) if actual > wanted
        ) {
            outcome.skipped_stale += 1;
        } else {
            // Not yet at this tier's queue (or rejected): not this batch's
            // business, reported as a validation failure for the item.
            outcome.failed += 1;
        }
    }

    let mut affected: Vec<(StudentId, CourseId)> = Vec::new();

    for chunk in eligible.chunks(BATCH_CHUNK_SIZE) {
        let futures = chunk.iter().map(|record| {
            let id = record.id;
            async move { advance_record(id, tier, decision, comments, decided_by, pool).await }
        });

        for result in join_all(futures).await {
            match result {
                Ok(advanced) => {
                    outcome.advanced += 1;
                    affected.push((advanced.record.student_id, advanced.record.course_id));
                }
                Err(e) if e.is_already_processed() => outcome.skipped_stale += 1,
                Err(e) => {
                    warn!(error = %e, "record failed during batch advance");
                    outcome.failed += 1;
                }
            }
        }
    }

    info!(
        academic_year = %filter.academic_year,
        semester = %filter.semester,
        tier = %tier,
        advanced = outcome.advanced,
        skipped_stale = outcome.skipped_stale,
        failed = outcome.failed,
        "batch advance complete"
    );

    let intents = batch_intents(filter, tier, decision, comments, &affected, pool).await;
    notify::dispatch(intents, notifier, pool).await;

    Ok(outcome)
}

/// One intent per affected party: students learn their results are out when
/// the senate publishes, lecturers learn their course was queried on
/// rejection. Intermediate approvals stay silent.
async fn batch_intents(
    filter: &BulkAdvanceFilter,
    tier: ApprovalTier,
    decision: ReviewDecision,
    comments: Option<&str>,
    affected: &[(StudentId, CourseId)],
    pool: &PgPool,
) -> Vec<NotificationIntent> {
    if affected.is_empty() {
        return Vec::new();
    }

    match decision {
        ReviewDecision::Approve if tier == ApprovalTier::Senate => {
            let students: HashSet<StudentId> = affected.iter().map(|(s, _)| *s).collect();
            students
                .into_iter()
                .map(|student_id| NotificationIntent {
                    user_id: student_id,
                    title: "Results published".to_string(),
                    body: format!(
                        "Your results for {} ({} semester) are now available.",
                        filter.academic_year, filter.semester
                    ),
                })
                .collect()
        }
        ReviewDecision::Reject => {
            let course_ids: Vec<CourseId> = affected
                .iter()
                .map(|(_, c)| *c)
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            let lecturers = match Course::find_lecturers_for(&course_ids, pool).await {
                Ok(lecturers) => lecturers,
                Err(e) => {
                    warn!(error = %e, "lecturer lookup failed, skipping batch notifications");
                    return Vec::new();
                }
            };
            lecturers
                .into_iter()
                .map(|(_, lecturer_id)| NotificationIntent {
                    user_id: lecturer_id,
                    title: "Results queried".to_string(),
                    body: format!(
                        "Results for {} ({} semester) were queried: {}",
                        filter.academic_year,
                        filter.semester,
                        comments.unwrap_or("no reason given")
                    ),
                })
                .collect()
        }
        ReviewDecision::Approve => Vec::new(),
    }
}
