//! Integration tests for the hierarchical result-approval workflow.
//!
//! Covers the full pipeline (pending → department → school → senate), the
//! no-skipping rule, optimistic concurrency on stale decisions, the
//! rejection/resubmission cycle and the student visibility boundary.

mod common;

use crate::common::{
    create_admin, create_course, create_lecturer, create_student, enroll, unique_level,
    unique_year, TestHarness,
};
use sqlx::PgPool;
use test_context::test_context;

use server_core::common::{AcademicYear, ScoreRecordId, Semester, StudentId, UserId};
use server_core::domains::notifications::RecordingNotifier;
use server_core::domains::registration::models::CourseType;
use server_core::domains::results::activities::{
    advance_record, notify_transition, submit_score, ScoreSubmission,
};
use server_core::domains::results::machine::{ApprovalTier, ReviewDecision, ScoreStatus};
use server_core::domains::results::models::{ApprovalLedgerEntry, EntryStatus, ScoreRecord};
use server_core::domains::results::{ApprovalError, ScoreBounds};
use server_core::domains::users::Role;

// =============================================================================
// Helpers
// =============================================================================

struct Workbench {
    student_id: StudentId,
    lecturer_id: UserId,
    course_id: server_core::common::CourseId,
    academic_year: AcademicYear,
    semester: Semester,
}

/// Student + lecturer + course + active enrollment, ready for a submission.
async fn setup_enrollment(pool: &PgPool) -> Workbench {
    let student = create_student(pool).await.expect("create student");
    let lecturer = create_lecturer(pool).await.expect("create lecturer");
    let course = create_course(
        unique_level(),
        Semester::First,
        CourseType::Core,
        Some(lecturer.id),
        pool,
    )
    .await
    .expect("create course");
    let academic_year = unique_year();

    enroll(student.id, course.id, &academic_year, Semester::First, pool)
        .await
        .expect("enroll student");

    Workbench {
        student_id: student.id,
        lecturer_id: lecturer.id,
        course_id: course.id,
        academic_year,
        semester: Semester::First,
    }
}

async fn submit(bench: &Workbench, ca: i32, exam: i32, pool: &PgPool) -> ScoreRecord {
    submit_score(
        &ScoreSubmission {
            student_id: bench.student_id,
            course_id: bench.course_id,
            academic_year: bench.academic_year.clone(),
            semester: bench.semester,
            ca_score: ca,
            exam_score: exam,
        },
        &ScoreBounds::default(),
        pool,
    )
    .await
    .expect("submit score")
}

fn admin_role(tier: ApprovalTier) -> Role {
    match tier {
        ApprovalTier::Department => Role::DepartmentAdmin,
        ApprovalTier::School => Role::SchoolAdmin,
        ApprovalTier::Senate => Role::SenateAdmin,
    }
}

async fn decide(
    record_id: ScoreRecordId,
    tier: ApprovalTier,
    decision: ReviewDecision,
    comments: Option<&str>,
    pool: &PgPool,
) -> Result<server_core::domains::results::activities::AdvanceOutcome, ApprovalError> {
    let admin = create_admin(admin_role(tier), pool).await.expect("create admin");
    advance_record(record_id, tier, decision, comments, admin.id, pool).await
}

async fn visible(bench: &Workbench, pool: &PgPool) -> Vec<ScoreRecord> {
    ScoreRecord::find_visible_for_student(
        bench.student_id,
        &bench.academic_year,
        bench.semester,
        pool,
    )
    .await
    .expect("visibility query")
}

// =============================================================================
// Full pipeline
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn full_pipeline_publishes_result(ctx: &TestHarness) {
    let bench = setup_enrollment(&ctx.db_pool).await;

    // ca=25, exam=50 → total=75 → "A"
    let record = submit(&bench, 25, 50, &ctx.db_pool).await;
    assert_eq!(record.status, ScoreStatus::Pending);
    assert_eq!(record.total_score, 75);
    assert_eq!(record.letter_grade, "A");
    assert_eq!(record.approval_cycle, 1);

    // Invisible until the senate signs off
    assert!(visible(&bench, &ctx.db_pool).await.is_empty());

    let outcome = decide(
        record.id,
        ApprovalTier::Department,
        ReviewDecision::Approve,
        None,
        &ctx.db_pool,
    )
    .await
    .expect("department approval");
    assert_eq!(outcome.record.status, ScoreStatus::DepartmentApproved);
    assert_eq!(outcome.entry.status, EntryStatus::Approved);
    assert!(outcome.entry.decided_at.is_some());
    assert!(visible(&bench, &ctx.db_pool).await.is_empty());

    let outcome = decide(
        record.id,
        ApprovalTier::School,
        ReviewDecision::Approve,
        None,
        &ctx.db_pool,
    )
    .await
    .expect("school approval");
    assert_eq!(outcome.record.status, ScoreStatus::FacultyApproved);
    assert!(visible(&bench, &ctx.db_pool).await.is_empty());

    let outcome = decide(
        record.id,
        ApprovalTier::Senate,
        ReviewDecision::Approve,
        None,
        &ctx.db_pool,
    )
    .await
    .expect("senate approval");
    assert_eq!(outcome.record.status, ScoreStatus::SenateApproved);

    // Now, and only now, the student sees it
    let results = visible(&bench, &ctx.db_pool).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, record.id);
    assert_eq!(results[0].letter_grade, "A");
    assert!(results[0].status.is_visible());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn submission_creates_full_ledger_cycle(ctx: &TestHarness) {
    let bench = setup_enrollment(&ctx.db_pool).await;
    let record = submit(&bench, 20, 40, &ctx.db_pool).await;

    let entries = ApprovalLedgerEntry::find_for_record(record.id, &ctx.db_pool)
        .await
        .expect("ledger query");
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.status == EntryStatus::Pending));
    assert!(entries.iter().all(|e| e.cycle == 1));
    let tiers: Vec<ApprovalTier> = entries.iter().map(|e| e.tier).collect();
    assert_eq!(
        tiers,
        vec![
            ApprovalTier::Department,
            ApprovalTier::School,
            ApprovalTier::Senate
        ]
    );
}

// =============================================================================
// Ordering rules
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn tiers_cannot_be_skipped(ctx: &TestHarness) {
    let bench = setup_enrollment(&ctx.db_pool).await;
    let record = submit(&bench, 20, 40, &ctx.db_pool).await;

    // School on a pending record: no.
    let err = decide(
        record.id,
        ApprovalTier::School,
        ReviewDecision::Approve,
        None,
        &ctx.db_pool,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApprovalError::InvalidTransition { .. }));

    // Senate on a pending record: also no, even though senate outranks both.
    let err = decide(
        record.id,
        ApprovalTier::Senate,
        ReviewDecision::Approve,
        None,
        &ctx.db_pool,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApprovalError::InvalidTransition { .. }));

    // Status untouched by the failed attempts.
    let record = ScoreRecord::find_by_id(record.id, &ctx.db_pool)
        .await
        .expect("refetch")
        .expect("record exists");
    assert_eq!(record.status, ScoreStatus::Pending);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn duplicate_decision_reports_already_processed(ctx: &TestHarness) {
    let bench = setup_enrollment(&ctx.db_pool).await;
    let record = submit(&bench, 20, 40, &ctx.db_pool).await;

    decide(
        record.id,
        ApprovalTier::Department,
        ReviewDecision::Approve,
        None,
        &ctx.db_pool,
    )
    .await
    .expect("first approval");

    // A second department approval observes a stale state.
    let err = decide(
        record.id,
        ApprovalTier::Department,
        ReviewDecision::Approve,
        None,
        &ctx.db_pool,
    )
    .await
    .unwrap_err();
    assert!(err.is_already_processed());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn rejection_requires_a_reason(ctx: &TestHarness) {
    let bench = setup_enrollment(&ctx.db_pool).await;
    let record = submit(&bench, 20, 40, &ctx.db_pool).await;

    let err = decide(
        record.id,
        ApprovalTier::Department,
        ReviewDecision::Reject,
        None,
        &ctx.db_pool,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApprovalError::MissingReason));

    let err = decide(
        record.id,
        ApprovalTier::Department,
        ReviewDecision::Reject,
        Some(""),
        &ctx.db_pool,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApprovalError::MissingReason));
}

// =============================================================================
// Rejection and resubmission
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn rejection_resubmission_repeats_the_pipeline(ctx: &TestHarness) {
    let bench = setup_enrollment(&ctx.db_pool).await;
    let record = submit(&bench, 25, 50, &ctx.db_pool).await;

    decide(
        record.id,
        ApprovalTier::Department,
        ReviewDecision::Approve,
        None,
        &ctx.db_pool,
    )
    .await
    .expect("department");
    decide(
        record.id,
        ApprovalTier::School,
        ReviewDecision::Approve,
        None,
        &ctx.db_pool,
    )
    .await
    .expect("school");

    // Senate queries the result.
    let outcome = decide(
        record.id,
        ApprovalTier::Senate,
        ReviewDecision::Reject,
        Some("total recompute needed"),
        &ctx.db_pool,
    )
    .await
    .expect("senate rejection");
    assert_eq!(outcome.record.status, ScoreStatus::Rejected);
    assert_eq!(outcome.entry.status, EntryStatus::Rejected);
    assert_eq!(
        outcome.entry.comments.as_deref(),
        Some("total recompute needed")
    );
    assert!(visible(&bench, &ctx.db_pool).await.is_empty());

    // Lecturer corrects the exam score: back to pending on cycle 2.
    let resubmitted = submit(&bench, 25, 60, &ctx.db_pool).await;
    assert_eq!(resubmitted.status, ScoreStatus::Pending);
    assert_eq!(resubmitted.total_score, 85);
    assert_eq!(resubmitted.letter_grade, "A");
    assert_eq!(resubmitted.approval_cycle, 2);

    // Cycle 1 audit rows survive, cycle 2 opens pending.
    let entries = ApprovalLedgerEntry::find_for_record(record.id, &ctx.db_pool)
        .await
        .expect("ledger query");
    assert_eq!(entries.len(), 6);
    let cycle1_senate = entries
        .iter()
        .find(|e| e.cycle == 1 && e.tier == ApprovalTier::Senate)
        .expect("cycle 1 senate entry");
    assert_eq!(cycle1_senate.status, EntryStatus::Rejected);

    let cycle2 = ApprovalLedgerEntry::find_for_cycle(record.id, 2, &ctx.db_pool)
        .await
        .expect("cycle 2 query");
    assert_eq!(cycle2.len(), 3);
    assert!(cycle2.iter().all(|e| e.status == EntryStatus::Pending));

    // The full three tiers must repeat before visibility.
    for tier in [
        ApprovalTier::Department,
        ApprovalTier::School,
        ApprovalTier::Senate,
    ] {
        decide(record.id, tier, ReviewDecision::Approve, None, &ctx.db_pool)
            .await
            .expect("re-approval");
    }
    let results = visible(&bench, &ctx.db_pool).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].total_score, 85);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn edit_refused_while_record_is_in_the_pipeline(ctx: &TestHarness) {
    let bench = setup_enrollment(&ctx.db_pool).await;
    let record = submit(&bench, 25, 50, &ctx.db_pool).await;

    decide(
        record.id,
        ApprovalTier::Department,
        ReviewDecision::Approve,
        None,
        &ctx.db_pool,
    )
    .await
    .expect("department");

    // The record is mid-pipeline; a silent overwrite would bypass approval.
    let err = submit_score(
        &ScoreSubmission {
            student_id: bench.student_id,
            course_id: bench.course_id,
            academic_year: bench.academic_year.clone(),
            semester: bench.semester,
            ca_score: 30,
            exam_score: 70,
        },
        &ScoreBounds::default(),
        &ctx.db_pool,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApprovalError::InvalidTransition { .. }));

    let unchanged = ScoreRecord::find_by_id(record.id, &ctx.db_pool)
        .await
        .expect("refetch")
        .expect("record exists");
    assert_eq!(unchanged.total_score, 75);
    assert_eq!(unchanged.status, ScoreStatus::DepartmentApproved);
}

// =============================================================================
// Notifications
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn senate_approval_notifies_the_student(ctx: &TestHarness) {
    let bench = setup_enrollment(&ctx.db_pool).await;
    let record = submit(&bench, 25, 50, &ctx.db_pool).await;

    for tier in [ApprovalTier::Department, ApprovalTier::School] {
        decide(record.id, tier, ReviewDecision::Approve, None, &ctx.db_pool)
            .await
            .expect("approval");
    }

    let notifier = RecordingNotifier::new();
    let outcome = decide(
        record.id,
        ApprovalTier::Senate,
        ReviewDecision::Approve,
        None,
        &ctx.db_pool,
    )
    .await
    .expect("senate approval");
    notify_transition(
        &outcome,
        ApprovalTier::Senate,
        ReviewDecision::Approve,
        &notifier,
        &ctx.db_pool,
    )
    .await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Result published");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn rejection_notifies_the_lecturer(ctx: &TestHarness) {
    let bench = setup_enrollment(&ctx.db_pool).await;
    let record = submit(&bench, 25, 50, &ctx.db_pool).await;

    let notifier = RecordingNotifier::new();
    let outcome = decide(
        record.id,
        ApprovalTier::Department,
        ReviewDecision::Reject,
        Some("scores transposed"),
        &ctx.db_pool,
    )
    .await
    .expect("department rejection");
    notify_transition(
        &outcome,
        ApprovalTier::Department,
        ReviewDecision::Reject,
        &notifier,
        &ctx.db_pool,
    )
    .await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Result queried");
    assert!(sent[0].body.contains("scores transposed"));

    // Addressed to the lecturer's token, not the student's.
    let lecturer = server_core::domains::users::User::find_by_id(bench.lecturer_id, &ctx.db_pool)
        .await
        .expect("lecturer lookup")
        .expect("lecturer exists");
    assert_eq!(Some(sent[0].push_token.as_str()), lecturer.expo_push_token.as_deref());
}
