//! The approval state machine.
//!
//! Single authority for status changes on a score record. A record walks a
//! fixed pipeline:
//!
//! ```text
//! pending → department_approved → faculty_approved → senate_approved
//! ```
//!
//! Each tier may only decide records awaiting its decision, so `rejected`
//! branches off `pending`, `department_approved` and `faculty_approved`.
//! From `rejected`, a lecturer score edit re-enters the pipeline at
//! `pending` (see the resubmission activity). `senate_approved` is terminal:
//! it is the only status visible to students, and nothing moves past it.
//!
//! `transition` is a pure function; callers pair it with a guarded UPDATE on
//! the expected status so that concurrent decisions on the same record
//! linearize instead of clobbering each other.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domains::results::error::ApprovalError;

/// Aggregate approval status of a score record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "score_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    #[default]
    Pending,
    DepartmentApproved,
    FacultyApproved,
    SenateApproved,
    Rejected,
}

impl ScoreStatus {
    /// Position on the approval pipeline, `None` for `Rejected`.
    ///
    /// A higher rank means the record has moved further toward publication;
    /// batch callers use this to tell "already processed" apart from
    /// "not yet eligible".
    pub fn pipeline_rank(self) -> Option<u8> {
        match self {
            ScoreStatus::Pending => Some(0),
            ScoreStatus::DepartmentApproved => Some(1),
            ScoreStatus::FacultyApproved => Some(2),
            ScoreStatus::SenateApproved => Some(3),
            ScoreStatus::Rejected => None,
        }
    }

    /// Whether students may see a record in this status.
    pub fn is_visible(self) -> bool {
        self == ScoreStatus::SenateApproved
    }
}

impl fmt::Display for ScoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScoreStatus::Pending => "pending",
            ScoreStatus::DepartmentApproved => "department_approved",
            ScoreStatus::FacultyApproved => "faculty_approved",
            ScoreStatus::SenateApproved => "senate_approved",
            ScoreStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// The three sequential approval authorities, in pipeline order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "approval_tier", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalTier {
    Department,
    School,
    Senate,
}

impl ApprovalTier {
    /// The record status a tier's decision expects to find.
    pub fn expected_status(self) -> ScoreStatus {
        match self {
            ApprovalTier::Department => ScoreStatus::Pending,
            ApprovalTier::School => ScoreStatus::DepartmentApproved,
            ApprovalTier::Senate => ScoreStatus::FacultyApproved,
        }
    }

    /// The record status a tier's approval produces.
    pub fn approved_status(self) -> ScoreStatus {
        match self {
            ApprovalTier::Department => ScoreStatus::DepartmentApproved,
            ApprovalTier::School => ScoreStatus::FacultyApproved,
            ApprovalTier::Senate => ScoreStatus::SenateApproved,
        }
    }
}

impl fmt::Display for ApprovalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApprovalTier::Department => "department",
            ApprovalTier::School => "school",
            ApprovalTier::Senate => "senate",
        };
        f.write_str(s)
    }
}

/// An administrator's decision on a record at one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// Validate decision inputs that do not depend on record state.
///
/// Rejections must carry a non-blank reason; batch callers run this once at
/// the input boundary before touching any record.
pub fn validate_decision(
    decision: ReviewDecision,
    comments: Option<&str>,
) -> Result<(), ApprovalError> {
    if decision == ReviewDecision::Reject
        && comments.map_or(true, |c| c.trim().is_empty())
    {
        return Err(ApprovalError::MissingReason);
    }
    Ok(())
}

/// Compute the status a decision moves a record to.
///
/// Fails `InvalidTransition` unless the record is exactly at the status the
/// tier's decision expects: no skipping, no reordering, no re-deciding a
/// record another actor already moved.
pub fn transition(
    current: ScoreStatus,
    tier: ApprovalTier,
    decision: ReviewDecision,
    comments: Option<&str>,
) -> Result<ScoreStatus, ApprovalError> {
    validate_decision(decision, comments)?;

    let expected = tier.expected_status();
    if current != expected {
        return Err(ApprovalError::InvalidTransition {
            expected,
            actual: current,
        });
    }

    Ok(match decision {
        ReviewDecision::Approve => tier.approved_status(),
        ReviewDecision::Reject => ScoreStatus::Rejected,
    })
}
