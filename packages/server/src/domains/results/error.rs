use thiserror::Error;

use crate::domains::results::machine::ScoreStatus;

/// Errors raised by the result-approval workflow.
#[derive(Error, Debug)]
pub enum ApprovalError {
    /// The record's current status does not match the status the requested
    /// decision expects. Signals a stale read or a concurrent advance; the
    /// caller should refetch.
    #[error("record is {actual} but this decision requires {expected}")]
    InvalidTransition {
        expected: ScoreStatus,
        actual: ScoreStatus,
    },

    #[error("a rejection requires a reason")]
    MissingReason,

    #[error("student {student_id} has no active enrollment in course {course_id}")]
    NotEnrolled {
        student_id: uuid::Uuid,
        course_id: uuid::Uuid,
    },

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("persistence failure: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl ApprovalError {
    /// True when the failure is a record that has already moved past the
    /// state this decision expected (the benign concurrent-batch case).
    pub fn is_already_processed(&self) -> bool {
        match self {
            ApprovalError::InvalidTransition { expected, actual } => {
                match (expected.pipeline_rank(), actual.pipeline_rank()) {
                    (Some(expected), Some(actual)) => actual > expected,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}
