//! Score arithmetic: total computation, letter grades and bound checks.
//!
//! Kept pure so the derived-field invariant (total = min(100, ca + exam),
//! grade a function of total) lives in exactly one place. The model layer
//! calls these on every insert and update; nothing else writes the derived
//! columns.

use crate::domains::results::error::ApprovalError;

/// Maximum continuous-assessment and exam scores accepted on submission.
///
/// These are configuration, not constants: departments differ in how the
/// 100 marks are split. Defaults follow the common 30/70 split.
#[derive(Debug, Clone, Copy)]
pub struct ScoreBounds {
    pub ca_max: i32,
    pub exam_max: i32,
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self {
            ca_max: 30,
            exam_max: 70,
        }
    }
}

/// Total score, capped at 100.
pub fn total_score(ca_score: i32, exam_score: i32) -> i32 {
    (ca_score + exam_score).min(100)
}

/// Letter grade for a total score.
pub fn letter_grade(total: i32) -> &'static str {
    match total {
        t if t >= 70 => "A",
        t if t >= 60 => "B",
        t if t >= 50 => "C",
        t if t >= 45 => "D",
        t if t >= 40 => "E",
        _ => "F",
    }
}

/// Validate a submitted score pair against the configured bounds.
pub fn validate_scores(
    ca_score: i32,
    exam_score: i32,
    bounds: &ScoreBounds,
) -> Result<(), ApprovalError> {
    if ca_score < 0 || ca_score > bounds.ca_max {
        return Err(ApprovalError::Validation(format!(
            "CA score {ca_score} outside 0..={}",
            bounds.ca_max
        )));
    }
    if exam_score < 0 || exam_score > bounds.exam_max {
        return Err(ApprovalError::Validation(format!(
            "exam score {exam_score} outside 0..={}",
            bounds.exam_max
        )));
    }
    Ok(())
}
