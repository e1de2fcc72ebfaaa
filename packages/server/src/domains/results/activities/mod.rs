pub mod advance;
pub mod bulk_advance;
pub mod notify;
pub mod resubmission;

pub use advance::{advance_record, notify_transition, AdvanceOutcome};
pub use bulk_advance::{advance_batch, BulkAdvanceFilter, BulkAdvanceOutcome};
pub use resubmission::{submit_score, ScoreSubmission};
