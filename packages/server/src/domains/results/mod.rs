//! Result-approval core: score records, the approval state machine, the
//! per-tier audit ledger and the activities that drive them.

pub mod activities;
pub mod error;
pub mod grading;
pub mod machine;
pub mod models;

pub use error::ApprovalError;
pub use grading::ScoreBounds;
pub use machine::{ApprovalTier, ReviewDecision, ScoreStatus};
pub use models::{ApprovalLedgerEntry, EntryStatus, ScoreRecord};
