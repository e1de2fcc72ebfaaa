pub mod approval_entry;
pub mod score_record;

pub use approval_entry::{ApprovalLedgerEntry, EntryStatus};
pub use score_record::ScoreRecord;
