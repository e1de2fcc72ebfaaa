//! Typed ID definitions for all domain entities.
//!
//! This module defines type aliases for each domain entity, providing
//! compile-time type safety for ID usage throughout the application.
//!
//! # Example
//!
//! ```rust
//! use server_core::common::{CourseId, ScoreRecordId, StudentId};
//!
//! // These are incompatible types - compiler prevents mixing them up
//! let student_id: StudentId = StudentId::new();
//! let course_id: CourseId = CourseId::new();
//!
//! // This would be a compile error:
//! // let wrong: ScoreRecordId = student_id;
//! ```

// Re-export the core Id type and version markers
pub use super::id::{Id, V4, V7};

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for User entities (students, lecturers, admins).
pub struct User;

/// Marker type for Course entities.
pub struct Course;

/// Marker type for ScoreRecord entities.
pub struct ScoreRecord;

/// Marker type for ApprovalLedgerEntry entities.
pub struct ApprovalEntry;

/// Marker type for CourseRegistration entities.
pub struct CourseRegistration;

/// Marker type for Enrollment entities.
pub struct Enrollment;

/// Marker type for AcademicSession entities.
pub struct AcademicSession;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for User entities.
pub type UserId = Id<User>;

/// Typed ID for students. Students are users; the alias keeps signatures
/// honest about which side of a relation they name.
pub type StudentId = Id<User>;

/// Typed ID for Course entities.
pub type CourseId = Id<Course>;

/// Typed ID for ScoreRecord entities.
pub type ScoreRecordId = Id<ScoreRecord>;

/// Typed ID for ApprovalLedgerEntry entities.
pub type ApprovalEntryId = Id<ApprovalEntry>;

/// Typed ID for CourseRegistration entities.
pub type RegistrationId = Id<CourseRegistration>;

/// Typed ID for Enrollment entities.
pub type EnrollmentId = Id<Enrollment>;

/// Typed ID for AcademicSession entities.
pub type SessionId = Id<AcademicSession>;
