//! Registration and enrollment: the ledger that gates which score records
//! may exist.

pub mod activities;
pub mod models;

pub use models::{Course, CourseRegistration, CourseType, Enrollment, RegistrationStatus};
