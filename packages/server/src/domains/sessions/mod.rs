pub mod models;

pub use models::AcademicSession;
