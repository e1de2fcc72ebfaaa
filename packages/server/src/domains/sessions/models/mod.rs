pub mod academic_session;

pub use academic_session::AcademicSession;
