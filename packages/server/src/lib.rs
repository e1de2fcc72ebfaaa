// University Records Platform - API Core
//
// Backend for the hierarchical result-approval workflow: lecturers submit
// scores, department/school/senate admins sign off in order, students see
// a result only once the senate has approved it.

pub mod common;
pub mod config;
pub mod domains;
pub mod server;

pub use config::*;
