pub mod auth;
pub mod notifications;
pub mod registration;
pub mod results;
pub mod sessions;
pub mod users;
