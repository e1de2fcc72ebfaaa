pub mod errors;
pub mod jwt_auth;

pub use errors::AuthError;
pub use jwt_auth::{jwt_auth_middleware, AuthUser};
