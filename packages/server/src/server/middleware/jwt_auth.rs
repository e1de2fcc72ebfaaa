use axum::{middleware::Next, response::Response};
use std::sync::Arc;
use tracing::debug;

use super::errors::AuthError;
use crate::common::UserId;
use crate::domains::auth::JwtService;
use crate::domains::results::machine::ApprovalTier;
use crate::domains::users::Role;

/// Authenticated user information from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
    pub role: Role,
}

impl AuthUser {
    /// The caller must be the admin for exactly this approval tier. A
    /// senate admin cannot record a department decision and vice versa.
    pub fn require_tier(&self, tier: ApprovalTier) -> Result<UserId, AuthError> {
        match self.role.approval_tier() {
            Some(own_tier) if own_tier == tier => Ok(self.user_id),
            Some(own_tier) => Err(AuthError::PermissionDenied(format!(
                "{} admin cannot decide for the {} tier",
                own_tier, tier
            ))),
            None => Err(AuthError::AdminRequired),
        }
    }

    /// The caller must hold an admin role (any tier).
    pub fn require_admin(&self) -> Result<UserId, AuthError> {
        if self.role.is_admin() {
            Ok(self.user_id)
        } else {
            Err(AuthError::AdminRequired)
        }
    }

    /// The caller must hold exactly this role.
    pub fn require_role(&self, role: Role) -> Result<UserId, AuthError> {
        if self.role == role {
            Ok(self.user_id)
        } else {
            Err(AuthError::PermissionDenied(format!(
                "{} role required",
                role
            )))
        }
    }

    /// Students may read their own results; admins may read anyone's.
    pub fn can_view_student(&self, student_id: UserId) -> Result<(), AuthError> {
        if self.role.is_admin() || (self.role == Role::Student && self.user_id == student_id) {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied(
                "results are only visible to the student or an admin".to_string(),
            ))
        }
    }
}

/// JWT authentication middleware
///
/// Extracts JWT token from Authorization header, verifies it, and adds AuthUser to request extensions.
/// If no token or invalid token, request continues without AuthUser (public access).
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_user = extract_auth_user(&request, &jwt_service);

    if let Some(user) = auth_user {
        debug!("Authenticated user: {} ({})", user.user_id, user.role);
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

/// Extract and verify JWT token from request
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<AuthUser> {
    // Get Authorization header
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    // Extract token (handle both "Bearer <token>" and raw token)
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    // Verify token
    let claims = jwt_service.verify_token(token).ok()?;

    Some(AuthUser {
        user_id: UserId::from_uuid(claims.user_id),
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_extract_token_with_bearer() {
        let jwt_service = JwtService::new("test_secret", "test_issuer".to_string());
        let user_id = Uuid::new_v4();
        let token = jwt_service
            .create_token(user_id, Role::DepartmentAdmin)
            .unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", format!("Bearer {}", token))
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service);
        assert!(auth_user.is_some());
        assert_eq!(auth_user.unwrap().user_id, UserId::from_uuid(user_id));
    }

    #[test]
    fn test_extract_token_without_bearer() {
        let jwt_service = JwtService::new("test_secret", "test_issuer".to_string());
        let user_id = Uuid::new_v4();
        let token = jwt_service.create_token(user_id, Role::Student).unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", token)
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service);
        assert!(auth_user.is_some());
        assert_eq!(auth_user.unwrap().role, Role::Student);
    }

    #[test]
    fn test_no_auth_header() {
        let jwt_service = JwtService::new("test_secret", "test_issuer".to_string());
        let request = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service);
        assert!(auth_user.is_none());
    }

    #[test]
    fn test_invalid_token() {
        let jwt_service = JwtService::new("test_secret", "test_issuer".to_string());
        let request = axum::http::Request::builder()
            .header("authorization", "Bearer invalid_token")
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service);
        assert!(auth_user.is_none());
    }

    #[test]
    fn tier_check_rejects_other_admins() {
        let user = AuthUser {
            user_id: UserId::new(),
            role: Role::SenateAdmin,
        };
        assert!(user.require_tier(ApprovalTier::Senate).is_ok());
        assert!(user.require_tier(ApprovalTier::Department).is_err());

        let student = AuthUser {
            user_id: UserId::new(),
            role: Role::Student,
        };
        assert!(student.require_tier(ApprovalTier::Department).is_err());
    }

    #[test]
    fn student_visibility_is_self_only() {
        let student_id = UserId::new();
        let student = AuthUser {
            user_id: student_id,
            role: Role::Student,
        };
        assert!(student.can_view_student(student_id).is_ok());
        assert!(student.can_view_student(UserId::new()).is_err());

        let admin = AuthUser {
            user_id: UserId::new(),
            role: Role::DepartmentAdmin,
        };
        assert!(admin.can_view_student(student_id).is_ok());
    }
}
