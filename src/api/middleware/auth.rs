use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use serde_json::json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::domain::account::Role;
use crate::state::AppState;

/// Authenticated caller, resolved from a Bearer access token
///
/// The token must verify and its session must still be open; logout closes
/// the session and with it every token issued for it.
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(user: AuthUser) -> Result<String, ApiError> {
///     Ok(format!("Hello {}", user.username))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub session_id: Uuid,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Callers may read their own records; admins may read anyone's
    pub fn ensure_self_or_admin(&self, account_id: Uuid) -> Result<(), ApiError> {
        if self.id == account_id || self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Access Forbidden"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("No access token found"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::bad_request("Invalid authorization format. Use: Bearer <token>"))?;

        let claims = state.jwt.verify_access(token)?;

        if !state.sessions.is_active(claims.sid, claims.sub).await? {
            return Err(ApiError::unauthorized("Session expired, please log in again"));
        }

        Ok(AuthUser {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
            session_id: claims.sid,
        })
    }
}

/// Caller with the admin role; others get 403
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::forbidden("Access Forbidden"));
        }
        Ok(AdminUser(user))
    }
}

/// Caller with the investor role, for routes that manage personal finance data
#[derive(Debug, Clone)]
pub struct InvestorUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for InvestorUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Investor {
            return Err(ApiError::unauthorized("Unauthorized role")
                .with_error(json!({ "allowedRoles": [Role::Investor] })));
        }
        Ok(InvestorUser(user))
    }
}
