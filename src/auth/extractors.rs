use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::{cookie::read_cookie, jwt::JwtKeys, services::check_if_admin};
use crate::{error::ApiError, state::AppState, users::UserProfile};

pub const ADMIN_ONLY: &str = "Unauthorized. Only admins can access this endpoint.";

/// Id of the caller holding a valid session token.
pub struct AuthUser(pub Uuid);

/// Profile of the authenticated caller.
pub struct CurrentUser(pub UserProfile);

/// Authenticated caller with the admin flag set.
pub struct AdminUser(pub UserProfile);

fn bearer(parts: &Parts) -> Option<&str> {
    let auth = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Cookie first, Authorization header as fallback
        let token = read_cookie(&parts.headers, &state.config.cookie.name)
            .or_else(|| bearer(parts))
            .ok_or_else(|| ApiError::unauthorized("Missing session token"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            ApiError::unauthorized("Invalid or expired token")
        })?;

        Ok(AuthUser(claims.sub))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(id) = AuthUser::from_request_parts(parts, state).await?;
        let user = state
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !check_if_admin(&user) {
            warn!(user_id = %user.id, "non-admin on admin route");
            return Err(ApiError::unauthorized(ADMIN_ONLY));
        }
        Ok(AdminUser(user))
    }
}
