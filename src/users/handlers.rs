use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, put},
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        AdminChangePasswordRequest, ChangePasswordRequest, IsActiveResponse, IsAdminResponse,
        MessageResponse, ProfileResponse, ToggleStatusResponse, UserListParams, UserListResponse,
    },
    services,
};
use crate::{
    auth::{
        extractors::{AdminUser, CurrentUser},
        services::{change_password, check_if_admin},
    },
    error::{parse_payload, ApiError},
    pagination::PageRequest,
    state::AppState,
    validate::{ADMIN_CHANGE_PASSWORD_RULES, CHANGE_PASSWORD_RULES},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/get_myself/", get(get_myself))
        .route("/user/check_admin/", get(check_admin))
        .route("/user/check_active/", get(check_active))
        .route("/user/change-password", put(change_own_password))
        .route("/user", get(list_users))
        .route("/user/", get(list_users))
        .route("/user/:id", get(get_user))
        .route("/user/:id/status/", put(toggle_status))
        .route("/user/change-password/:id", put(admin_change_password))
}

fn user_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id).map_err(|e| {
        warn!(error = %e, "malformed user id");
        ApiError::not_found("User not found")
    })
}

pub async fn get_myself(CurrentUser(user): CurrentUser) -> Json<ProfileResponse> {
    Json(user.into())
}

pub async fn check_admin(CurrentUser(user): CurrentUser) -> Json<IsAdminResponse> {
    Json(IsAdminResponse {
        is_admin: check_if_admin(&user),
    })
}

pub async fn check_active(CurrentUser(user): CurrentUser) -> Json<IsActiveResponse> {
    Json(IsActiveResponse {
        is_active: user.is_active,
    })
}

#[instrument(skip_all)]
pub async fn change_own_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let payload: ChangePasswordRequest = parse_payload(body, CHANGE_PASSWORD_RULES)?;
    services::update_user_password(
        state.users.as_ref(),
        &user,
        &payload.old_password,
        &payload.new_password,
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "Password changed successfully.",
    }))
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    params: Result<Query<UserListParams>, QueryRejection>,
) -> Result<Json<UserListResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let req = PageRequest::try_from(params).map_err(ApiError::bad_request)?;
    let page = services::list_users(state.users.as_ref(), &req).await?;
    info!(
        admin_id = %admin.id,
        total_entries = page.total_entries,
        "users listed"
    );
    Ok(Json(page.into()))
}

#[instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = services::get_user(state.users.as_ref(), user_id(id)?).await?;
    Ok(Json(user.into()))
}

#[instrument(skip_all)]
pub async fn toggle_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ToggleStatusResponse>, ApiError> {
    let user = services::get_user(state.users.as_ref(), user_id(id)?).await?;
    let (is_active, message) = services::toggle_active_status(state.users.as_ref(), &user).await?;
    info!(admin_id = %admin.id, user_id = %user.id, is_active, "status changed by admin");
    Ok(Json(ToggleStatusResponse { message, is_active }))
}

#[instrument(skip_all)]
pub async fn admin_change_password(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = services::get_user(state.users.as_ref(), user_id(id)?).await?;
    let payload: AdminChangePasswordRequest = parse_payload(body, ADMIN_CHANGE_PASSWORD_RULES)?;
    change_password(state.users.as_ref(), &user, &payload.new_password).await?;
    info!(admin_id = %admin.id, user_id = %user.id, "password reset by admin");
    Ok(Json(MessageResponse {
        message: "Password changed successfully.",
    }))
}
