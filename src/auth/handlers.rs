use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        cookie::{cleared_session_cookie, session_cookie, set_cookie_header},
        dto::{LoginRequest, MessageResponse, RegisterRequest, RegisterResponse},
        extractors::AuthUser,
        jwt::JwtKeys,
        services::{self, Registration},
    },
    error::{parse_payload, ApiError},
    state::AppState,
    validate::{LOGIN_RULES, REGISTER_RULES},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user/register/", post(register))
        .route("/user/login/", post(login))
        .route("/user/logout/", post(logout))
        .route("/user/check_auth/", get(check_auth))
}

/// Signs a session token for `user_id` and the `Set-Cookie` header that carries it.
fn issue_session(state: &AppState, user_id: Uuid) -> Result<(String, HeaderMap), ApiError> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user_id).map_err(ApiError::internal)?;
    let cookie = session_cookie(&state.config.cookie, &token, keys.ttl.as_secs());
    let headers = set_cookie_header(&cookie).map_err(ApiError::internal)?;
    Ok((token, headers))
}

#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(HeaderMap, Json<RegisterResponse>), ApiError> {
    let payload: RegisterRequest = parse_payload(body, REGISTER_RULES)?;
    let user = services::register(
        state.users.as_ref(),
        Registration {
            name: payload.name,
            surname: payload.surname,
            email: payload.email,
            password: payload.password,
        },
    )
    .await?;

    let (access_token, headers) = issue_session(&state, user.id)?;
    Ok((
        headers,
        Json(RegisterResponse {
            message: "User created successfully",
            access_token,
        }),
    ))
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(HeaderMap, Json<MessageResponse>), ApiError> {
    let payload: LoginRequest = parse_payload(body, LOGIN_RULES)?;
    let user = services::login(state.users.as_ref(), &payload.email, &payload.password).await?;

    let (_, headers) = issue_session(&state, user.id)?;
    Ok((
        headers,
        Json(MessageResponse {
            message: "Login successful",
        }),
    ))
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<(HeaderMap, Json<MessageResponse>), ApiError> {
    let headers =
        set_cookie_header(&cleared_session_cookie(&state.config.cookie)).map_err(ApiError::internal)?;
    info!(user_id = %user_id, "user logged out");
    Ok((
        headers,
        Json(MessageResponse {
            message: "User logged out successfully",
        }),
    ))
}

pub async fn check_auth(AuthUser(_): AuthUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Token is valid",
    })
}
