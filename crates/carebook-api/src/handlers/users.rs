//! User account and session handlers
//!
//! Signup, signin and refresh are public; listing users and `/users/me`
//! sit behind the auth middleware.

use crate::audit::RequestContext;
use crate::auth::{
    AuthenticatedUser, LoginResponse, RefreshRequest, SigninRequest, SignupRequest, UserPublic,
};
use crate::error::{ApiResponse, AppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

/// Register a new user account
///
/// # Responses
///
/// * `201 Created` - `{ success: true, data: <user> }`, never including the password
/// * `400 Bad Request` - Invalid input, or email already registered
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = UserPublic),
        (status = 400, description = "Invalid input or duplicate email", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let ctx = RequestContext::from_headers(&headers);

    let user = state.auth_service.signup(request, &ctx).await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(user)))
}

/// Sign in with email and password
///
/// Returns the user id and display name with a fresh access/refresh token pair.
#[utoipa::path(
    post,
    path = "/api/v1/users/session",
    tag = "users",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Unknown email or wrong password", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn signin_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let ctx = RequestContext::from_headers(&headers);

    let response = state.auth_service.signin(request, &ctx).await?;

    Ok(ApiResponse::ok(response))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/api/v1/users/session/refresh",
    tag = "users",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New tokens issued", body = LoginResponse),
        (status = 401, description = "Invalid or expired refresh token", body = crate::error::ApiError),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let ctx = RequestContext::from_headers(&headers);

    let response = state.auth_service.refresh(request, &ctx).await?;

    Ok(ApiResponse::ok(response))
}

/// List all users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = [UserPublic]),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.auth_service.list_users().await?;
    Ok(ApiResponse::ok(users))
}

/// Get the signed-in user's profile
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = UserPublic),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 404, description = "User no longer exists", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.auth_service.get_user(&user.user_id).await?;
    Ok(ApiResponse::ok(profile))
}
