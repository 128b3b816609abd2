//! Appointment handlers
//!
//! All routes here require authentication; the caller's id scopes every
//! operation.

use crate::appointments::{
    Appointment, CreateAppointmentRequest, ListAppointmentsQuery, UpdateAppointmentRequest,
};
use crate::auth::AuthenticatedUser;
use crate::error::{ApiResponse, AppError};
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

/// Book an appointment for the signed-in user
#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    tag = "appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment created", body = Appointment),
        (status = 400, description = "Invalid input or insert failed", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<CreateAppointmentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;

    let appointment = state
        .appointment_service
        .create(&user.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(appointment)))
}

/// Get one of the signed-in user's appointments
#[utoipa::path(
    get,
    path = "/api/v1/appointments/{id}",
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment found", body = Appointment),
        (status = 404, description = "Appointment not found", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = state.appointment_service.get(&id, &user.user_id).await?;
    Ok(ApiResponse::ok(appointment))
}

/// List the signed-in user's appointments
///
/// Paginated (`pageSize`, 1-indexed `pageNumber`) and sorted (`sortBy`,
/// `sortOrder`). Defaults: 10 per page, page 1, by `id` ascending.
#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    tag = "appointments",
    params(ListAppointmentsQuery),
    responses(
        (status = 200, description = "One page of appointments", body = [Appointment]),
        (status = 400, description = "Invalid paging or sort parameters", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    query: Result<Query<ListAppointmentsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;

    let appointments = state
        .appointment_service
        .list(&user.user_id, &query)
        .await?;

    Ok(ApiResponse::ok(appointments))
}

/// Update one of the signed-in user's appointments
///
/// Fields left out of the body keep their current value. Served for both
/// PUT and PATCH.
#[utoipa::path(
    put,
    path = "/api/v1/appointments/{id}",
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment ID")),
    request_body = UpdateAppointmentRequest,
    responses(
        (status = 200, description = "Confirmation message", body = String),
        (status = 400, description = "Update failed", body = crate::error::ApiError),
        (status = 404, description = "Appointment not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateAppointmentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(patch) = payload?;

    let message = state
        .appointment_service
        .update(&id, &user.user_id, patch)
        .await?;

    Ok(ApiResponse::ok(message))
}

/// Delete one of the signed-in user's appointments
#[utoipa::path(
    delete,
    path = "/api/v1/appointments/{id}",
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Confirmation message", body = String),
        (status = 404, description = "Appointment not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let message = state
        .appointment_service
        .delete(&id, &user.user_id)
        .await?;

    Ok(ApiResponse::ok(message))
}
