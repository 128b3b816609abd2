//! Carebook API - REST server for user accounts and appointments
//!
//! Layered handler → service → repository, with JWT bearer authentication
//! on everything except signup, signin and token refresh.

pub mod appointments;
pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod routes;
pub mod state;

use axum::{
    error_handling::HandleErrorLayer,
    http::{HeaderValue, Uri},
    routing::get,
    BoxError, Router,
};
use carebook_core::config::ServerConfig;
use error::AppError;
use state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI document
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Carebook API",
        description = "User accounts and appointment scheduling"
    ),
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::users::signup_handler,
        handlers::users::signin_handler,
        handlers::users::refresh_handler,
        handlers::users::list_users_handler,
        handlers::users::me_handler,
        handlers::appointments::create_appointment,
        handlers::appointments::get_appointment,
        handlers::appointments::list_appointments,
        handlers::appointments::update_appointment,
        handlers::appointments::delete_appointment,
    ),
    components(schemas(
        error::ApiError,
        handlers::health::HealthResponse,
        handlers::health::ReadinessResponse,
        handlers::health::ReadinessChecks,
        auth::SignupRequest,
        auth::SigninRequest,
        auth::RefreshRequest,
        auth::UserPublic,
        auth::LoginResponse,
        appointments::Appointment,
        appointments::CreateAppointmentRequest,
        appointments::UpdateAppointmentRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "users", description = "Signup, signin and user profiles"),
        (name = "appointments", description = "Appointment scheduling"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let server = state.config.server.clone();

    let router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(route_not_found);

    with_request_timeout(router, Duration::from_secs(server.request_timeout_secs))
        .layer(cors_layer(&server))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router over fresh in-memory stores, with a cheap password hash cost
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    let mut config = carebook_core::AppConfig::default();
    config.auth.password_memory_cost = 8192;
    config.auth.password_time_cost = 1;
    config.auth.password_parallelism = 1;

    create_router(Arc::new(AppState::in_memory(config)))
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

/// Fail requests that outlive `timeout` with a 408 envelope
fn with_request_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .timeout(timeout),
    )
}

async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::RequestTimeout("Request timed out".to_string())
    } else {
        AppError::Internal(format!("Unhandled middleware error: {err}"))
    }
}

/// Allow the configured origins, or any origin when none are configured
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if server.cors_origins.is_empty() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(origins)
}
