//! API route definitions

use crate::auth::middleware::auth_middleware;
use crate::handlers::{appointments, users};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create API v1 routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/users", post(users::signup_handler))
        .route("/users/session", post(users::signin_handler))
        .route("/users/session/refresh", post(users::refresh_handler));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/users", get(users::list_users_handler))
        .route("/users/me", get(users::me_handler))
        .route(
            "/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/appointments/:id",
            get(appointments::get_appointment)
                .put(appointments::update_appointment)
                .patch(appointments::update_appointment)
                .delete(appointments::delete_appointment),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
