/// Authentication middleware for protecting routes
///
/// Extracts and validates the bearer access token from the Authorization
/// header. On success the decoded identity is added to request extensions and
/// the downstream handler runs exactly once; on any failure the request is
/// answered with 401 and never reaches the handler.
use super::jwt::{validate_access_token, Claims, JwtError};
use crate::audit::{audit_log, AuditEvent, RequestContext};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Authenticated user information extracted from the access token
///
/// Handlers take it with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// User's unique identifier
    pub user_id: String,
    /// User's email address
    pub email: String,
    /// User's display name
    pub name: String,
    /// JWT token ID
    pub jti: String,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            jti: claims.jti,
        }
    }
}

/// Authentication middleware errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Header absent, not UTF-8, or not a `Bearer ` credential
    #[error("Unauthorized User")]
    MissingAuthHeader,

    #[error("{0}")]
    InvalidToken(#[from] JwtError),
}

impl AuthError {
    /// Message shown to the client
    pub fn message(&self) -> String {
        match self {
            AuthError::InvalidToken(JwtError::ExpiredToken) => "Access Token expired.".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(ApiError::new(self.message()))).into_response()
    }
}

/// Authentication middleware that requires a valid access token
///
/// # Usage
///
/// ```ignore
/// use axum::{middleware, routing::get, Router};
/// use carebook_api::auth::middleware::auth_middleware;
///
/// let app = Router::new()
///     .route("/appointments", get(list_appointments))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
///
/// In handlers, extract the user:
///
/// ```
/// use axum::Extension;
/// use carebook_api::auth::middleware::AuthenticatedUser;
///
/// async fn protected_handler(
///     Extension(user): Extension<AuthenticatedUser>
/// ) -> String {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let user = match authenticate(&state, &request) {
        Ok(user) => user,
        Err(err) => {
            let ctx = RequestContext::from_headers(request.headers());
            audit_log(&AuditEvent::InvalidToken {
                reason: err.to_string(),
                ip_address: ctx.ip_address,
                user_agent: ctx.user_agent,
            });
            return Err(err);
        }
    };

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

fn authenticate(state: &AppState, request: &Request<Body>) -> Result<AuthenticatedUser, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::MissingAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingAuthHeader)?;

    let claims = validate_access_token(&state.jwt_config, token)?;

    Ok(AuthenticatedUser::from(claims))
}
