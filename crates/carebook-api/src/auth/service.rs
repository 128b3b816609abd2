//! Authentication service layer
//!
//! Business rules for signup, signin and token refresh on top of a
//! [`UserRepository`]. Repository absence is turned into user-facing
//! failures here; the repository itself never decides what a client sees.

use super::jwt::{generate_token_pair, validate_refresh_token, JwtConfig, JwtError, TokenSubject};
use super::models::{LoginResponse, NewUser, User, UserPublic};
use super::password::{hash_password_blocking, verify_password_blocking, PasswordConfig};
use super::repository::UserRepository;
use crate::audit::{audit_log, AuditEvent, RequestContext};
use crate::error::AppError;
use carebook_core::AuthConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;
use validator::Validate;

/// Signup request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[serde(default)]
    pub phone_number: Option<String>,

    #[serde(default)]
    pub address: Option<String>,
}

/// Signin request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_config: JwtConfig,
    password_config: PasswordConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        jwt_config: JwtConfig,
        password_config: PasswordConfig,
    ) -> Self {
        Self {
            users,
            jwt_config,
            password_config,
        }
    }

    /// Build a service whose token and hashing settings come from `AuthConfig`
    pub fn from_config(users: Arc<dyn UserRepository>, auth: &AuthConfig) -> Self {
        Self::new(users, JwtConfig::from(auth), PasswordConfig::from(auth))
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    /// Register a new user
    ///
    /// Fails with `BadRequest` when the email is already on record (the
    /// repository's create is then never called) or when the insert yields
    /// no record.
    pub async fn signup(
        &self,
        request: SignupRequest,
        ctx: &RequestContext,
    ) -> Result<UserPublic, AppError> {
        request.validate()?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            let message = format!("User already exists with email {}", request.email);
            self.audit_signup_failure(&request.email, &message, ctx);
            return Err(AppError::BadRequest(message));
        }

        let password_hash =
            hash_password_blocking(request.password, self.password_config.clone())
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;

        let created = self
            .users
            .create(NewUser {
                email: request.email.clone(),
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
                phone_number: request.phone_number,
                address: request.address,
            })
            .await?;

        let Some(user) = created else {
            let message = "Error while creating the user.";
            self.audit_signup_failure(&request.email, message, ctx);
            return Err(AppError::BadRequest(message.to_string()));
        };

        info!(user_id = %user.id, "User registered");
        audit_log(&AuditEvent::SignupSuccess {
            user_id: user.id.clone(),
            email: user.email.clone(),
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
        });

        Ok(user.to_public())
    }

    /// Check credentials and issue an access/refresh token pair
    pub async fn signin(
        &self,
        request: SigninRequest,
        ctx: &RequestContext,
    ) -> Result<LoginResponse, AppError> {
        request.validate()?;

        let Some(user) = self.users.find_by_email(&request.email).await? else {
            self.audit_signin_failure(&request.email, "Email not registered", ctx);
            return Err(AppError::BadRequest(format!(
                "User with email: {} is not registered in our system. Please use registered email to login into the system.",
                request.email
            )));
        };

        let matches = verify_password_blocking(request.password, user.password_hash.clone())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if !matches {
            self.audit_signin_failure(&request.email, "Password mismatch", ctx);
            return Err(AppError::BadRequest(
                "Email or password did not match. Please check your credentials".to_string(),
            ));
        }

        let response = self.issue_tokens(&user)?;

        audit_log(&AuditEvent::SigninSuccess {
            user_id: user.id.clone(),
            email: user.email.clone(),
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
        });

        Ok(response)
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// Only refresh tokens are accepted, and the user they name must still exist.
    pub async fn refresh(
        &self,
        request: RefreshRequest,
        ctx: &RequestContext,
    ) -> Result<LoginResponse, AppError> {
        request.validate()?;

        let claims = validate_refresh_token(&self.jwt_config, &request.refresh_token)
            .map_err(|e| {
                audit_log(&AuditEvent::InvalidToken {
                    reason: e.to_string(),
                    ip_address: ctx.ip_address.clone(),
                    user_agent: ctx.user_agent.clone(),
                });
                match e {
                    JwtError::ExpiredToken => {
                        AppError::Unauthorized("Refresh Token expired.".to_string())
                    }
                    other => AppError::Unauthorized(other.to_string()),
                }
            })?;

        let Some(user) = self.users.find_by_id(&claims.sub).await? else {
            debug!(user_id = %claims.sub, "Refresh token names an unknown user");
            return Err(AppError::Unauthorized("Unauthorized User".to_string()));
        };

        let response = self.issue_tokens(&user)?;

        audit_log(&AuditEvent::TokenRefresh {
            user_id: user.id.clone(),
            email: user.email.clone(),
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
        });

        Ok(response)
    }

    /// All users in their public shape
    pub async fn list_users(&self) -> Result<Vec<UserPublic>, AppError> {
        let users = self.users.list().await?;
        Ok(users.iter().map(User::to_public).collect())
    }

    /// A single user in their public shape
    pub async fn get_user(&self, user_id: &str) -> Result<UserPublic, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|user| user.to_public())
            .ok_or_else(|| AppError::NotFound(format!("User with Id {user_id} could not be found.")))
    }

    fn issue_tokens(&self, user: &User) -> Result<LoginResponse, AppError> {
        let name = user.display_name();
        let pair = generate_token_pair(
            &self.jwt_config,
            TokenSubject {
                user_id: &user.id,
                name: &name,
                email: &user.email,
            },
        )
        .map_err(|e| AppError::Internal(format!("Failed to generate tokens: {e}")))?;

        Ok(LoginResponse::new(user, pair.access_token, pair.refresh_token))
    }

    fn audit_signup_failure(&self, email: &str, reason: &str, ctx: &RequestContext) {
        audit_log(&AuditEvent::SignupFailure {
            email: email.to_string(),
            reason: reason.to_string(),
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
        });
    }

    fn audit_signin_failure(&self, email: &str, reason: &str, ctx: &RequestContext) {
        audit_log(&AuditEvent::SigninFailure {
            email: email.to_string(),
            reason: reason.to_string(),
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
        });
    }
}
