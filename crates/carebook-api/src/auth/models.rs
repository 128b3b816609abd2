//! Database models for user accounts
//!
//! - User: stored account, including the password hash
//! - NewUser: insert payload produced by signup
//! - UserPublic: response shape, never carries the password hash
//! - LoginResponse: signin/refresh response shape
//!
//! These models map to the `users` table created by the embedded migrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User account model
///
/// Intentionally not `Serialize`: handlers must go through [`User::to_public`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user identifier
    pub id: String,

    /// Email address (unique)
    pub email: String,

    /// Argon2id PHC string
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,

    /// Whether the account is active
    pub is_active: bool,

    /// Whether the email address has been verified
    pub is_verified: bool,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a stored record from an insert payload
    pub fn from_new(id: String, new_user: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone_number: new_user.phone_number,
            address: new_user.address,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// "First Last"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Convert user to public representation (without the password hash)
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            address: self.address.clone(),
            is_active: self.is_active,
            is_verified: self.is_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Insert payload for a new user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

/// Public user representation (safe for API responses)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Signin response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: String,
    pub name: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl LoginResponse {
    pub fn new(user: &User, access_token: String, refresh_token: String) -> Self {
        Self {
            id: user.id.clone(),
            name: user.display_name(),
            access_token,
            refresh_token,
        }
    }
}
