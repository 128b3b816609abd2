//! Authentication and authorization module
//!
//! This module provides JWT-based authentication with the following components:
//! - Access/refresh token generation and validation
//! - Password hashing with Argon2
//! - Middleware for request authentication
//! - Authentication service for signup, signin and refresh
//! - Database models for users
//! - Repository layer for PostgreSQL and in-memory storage

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;

pub use jwt::{
    generate_token, generate_token_pair, validate_access_token, validate_refresh_token, Claims,
    JwtConfig, JwtError, TokenPair, TokenType,
};
pub use middleware::{auth_middleware, AuthError, AuthenticatedUser};
pub use models::{LoginResponse, NewUser, User, UserPublic};
pub use password::{hash_password, verify_password, PasswordConfig, PasswordError};
pub use repository::{InMemoryUserRepository, PgUserRepository, UserRepository};
pub use service::{AuthService, RefreshRequest, SigninRequest, SignupRequest};
