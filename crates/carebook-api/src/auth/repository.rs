//! User repository
//!
//! Persistence for user accounts behind the [`UserRepository`] trait:
//! - `PgUserRepository`: PostgreSQL via sqlx
//! - `InMemoryUserRepository`: process-local store for development and tests
//!
//! Repositories report absence as `Ok(None)`; turning that into a user-facing
//! failure is the service layer's job.

use super::models::{NewUser, User};
use crate::repository::{lock, RepositoryError};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Credential store operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by email address
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Find a user by ID
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, RepositoryError>;

    /// Insert a user; `Ok(None)` when nothing was persisted (email already taken)
    async fn create(&self, new_user: NewUser) -> Result<Option<User>, RepositoryError>;

    /// All users, oldest first
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;
}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, phone_number, address, is_active, is_verified, created_at, updated_at";

/// PostgreSQL user repository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to fetch user by email");
                RepositoryError::from(e)
            })?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, RepositoryError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    async fn create(&self, new_user: NewUser) -> Result<Option<User>, RepositoryError> {
        // A concurrent signup for the same email loses the race here and gets no row back
        let query = format!(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, phone_number, address, is_active, is_verified, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, true, false, NOW(), NOW())
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4().to_string())
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.phone_number)
            .bind(&new_user.address)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to insert user");
                RepositoryError::from(e)
            })?;

        debug!(created = user.is_some(), "User insert finished");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");

        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}

/// In-memory implementation of UserRepository for development and testing
///
/// Data is lost when the process exits.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository with pre-populated users
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }

    /// Number of stored users
    pub fn user_count(&self) -> usize {
        lock(&self.users).map(|users| users.len()).unwrap_or(0)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let users = lock(&self.users)?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, RepositoryError> {
        let users = lock(&self.users)?;
        Ok(users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<Option<User>, RepositoryError> {
        let mut users = lock(&self.users)?;

        if users.iter().any(|u| u.email == new_user.email) {
            debug!(email = %new_user.email, "Email already present in memory");
            return Ok(None);
        }

        let user = User::from_new(Uuid::new_v4().to_string(), new_user);
        users.push(user.clone());
        Ok(Some(user))
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(lock(&self.users)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Smith".to_string(),
            phone_number: None,
            address: Some("456 Elm Street".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemoryUserRepository::new();

        let created = repo
            .create(new_user("jane.smith@example.com"))
            .await
            .unwrap()
            .expect("user should be created");

        let by_email = repo
            .find_by_email("jane.smith@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "jane.smith@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_returns_none() {
        let repo = InMemoryUserRepository::new();

        assert!(repo.create(new_user("dup@example.com")).await.unwrap().is_some());
        assert!(repo.create(new_user("dup@example.com")).await.unwrap().is_none());
        assert_eq!(repo.user_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_user_is_none() {
        let repo = InMemoryUserRepository::new();
        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("a@example.com")).await.unwrap();
        repo.create(new_user("b@example.com")).await.unwrap();

        let emails: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.email)
            .collect();
        assert_eq!(emails, vec!["a@example.com", "b@example.com"]);
    }
}
