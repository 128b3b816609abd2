//! Application state management

use crate::appointments::{
    AppointmentRepository, AppointmentService, InMemoryAppointmentRepository,
    PgAppointmentRepository,
};
use crate::auth::{
    AuthService, InMemoryUserRepository, JwtConfig, PgUserRepository, UserRepository,
};
use carebook_core::config::AppConfig;
use sqlx::PgPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Storage backing the repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    InMemory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::InMemory => "in-memory",
        }
    }
}

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Ready status
    pub is_ready: AtomicBool,
    /// Token settings used by the request gate
    pub jwt_config: JwtConfig,
    pub auth_service: AuthService,
    pub appointment_service: AppointmentService,
    /// Present when running against PostgreSQL
    pub db_pool: Option<PgPool>,
    pub backend: StorageBackend,
}

impl AppState {
    /// Create state over explicit repositories
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        appointments: Arc<dyn AppointmentRepository>,
        db_pool: Option<PgPool>,
    ) -> Self {
        let auth_service = AuthService::from_config(users, &config.auth);
        let backend = if db_pool.is_some() {
            StorageBackend::Postgres
        } else {
            StorageBackend::InMemory
        };

        Self {
            jwt_config: auth_service.jwt_config().clone(),
            auth_service,
            appointment_service: AppointmentService::new(appointments),
            config,
            start_time: Instant::now(),
            is_ready: AtomicBool::new(true),
            db_pool,
            backend,
        }
    }

    /// State backed by process-local stores
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryAppointmentRepository::new()),
            None,
        )
    }

    /// State backed by PostgreSQL
    pub fn with_postgres(pool: PgPool, config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgAppointmentRepository::new(pool.clone())),
            Some(pool),
        )
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if service is ready
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::SeqCst)
    }

    /// Set ready status
    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::SeqCst);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory(AppConfig::default())
    }
}
