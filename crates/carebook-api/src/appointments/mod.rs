//! Appointment scheduling
//!
//! - Models and request shapes
//! - Repository layer (PostgreSQL and in-memory)
//! - Service layer with ownership rules

pub mod models;
pub mod repository;
pub mod service;

pub use models::{
    Appointment, AppointmentSortField, CreateAppointmentRequest, ListAppointmentsQuery,
    ListOptions, NewAppointment, UpdateAppointmentRequest,
};
pub use repository::{
    AppointmentRepository, InMemoryAppointmentRepository, PgAppointmentRepository,
};
pub use service::AppointmentService;
