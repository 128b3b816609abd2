//! API handlers

pub mod appointments;
pub mod health;
pub mod users;
