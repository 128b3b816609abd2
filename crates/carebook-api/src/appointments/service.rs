//! Appointment service layer
//!
//! Appointments are only ever visible to the user who booked them. A record
//! owned by someone else is reported exactly like a missing one.

use super::models::{
    Appointment, CreateAppointmentRequest, ListAppointmentsQuery, UpdateAppointmentRequest,
};
use super::repository::AppointmentRepository;
use crate::error::AppError;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

/// Appointment service
#[derive(Clone)]
pub struct AppointmentService {
    appointments: Arc<dyn AppointmentRepository>,
}

impl AppointmentService {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    /// Book an appointment owned by `owner_id`
    pub async fn create(
        &self,
        owner_id: &str,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppError> {
        request.validate()?;

        let appointment = self
            .appointments
            .create(request.into_new(owner_id))
            .await?
            .ok_or_else(|| AppError::BadRequest("Error while creating the appointment.".to_string()))?;

        info!(appointment_id = %appointment.id, owner = %owner_id, "Appointment created");
        Ok(appointment)
    }

    pub async fn get(&self, id: &str, user_id: &str) -> Result<Appointment, AppError> {
        self.find_owned(id, user_id).await
    }

    /// One page of the caller's appointments
    pub async fn list(
        &self,
        user_id: &str,
        query: &ListAppointmentsQuery,
    ) -> Result<Vec<Appointment>, AppError> {
        let options = query.to_options()?;
        debug!(?options, "Listing appointments");

        Ok(self.appointments.list_by_owner(user_id, &options).await?)
    }

    /// Apply a partial update and return the confirmation message
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        patch: UpdateAppointmentRequest,
    ) -> Result<String, AppError> {
        patch.validate()?;

        self.find_owned(id, user_id).await?;

        let updated = self.appointments.update_by_id(id, user_id, &patch).await?;
        if updated == 0 {
            return Err(AppError::BadRequest(format!(
                "Error while updating appointment with ID {id}."
            )));
        }

        info!(appointment_id = %id, "Appointment updated");
        Ok(format!(
            "Appointment with Id {id} has been updated successfully."
        ))
    }

    /// Delete and return the confirmation message
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<String, AppError> {
        let deleted = self.appointments.delete_by_id(id, user_id).await?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!(
                "There is no appointments available with Id {id}. Please check the appointment Id."
            )));
        }

        info!(appointment_id = %id, "Appointment deleted");
        Ok(format!("Appointment with Id {id} deleted successfully"))
    }

    async fn find_owned(&self, id: &str, user_id: &str) -> Result<Appointment, AppError> {
        self.appointments
            .find_by_id(id)
            .await?
            .filter(|appointment| appointment.appointment_by == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Appointment with Id {id} could not be found.")))
    }
}
