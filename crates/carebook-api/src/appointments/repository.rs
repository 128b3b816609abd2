//! Appointment repository
//!
//! Every read and write except `find_by_id` is scoped to the owning user.
//! Update and delete report how many records they touched; zero means the
//! record is absent or belongs to someone else.

use super::models::{Appointment, ListOptions, NewAppointment, UpdateAppointmentRequest};
use crate::repository::{lock, RepositoryError};
use async_trait::async_trait;
use carebook_core::SortDirection;
use sqlx::PgPool;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Appointment store operations
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Insert an appointment; `Ok(None)` when nothing was persisted
    async fn create(&self, new: NewAppointment) -> Result<Option<Appointment>, RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>, RepositoryError>;

    /// One sorted page of the appointments booked by `owner_id`
    async fn list_by_owner(
        &self,
        owner_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<Appointment>, RepositoryError>;

    /// Apply a partial update; returns the number of records changed
    async fn update_by_id(
        &self,
        id: &str,
        owner_id: &str,
        patch: &UpdateAppointmentRequest,
    ) -> Result<u64, RepositoryError>;

    /// Returns the number of records removed
    async fn delete_by_id(&self, id: &str, owner_id: &str) -> Result<u64, RepositoryError>;
}

const APPOINTMENT_COLUMNS: &str = "id, title, date, appointment_by, appointment_for, purpose, symptoms, is_confirmed, is_cancelled, created_at, updated_at";

/// PostgreSQL appointment repository
pub struct PgAppointmentRepository {
    pool: PgPool,
}

impl PgAppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentRepository for PgAppointmentRepository {
    #[instrument(skip(self, new), fields(owner = %new.appointment_by))]
    async fn create(&self, new: NewAppointment) -> Result<Option<Appointment>, RepositoryError> {
        let query = format!(
            r#"
            INSERT INTO appointments (id, title, date, appointment_by, appointment_for, purpose, symptoms, is_confirmed, is_cancelled, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, false, NOW(), NOW())
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );

        let appointment = sqlx::query_as::<_, Appointment>(&query)
            .bind(Uuid::new_v4().to_string())
            .bind(&new.title)
            .bind(new.date)
            .bind(&new.appointment_by)
            .bind(&new.appointment_for)
            .bind(&new.purpose)
            .bind(&new.symptoms)
            .bind(new.is_confirmed)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to insert appointment");
                RepositoryError::from(e)
            })?;

        Ok(appointment)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>, RepositoryError> {
        let query = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1");

        let appointment = sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(appointment)
    }

    #[instrument(skip(self))]
    async fn list_by_owner(
        &self,
        owner_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        // Column and direction come from closed enums, never from request text
        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE appointment_by = $1 ORDER BY {} {} LIMIT $2 OFFSET $3",
            options.sort_by.column(),
            options.direction.as_sql(),
        );

        let appointments = sqlx::query_as::<_, Appointment>(&query)
            .bind(owner_id)
            .bind(options.pagination.limit())
            .bind(options.pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to list appointments");
                RepositoryError::from(e)
            })?;

        debug!(count = appointments.len(), "Listed appointments");
        Ok(appointments)
    }

    #[instrument(skip(self, patch))]
    async fn update_by_id(
        &self,
        id: &str,
        owner_id: &str,
        patch: &UpdateAppointmentRequest,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE appointments SET
                title = COALESCE($3, title),
                date = COALESCE($4, date),
                appointment_for = COALESCE($5, appointment_for),
                purpose = COALESCE($6, purpose),
                symptoms = COALESCE($7, symptoms),
                is_confirmed = COALESCE($8, is_confirmed),
                is_cancelled = COALESCE($9, is_cancelled),
                updated_at = NOW()
            WHERE id = $1 AND appointment_by = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&patch.title)
        .bind(patch.date)
        .bind(&patch.appointment_for)
        .bind(&patch.purpose)
        .bind(&patch.symptoms)
        .bind(patch.is_confirmed)
        .bind(patch.is_cancelled)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to update appointment");
            RepositoryError::from(e)
        })?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str, owner_id: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1 AND appointment_by = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// In-memory implementation of AppointmentRepository for development and testing
///
/// Records keep insertion order, which also breaks sort ties.
#[derive(Default)]
pub struct InMemoryAppointmentRepository {
    appointments: Mutex<Vec<Appointment>>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository with pre-populated appointments
    pub fn with_appointments(appointments: Vec<Appointment>) -> Self {
        Self {
            appointments: Mutex::new(appointments),
        }
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn create(&self, new: NewAppointment) -> Result<Option<Appointment>, RepositoryError> {
        let appointment = Appointment::from_new(Uuid::new_v4().to_string(), new);
        lock(&self.appointments)?.push(appointment.clone());
        Ok(Some(appointment))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>, RepositoryError> {
        let appointments = lock(&self.appointments)?;
        Ok(appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let mut owned: Vec<Appointment> = lock(&self.appointments)?
            .iter()
            .filter(|a| a.appointment_by == owner_id)
            .cloned()
            .collect();

        // Stable sort; reversing the comparator keeps ties in insertion order
        owned.sort_by(|a, b| {
            let ordering = options.sort_by.compare(a, b);
            match options.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        Ok(options.pagination.apply(owned))
    }

    async fn update_by_id(
        &self,
        id: &str,
        owner_id: &str,
        patch: &UpdateAppointmentRequest,
    ) -> Result<u64, RepositoryError> {
        let mut appointments = lock(&self.appointments)?;

        match appointments
            .iter_mut()
            .find(|a| a.id == id && a.appointment_by == owner_id)
        {
            Some(appointment) => {
                appointment.apply(patch);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_by_id(&self, id: &str, owner_id: &str) -> Result<u64, RepositoryError> {
        let mut appointments = lock(&self.appointments)?;
        let before = appointments.len();
        appointments.retain(|a| !(a.id == id && a.appointment_by == owner_id));
        Ok((before - appointments.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::models::AppointmentSortField;
    use carebook_core::Pagination;
    use chrono::Utc;

    const OWNER: &str = "5f6d8a6b0a6aef0012345678";

    fn new_appointment(owner: &str, title: &str) -> NewAppointment {
        NewAppointment {
            title: title.to_string(),
            date: Utc::now(),
            appointment_by: owner.to_string(),
            appointment_for: "John Doe".to_string(),
            purpose: "Annual checkup".to_string(),
            symptoms: String::new(),
            is_confirmed: true,
        }
    }

    fn titles(appointments: &[Appointment]) -> Vec<&str> {
        appointments.iter().map(|a| a.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemoryAppointmentRepository::new();
        let created = repo
            .create(new_appointment(OWNER, "John Doe"))
            .await
            .unwrap()
            .unwrap();

        let found = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
        assert!(!found.is_cancelled);
    }

    #[tokio::test]
    async fn test_list_is_scoped_sorted_and_paged() {
        let repo = InMemoryAppointmentRepository::new();
        for title in ["Dental", "Annual Physical Exam", "Checkup"] {
            repo.create(new_appointment(OWNER, title)).await.unwrap();
        }
        repo.create(new_appointment("someone-else", "Allergy"))
            .await
            .unwrap();

        let by_title = ListOptions {
            sort_by: AppointmentSortField::Title,
            ..Default::default()
        };
        let listed = repo.list_by_owner(OWNER, &by_title).await.unwrap();
        assert_eq!(titles(&listed), vec!["Annual Physical Exam", "Checkup", "Dental"]);

        let desc_second_page = ListOptions {
            pagination: Pagination::new(2, 2).unwrap(),
            sort_by: AppointmentSortField::Title,
            direction: SortDirection::Desc,
        };
        let listed = repo.list_by_owner(OWNER, &desc_second_page).await.unwrap();
        assert_eq!(titles(&listed), vec!["Annual Physical Exam"]);
    }

    #[tokio::test]
    async fn test_sort_ties_keep_insertion_order() {
        let repo = InMemoryAppointmentRepository::new();
        let first = repo.create(new_appointment(OWNER, "Same")).await.unwrap().unwrap();
        let second = repo.create(new_appointment(OWNER, "Same")).await.unwrap().unwrap();

        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let options = ListOptions {
                sort_by: AppointmentSortField::Title,
                direction,
                ..Default::default()
            };
            let ids: Vec<String> = repo
                .list_by_owner(OWNER, &options)
                .await
                .unwrap()
                .into_iter()
                .map(|a| a.id)
                .collect();
            assert_eq!(ids, vec![first.id.clone(), second.id.clone()]);
        }
    }

    #[tokio::test]
    async fn test_update_requires_owner() {
        let repo = InMemoryAppointmentRepository::new();
        let created = repo.create(new_appointment(OWNER, "John Doe")).await.unwrap().unwrap();
        let patch = UpdateAppointmentRequest {
            is_confirmed: Some(false),
            ..Default::default()
        };

        assert_eq!(repo.update_by_id(&created.id, "intruder", &patch).await.unwrap(), 0);
        assert_eq!(repo.update_by_id(&created.id, OWNER, &patch).await.unwrap(), 1);
        assert!(!repo.find_by_id(&created.id).await.unwrap().unwrap().is_confirmed);
    }

    #[tokio::test]
    async fn test_delete_requires_owner() {
        let repo = InMemoryAppointmentRepository::new();
        let created = repo.create(new_appointment(OWNER, "John Doe")).await.unwrap().unwrap();

        assert_eq!(repo.delete_by_id(&created.id, "intruder").await.unwrap(), 0);
        assert_eq!(repo.delete_by_id(&created.id, OWNER).await.unwrap(), 1);
        assert_eq!(repo.delete_by_id(&created.id, OWNER).await.unwrap(), 0);
        assert!(repo.find_by_id(&created.id).await.unwrap().is_none());
    }
}
