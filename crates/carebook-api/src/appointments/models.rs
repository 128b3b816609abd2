//! Appointment models and request shapes
//!
//! These models map to the `appointments` table created by the embedded
//! migrations. `appointment_by` always holds the id of the user who created
//! the record and is never taken from the request body.

use carebook_core::{CarebookError, Pagination, SortDirection, DEFAULT_PAGE_SIZE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Stored appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    /// Owner: id of the user who booked it
    pub appointment_by: String,
    /// Who the appointment is for
    pub appointment_for: String,
    pub purpose: String,
    pub symptoms: String,
    pub is_confirmed: bool,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Build a stored record from an insert payload
    pub fn from_new(id: String, new: NewAppointment) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: new.title,
            date: new.date,
            appointment_by: new.appointment_by,
            appointment_for: new.appointment_for,
            purpose: new.purpose,
            symptoms: new.symptoms,
            is_confirmed: new.is_confirmed,
            is_cancelled: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the fields present in `patch`
    pub fn apply(&mut self, patch: &UpdateAppointmentRequest) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(appointment_for) = &patch.appointment_for {
            self.appointment_for = appointment_for.clone();
        }
        if let Some(purpose) = &patch.purpose {
            self.purpose = purpose.clone();
        }
        if let Some(symptoms) = &patch.symptoms {
            self.symptoms = symptoms.clone();
        }
        if let Some(is_confirmed) = patch.is_confirmed {
            self.is_confirmed = is_confirmed;
        }
        if let Some(is_cancelled) = patch.is_cancelled {
            self.is_cancelled = is_cancelled;
        }
        self.updated_at = Utc::now();
    }
}

/// Insert payload: the request body plus the authenticated owner
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub title: String,
    pub date: DateTime<Utc>,
    pub appointment_by: String,
    pub appointment_for: String,
    pub purpose: String,
    pub symptoms: String,
    pub is_confirmed: bool,
}

/// Create appointment request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    pub date: DateTime<Utc>,

    #[validate(length(min = 1, message = "Appointment for is required"))]
    pub appointment_for: String,

    #[serde(default)]
    pub purpose: String,

    #[serde(default)]
    pub symptoms: String,

    #[serde(default)]
    pub is_confirmed: bool,
}

impl CreateAppointmentRequest {
    pub fn into_new(self, owner_id: &str) -> NewAppointment {
        NewAppointment {
            title: self.title,
            date: self.date,
            appointment_by: owner_id.to_string(),
            appointment_for: self.appointment_for,
            purpose: self.purpose,
            symptoms: self.symptoms,
            is_confirmed: self.is_confirmed,
        }
    }
}

/// Partial update: absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, message = "Appointment for must not be empty"))]
    pub appointment_for: Option<String>,
    pub purpose: Option<String>,
    pub symptoms: Option<String>,
    pub is_confirmed: Option<bool>,
    pub is_cancelled: Option<bool>,
}

/// Columns an appointment list may be ordered by
///
/// Only these ever reach an `ORDER BY` clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppointmentSortField {
    #[default]
    Id,
    Title,
    Date,
    AppointmentFor,
    CreatedAt,
    UpdatedAt,
}

impl AppointmentSortField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Date => "date",
            Self::AppointmentFor => "appointment_for",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    /// Ascending order of two records on this field
    pub fn compare(&self, a: &Appointment, b: &Appointment) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Title => a.title.cmp(&b.title),
            Self::Date => a.date.cmp(&b.date),
            Self::AppointmentFor => a.appointment_for.cmp(&b.appointment_for),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

impl fmt::Display for AppointmentSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Date => "date",
            Self::AppointmentFor => "appointmentFor",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
        };
        write!(f, "{name}")
    }
}

impl FromStr for AppointmentSortField {
    type Err = CarebookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "title" => Ok(Self::Title),
            "date" => Ok(Self::Date),
            "appointmentFor" | "appointment_for" => Ok(Self::AppointmentFor),
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            "updatedAt" | "updated_at" => Ok(Self::UpdatedAt),
            other => Err(CarebookError::ValidationError(format!(
                "Invalid sort field '{other}'. Use one of: id, title, date, appointmentFor, createdAt, updatedAt."
            ))),
        }
    }
}

/// Query string of the list endpoint
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListAppointmentsQuery {
    /// Records per page (default 10)
    pub page_size: Option<u32>,
    /// 1-indexed page (default 1)
    pub page_number: Option<u32>,
    /// Field to sort by (default `id`)
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default `asc`)
    pub sort_order: Option<String>,
}

impl ListAppointmentsQuery {
    /// Resolve defaults and reject unknown sort fields or directions
    pub fn to_options(&self) -> Result<ListOptions, CarebookError> {
        let pagination = Pagination::new(
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            self.page_number.unwrap_or(1),
        )?;

        let sort_by = match &self.sort_by {
            Some(field) => field.parse()?,
            None => AppointmentSortField::default(),
        };

        let direction = match &self.sort_order {
            Some(order) => order.parse()?,
            None => SortDirection::default(),
        };

        Ok(ListOptions {
            pagination,
            sort_by,
            direction,
        })
    }
}

/// Validated list parameters handed to the repository
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ListOptions {
    pub pagination: Pagination,
    pub sort_by: AppointmentSortField,
    pub direction: SortDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment(id: &str, title: &str) -> Appointment {
        Appointment::from_new(
            id.to_string(),
            NewAppointment {
                title: title.to_string(),
                date: Utc::now(),
                appointment_by: "5f6d8a6b0a6aef0012345678".to_string(),
                appointment_for: "John Doe".to_string(),
                purpose: "Annual checkup".to_string(),
                symptoms: String::new(),
                is_confirmed: true,
            },
        )
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let json = serde_json::to_value(appointment("1", "John Doe")).unwrap();
        assert_eq!(json["appointmentBy"], "5f6d8a6b0a6aef0012345678");
        assert_eq!(json["appointmentFor"], "John Doe");
        assert_eq!(json["isConfirmed"], true);
        assert_eq!(json["isCancelled"], false);
    }

    #[test]
    fn test_create_request_sets_owner() {
        let request: CreateAppointmentRequest = serde_json::from_value(serde_json::json!({
            "title": "John Doe",
            "date": "2026-03-01T09:30:00Z",
            "appointmentFor": "John Doe",
            "isConfirmed": true,
            "purpose": "Annual checkup"
        }))
        .unwrap();

        let new = request.into_new("owner-1");
        assert_eq!(new.appointment_by, "owner-1");
        assert_eq!(new.symptoms, "");
        assert!(new.is_confirmed);
    }

    #[test]
    fn test_apply_partial_update() {
        let mut record = appointment("1", "John Doe");
        record.apply(&UpdateAppointmentRequest {
            title: Some("Annual Physical Exam".to_string()),
            is_cancelled: Some(true),
            ..Default::default()
        });

        assert_eq!(record.title, "Annual Physical Exam");
        assert!(record.is_cancelled);
        assert_eq!(record.purpose, "Annual checkup");
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!("title".parse::<AppointmentSortField>().unwrap(), AppointmentSortField::Title);
        assert_eq!(
            "createdAt".parse::<AppointmentSortField>().unwrap(),
            AppointmentSortField::CreatedAt
        );
        assert_eq!(
            "appointment_for".parse::<AppointmentSortField>().unwrap(),
            AppointmentSortField::AppointmentFor
        );
        assert!("title; DROP TABLE appointments".parse::<AppointmentSortField>().is_err());
    }

    #[test]
    fn test_query_defaults() {
        let options = ListAppointmentsQuery::default().to_options().unwrap();

        assert_eq!(options.pagination.page_size(), 10);
        assert_eq!(options.pagination.page_number(), 1);
        assert_eq!(options.sort_by, AppointmentSortField::Id);
        assert_eq!(options.direction, SortDirection::Asc);
    }

    #[test]
    fn test_query_rejects_bad_values() {
        let bad_field = ListAppointmentsQuery {
            sort_by: Some("password".to_string()),
            ..Default::default()
        };
        assert!(bad_field.to_options().is_err());

        let bad_page = ListAppointmentsQuery {
            page_number: Some(0),
            ..Default::default()
        };
        assert!(bad_page.to_options().is_err());

        let bad_order = ListAppointmentsQuery {
            sort_order: Some("sideways".to_string()),
            ..Default::default()
        };
        assert!(bad_order.to_options().is_err());
    }

    #[test]
    fn test_compare_by_title() {
        let a = appointment("2", "Annual Physical Exam");
        let b = appointment("1", "John Doe");
        assert_eq!(AppointmentSortField::Title.compare(&a, &b), Ordering::Less);
        assert_eq!(AppointmentSortField::Id.compare(&a, &b), Ordering::Greater);
    }
}
