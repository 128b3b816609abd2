//! Carebook Core - configuration, shared error type and paging primitives
//!
//! This crate holds what every Carebook component agrees on:
//! - Configuration management (server, database, auth, logging)
//! - Common error type
//! - Pagination and sort-direction types used by list endpoints

pub mod config;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Carebook operations
#[derive(Error, Debug)]
pub enum CarebookError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CarebookError>;

// ============================================================================
// Pagination
// ============================================================================

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on the page size a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = CarebookError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(CarebookError::ValidationError(format!(
                "Invalid sort direction '{other}'. Use 'asc' or 'desc'."
            ))),
        }
    }
}

/// 1-indexed page request
///
/// `page_number` starts at 1; `page_size` is bounded by [`MAX_PAGE_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    page_size: u32,
    page_number: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_number: 1,
        }
    }
}

impl Pagination {
    /// Build a validated page request
    pub fn new(page_size: u32, page_number: u32) -> Result<Self> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(CarebookError::ValidationError(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if page_number == 0 {
            return Err(CarebookError::ValidationError(
                "pageNumber must be 1 or greater".to_string(),
            ));
        }

        Ok(Self {
            page_size,
            page_number,
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Number of records to fetch (SQL `LIMIT`)
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Number of records to skip (SQL `OFFSET`)
    pub fn offset(&self) -> i64 {
        i64::from(self.page_number - 1) * i64::from(self.page_size)
    }

    /// Slice an already-sorted sequence down to this page
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.page_size as usize)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction_parse() {
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert_eq!(
            "descending".parse::<SortDirection>().unwrap(),
            SortDirection::Desc
        );
        assert!("sideways".parse::<SortDirection>().is_err());
    }

    #[test]
    fn test_sort_direction_serde() {
        let json = serde_json::to_string(&SortDirection::Desc).unwrap();
        assert_eq!(json, "\"desc\"");

        let parsed: SortDirection = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(parsed, SortDirection::Asc);
        assert_eq!(SortDirection::default().as_sql(), "ASC");
    }

    #[test]
    fn test_pagination_defaults() {
        let page = Pagination::default();
        assert_eq!(page.page_size(), 10);
        assert_eq!(page.page_number(), 1);
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn test_pagination_offset() {
        let page = Pagination::new(25, 3).unwrap();
        assert_eq!(page.offset(), 50);
        assert_eq!(page.limit(), 25);
    }

    #[test]
    fn test_pagination_rejects_out_of_range() {
        assert!(Pagination::new(0, 1).is_err());
        assert!(Pagination::new(MAX_PAGE_SIZE + 1, 1).is_err());
        assert!(matches!(
            Pagination::new(10, 0),
            Err(CarebookError::ValidationError(_))
        ));
    }

    #[test]
    fn test_pagination_apply() {
        let items: Vec<u32> = (1..=25).collect();

        let second = Pagination::new(10, 2).unwrap().apply(items.clone());
        assert_eq!(second, (11..=20).collect::<Vec<_>>());

        let third = Pagination::new(10, 3).unwrap().apply(items.clone());
        assert_eq!(third, vec![21, 22, 23, 24, 25]);

        let beyond = Pagination::new(10, 4).unwrap().apply(items);
        assert!(beyond.is_empty());
    }
}
