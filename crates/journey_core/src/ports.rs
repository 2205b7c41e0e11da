//! crates/journey_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the dashboard's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of where student records live (a workbook on disk, a remote
//! spreadsheet script, or anything else).

use async_trait::async_trait;

use crate::domain::{Lead, StudentBundle};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// No student profile exists for the given email.
    #[error("No account found for {0}")]
    NotFound(String),
    /// The profile exists but has no applications yet.
    #[error("No applications found for {0}")]
    NoApplications(String),
    /// The backing store could not be reached or returned something unreadable.
    #[error("Data source unavailable: {0}")]
    Unavailable(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait StudentDataSource: Send + Sync {
    /// Loads the student profile and every application (with milestones and documents)
    /// belonging to `email`. Never returns an empty application list.
    async fn fetch_student_bundle(&self, email: &str) -> PortResult<StudentBundle>;
}

#[async_trait]
pub trait LeadSink: Send + Sync {
    /// Records a validated contact-form enquiry.
    async fn submit_lead(&self, lead: &Lead) -> PortResult<()>;
}
