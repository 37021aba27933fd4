//! Ports to the system of record. The booking engine and the HTTP handlers
//! only ever see these traits; `sqlite` and `rest` are the two adapters.

pub mod rest;
pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{
    AuthSession, Booking, BookingFilter, BookingOutcome, BookingRequest, BookingStatus,
    ClockTime, DashboardStats, Professional, ProfessionalInput, ProfessionalPatch, Service,
    ServiceInput, ServicePatch, StatusChange, User, WorkingHours, WorkingHoursPatch,
};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("cannot move booking from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("unauthorized")]
    Unauthorized,

    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BackendError {
    pub fn invalid_transition(from: BookingStatus, to: BookingStatus) -> Self {
        BackendError::InvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Active services, ordered by category.
    async fn list_services(&self) -> BackendResult<Vec<Service>>;

    /// Active professionals with their offered-service sets.
    async fn list_professionals(&self) -> BackendResult<Vec<Professional>>;
}

#[async_trait]
pub trait BookingService: Send + Sync {
    /// `Ok(Rejected)` is a business refusal with a reason for the client;
    /// `Err` means the call itself failed.
    async fn create_booking(&self, request: &BookingRequest) -> BackendResult<BookingOutcome>;

    async fn check_availability(
        &self,
        professional_id: i64,
        date: NaiveDate,
        start: ClockTime,
        end: ClockTime,
    ) -> BackendResult<bool>;

    async fn available_slots(
        &self,
        professional_id: i64,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> BackendResult<Vec<ClockTime>>;
}

#[async_trait]
pub trait AdminService: Send + Sync {
    async fn list_bookings(&self, filter: &BookingFilter) -> BackendResult<Vec<Booking>>;

    async fn update_booking_status(&self, id: i64, change: &StatusChange) -> BackendResult<Booking>;

    /// Includes inactive services.
    async fn all_services(&self) -> BackendResult<Vec<Service>>;

    async fn create_service(&self, input: &ServiceInput) -> BackendResult<Service>;

    async fn update_service(&self, id: i64, patch: &ServicePatch) -> BackendResult<Service>;

    /// Soft delete: the service is marked inactive, never removed.
    async fn deactivate_service(&self, id: i64) -> BackendResult<()>;

    /// Includes inactive professionals.
    async fn all_professionals(&self) -> BackendResult<Vec<Professional>>;

    async fn create_professional(&self, input: &ProfessionalInput) -> BackendResult<Professional>;

    async fn update_professional(
        &self,
        id: i64,
        patch: &ProfessionalPatch,
    ) -> BackendResult<Professional>;

    async fn assign_service(&self, professional_id: i64, service_id: i64) -> BackendResult<()>;

    async fn remove_service(&self, professional_id: i64, service_id: i64) -> BackendResult<()>;

    /// The professional's weekly schedule, Sunday first.
    async fn working_hours(&self, professional_id: i64) -> BackendResult<Vec<WorkingHours>>;

    async fn update_working_hours(
        &self,
        professional_id: i64,
        id: i64,
        patch: &WorkingHoursPatch,
    ) -> BackendResult<WorkingHours>;

    async fn dashboard_stats(&self, today: NaiveDate) -> BackendResult<DashboardStats>;
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn current_user(&self, token: &str) -> BackendResult<Option<User>>;

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession>;

    async fn sign_out(&self, token: &str) -> BackendResult<()>;
}

/// Everything the service needs from one system of record.
pub trait Backend: CatalogService + BookingService + AdminService + IdentityService {}

impl<T> Backend for T where T: CatalogService + BookingService + AdminService + IdentityService {}
