use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;

use super::{
    AdminService, BackendError, BackendResult, BookingService, CatalogService, IdentityService,
};
use crate::db::queries;
use crate::models::{
    AuthSession, Booking, BookingFilter, BookingOutcome, BookingRequest, BookingStatus,
    ClockTime, DashboardStats, OpeningHours, Professional, ProfessionalInput, ProfessionalPatch,
    Service, ServiceInput, ServicePatch, StatusChange, User, WorkingHours, WorkingHoursPatch,
};
use crate::services::auth::{hash_password, verify_password};
use crate::services::scheduling::{free_slots, validate_booking_time};

pub const SERVICE_UNAVAILABLE: &str = "service is no longer available";
pub const PROFESSIONAL_UNAVAILABLE: &str = "professional is not available for this service";

/// Embedded system of record: catalog, bookings and staff accounts in SQLite.
pub struct SqliteBackend {
    db: Arc<Mutex<Connection>>,
    hours: OpeningHours,
    session_ttl: chrono::Duration,
}

impl SqliteBackend {
    pub fn new(conn: Connection, hours: OpeningHours, session_ttl: chrono::Duration) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            hours,
            session_ttl,
        }
    }

    fn conn(&self) -> BackendResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| BackendError::Internal(anyhow::anyhow!("database lock poisoned")))
    }

    /// Creates a staff account. Used to seed the first administrator.
    pub fn create_user(&self, email: &str, password: &str, role: &str) -> BackendResult<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(BackendError::Invalid("email and password are required".to_string()));
        }
        let hash = hash_password(password)?;
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
            role: role.to_string(),
        };
        let conn = self.conn()?;
        queries::insert_user(&conn, &user.id, &user.email, &hash, &user.role)?;
        Ok(user)
    }

    /// Seeds an administrator unless an account with that email exists.
    pub fn ensure_user(&self, email: &str, password: &str, role: &str) -> BackendResult<bool> {
        let exists = {
            let conn = self.conn()?;
            queries::get_user_credentials(&conn, &email.trim().to_lowercase())?.is_some()
        };
        if exists {
            return Ok(false);
        }
        self.create_user(email, password, role)?;
        Ok(true)
    }

    pub fn expire_sessions(&self) -> BackendResult<usize> {
        let conn = self.conn()?;
        Ok(queries::expire_auth_sessions(&conn, &Utc::now().naive_utc())?)
    }
}

#[async_trait]
impl CatalogService for SqliteBackend {
    async fn list_services(&self) -> BackendResult<Vec<Service>> {
        let conn = self.conn()?;
        Ok(queries::list_services(&conn, true)?)
    }

    async fn list_professionals(&self) -> BackendResult<Vec<Professional>> {
        let conn = self.conn()?;
        Ok(queries::list_professionals(&conn, true)?)
    }
}

#[async_trait]
impl BookingService for SqliteBackend {
    async fn create_booking(&self, request: &BookingRequest) -> BackendResult<BookingOutcome> {
        if request.end_time <= request.start_time {
            return Err(BackendError::Invalid("end time must be after start time".to_string()));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(anyhow::Error::from)?;

        let service_ok = queries::get_service(&tx, request.service_id)?.is_some_and(|s| s.is_active);
        if !service_ok {
            return Ok(BookingOutcome::Rejected {
                reason: SERVICE_UNAVAILABLE.to_string(),
            });
        }

        let professional_ok = queries::get_professional(&tx, request.professional_id)?
            .is_some_and(|p| p.is_active && p.offers(request.service_id));
        if !professional_ok {
            return Ok(BookingOutcome::Rejected {
                reason: PROFESSIONAL_UNAVAILABLE.to_string(),
            });
        }

        if let Err(e) = validate_booking_time(
            &tx,
            &self.hours,
            request.professional_id,
            request.date,
            request.start_time,
            request.end_time,
        )? {
            tracing::info!(
                professional_id = request.professional_id,
                date = %request.date,
                start = %request.start_time,
                reason = %e,
                "booking rejected"
            );
            return Ok(BookingOutcome::Rejected {
                reason: e.to_string(),
            });
        }

        let client_id = queries::find_or_create_client(
            &tx,
            request.client_name.trim(),
            &request.client_email.trim().to_lowercase(),
            request.client_phone.trim(),
            request.notes.as_deref(),
        )?;
        let record_id = queries::insert_booking(&tx, client_id, request, &Utc::now().naive_utc())?;
        tx.commit().map_err(anyhow::Error::from)?;

        tracing::info!(
            booking_id = record_id,
            professional_id = request.professional_id,
            date = %request.date,
            start = %request.start_time,
            "booking created"
        );
        Ok(BookingOutcome::Created { record_id })
    }

    async fn check_availability(
        &self,
        professional_id: i64,
        date: NaiveDate,
        start: ClockTime,
        end: ClockTime,
    ) -> BackendResult<bool> {
        let conn = self.conn()?;
        let verdict = validate_booking_time(&conn, &self.hours, professional_id, date, start, end)?;
        Ok(verdict.is_ok())
    }

    async fn available_slots(
        &self,
        professional_id: i64,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> BackendResult<Vec<ClockTime>> {
        let conn = self.conn()?;
        Ok(free_slots(&conn, &self.hours, professional_id, date, duration_minutes)?)
    }
}

#[async_trait]
impl AdminService for SqliteBackend {
    async fn list_bookings(&self, filter: &BookingFilter) -> BackendResult<Vec<Booking>> {
        let conn = self.conn()?;
        Ok(queries::list_bookings(&conn, filter)?)
    }

    async fn update_booking_status(&self, id: i64, change: &StatusChange) -> BackendResult<Booking> {
        let conn = self.conn()?;
        let booking = queries::get_booking(&conn, id)?
            .ok_or_else(|| BackendError::NotFound(format!("booking {id}")))?;

        let target = change.target();
        if !booking.status.can_transition_to(target) {
            return Err(BackendError::invalid_transition(booking.status, target));
        }
        let reason = change.reason().map(str::trim);
        if target == BookingStatus::Cancelled && reason.map_or(true, str::is_empty) {
            return Err(BackendError::Invalid("a cancellation reason is required".to_string()));
        }

        queries::update_booking_status(&conn, id, target, reason, &Utc::now().naive_utc())?;
        tracing::info!(booking_id = id, from = booking.status.as_str(), to = target.as_str(), "booking status changed");

        queries::get_booking(&conn, id)?
            .ok_or_else(|| BackendError::NotFound(format!("booking {id}")))
    }

    async fn all_services(&self) -> BackendResult<Vec<Service>> {
        let conn = self.conn()?;
        Ok(queries::list_services(&conn, false)?)
    }

    async fn create_service(&self, input: &ServiceInput) -> BackendResult<Service> {
        input.validate().map_err(BackendError::Invalid)?;
        let conn = self.conn()?;
        let id = queries::insert_service(&conn, input)?;
        queries::get_service(&conn, id)?
            .ok_or_else(|| BackendError::NotFound(format!("service {id}")))
    }

    async fn update_service(&self, id: i64, patch: &ServicePatch) -> BackendResult<Service> {
        patch.validate().map_err(BackendError::Invalid)?;
        let conn = self.conn()?;
        let mut service = queries::get_service(&conn, id)?
            .ok_or_else(|| BackendError::NotFound(format!("service {id}")))?;
        patch.apply(&mut service);
        queries::save_service(&conn, &service)?;
        Ok(service)
    }

    async fn deactivate_service(&self, id: i64) -> BackendResult<()> {
        let conn = self.conn()?;
        if !queries::set_service_active(&conn, id, false)? {
            return Err(BackendError::NotFound(format!("service {id}")));
        }
        tracing::info!(service_id = id, "service deactivated");
        Ok(())
    }

    async fn all_professionals(&self) -> BackendResult<Vec<Professional>> {
        let conn = self.conn()?;
        Ok(queries::list_professionals(&conn, false)?)
    }

    async fn create_professional(&self, input: &ProfessionalInput) -> BackendResult<Professional> {
        if input.name.trim().is_empty() {
            return Err(BackendError::Invalid("professional name is required".to_string()));
        }
        let conn = self.conn()?;
        let id = queries::insert_professional(&conn, input)?;
        queries::seed_working_hours(&conn, id, &self.hours)?;
        queries::get_professional(&conn, id)?
            .ok_or_else(|| BackendError::NotFound(format!("professional {id}")))
    }

    async fn update_professional(
        &self,
        id: i64,
        patch: &ProfessionalPatch,
    ) -> BackendResult<Professional> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(BackendError::Invalid("professional name cannot be empty".to_string()));
        }
        let conn = self.conn()?;
        let mut professional = queries::get_professional(&conn, id)?
            .ok_or_else(|| BackendError::NotFound(format!("professional {id}")))?;
        patch.apply(&mut professional);
        queries::save_professional(&conn, &professional)?;
        Ok(professional)
    }

    async fn assign_service(&self, professional_id: i64, service_id: i64) -> BackendResult<()> {
        let conn = self.conn()?;
        if queries::get_professional(&conn, professional_id)?.is_none() {
            return Err(BackendError::NotFound(format!("professional {professional_id}")));
        }
        if queries::get_service(&conn, service_id)?.is_none() {
            return Err(BackendError::NotFound(format!("service {service_id}")));
        }
        queries::assign_service(&conn, professional_id, service_id)?;
        Ok(())
    }

    async fn remove_service(&self, professional_id: i64, service_id: i64) -> BackendResult<()> {
        let conn = self.conn()?;
        if !queries::remove_service(&conn, professional_id, service_id)? {
            return Err(BackendError::NotFound(format!(
                "service {service_id} is not assigned to professional {professional_id}"
            )));
        }
        Ok(())
    }

    async fn working_hours(&self, professional_id: i64) -> BackendResult<Vec<WorkingHours>> {
        let conn = self.conn()?;
        if queries::get_professional(&conn, professional_id)?.is_none() {
            return Err(BackendError::NotFound(format!("professional {professional_id}")));
        }
        // professionals created before schedules existed get the salon's week
        if queries::seed_working_hours(&conn, professional_id, &self.hours)? > 0 {
            tracing::debug!(professional_id, "seeded working hours");
        }
        Ok(queries::working_hours_for(&conn, professional_id)?)
    }

    async fn update_working_hours(
        &self,
        professional_id: i64,
        id: i64,
        patch: &WorkingHoursPatch,
    ) -> BackendResult<WorkingHours> {
        if patch.is_empty() {
            return Err(BackendError::Invalid("nothing to update".to_string()));
        }
        let conn = self.conn()?;
        let mut day = queries::get_working_hours(&conn, professional_id, id)?.ok_or_else(|| {
            BackendError::NotFound(format!("working hours {id} of professional {professional_id}"))
        })?;
        patch.apply(&mut day);
        day.validate().map_err(BackendError::Invalid)?;
        queries::save_working_hours(&conn, &day)?;
        tracing::info!(professional_id, day_of_week = day.day_of_week, "working hours updated");
        Ok(day)
    }

    async fn dashboard_stats(&self, today: NaiveDate) -> BackendResult<DashboardStats> {
        let conn = self.conn()?;
        Ok(queries::dashboard_stats(&conn, today)?)
    }
}

#[async_trait]
impl IdentityService for SqliteBackend {
    async fn current_user(&self, token: &str) -> BackendResult<Option<User>> {
        let conn = self.conn()?;
        Ok(queries::get_session_user(&conn, token, &Utc::now().naive_utc())?)
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        let conn = self.conn()?;
        let (user, hash) = queries::get_user_credentials(&conn, &email.trim().to_lowercase())?
            .ok_or(BackendError::Unauthorized)?;

        if !verify_password(password, &hash)? {
            tracing::warn!(email = %user.email, "failed sign-in attempt");
            return Err(BackendError::Unauthorized);
        }

        let token = uuid::Uuid::new_v4().to_string();
        let expires_at = Utc::now().naive_utc() + self.session_ttl;
        queries::insert_auth_session(&conn, &token, &user.id, &expires_at)?;

        Ok(AuthSession {
            token,
            user,
            expires_at,
        })
    }

    async fn sign_out(&self, token: &str) -> BackendResult<()> {
        let conn = self.conn()?;
        queries::delete_auth_session(&conn, token)?;
        Ok(())
    }
}
