use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{
    AdminService, BackendError, BackendResult, BookingService, CatalogService, IdentityService,
};
use crate::models::{
    AuthSession, Booking, BookingFilter, BookingOutcome, BookingRequest, BookingStatus,
    ClockTime, DashboardStats, Price, Professional, ProfessionalInput, ProfessionalPatch,
    Service, ServiceInput, ServicePatch, StatusChange, User, WorkingHours, WorkingHoursPatch,
};

pub const SLOT_UNAVAILABLE: &str = "slot unavailable";

const RETURN_REPRESENTATION: &str = "return=representation";
const PROFESSIONAL_SELECT: &str = "*,professional_services(service_id)";

/// Client for a hosted PostgREST-style backend: tables under `/rest/v1`,
/// stored procedures under `/rest/v1/rpc`, password auth under `/auth/v1`.
pub struct RestBackend {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RestBackend {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{table}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn rpc(&self, function: &str, args: Value) -> RequestBuilder {
        self.table(Method::POST, &format!("rpc/{function}")).json(&args)
    }

    fn auth(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/auth/v1/{path}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }

    async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> BackendResult<T> {
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(error_from_response(status, resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn execute(request: RequestBuilder) -> BackendResult<()> {
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(error_from_response(status, resp).await);
        }
        Ok(())
    }

    async fn find_or_create_client(&self, request: &BookingRequest) -> BackendResult<i64> {
        let email = request.client_email.trim().to_lowercase();
        let existing: Vec<IdRow> = Self::fetch(
            self.table(Method::GET, "clients")
                .query(&[("select", "id".to_string()), ("email", format!("eq.{email}"))]),
        )
        .await?;
        if let Some(row) = existing.first() {
            return Ok(row.id);
        }

        let created: Vec<IdRow> = Self::fetch(
            self.table(Method::POST, "clients")
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&json!({
                    "name": request.client_name,
                    "email": email,
                    "phone": request.client_phone,
                })),
        )
        .await?;
        let id = single(created, "client")?.id;
        tracing::info!(client_id = id, "created client");
        Ok(id)
    }

    async fn booking(&self, id: i64) -> BackendResult<Booking> {
        let rows: Vec<BookingRow> = Self::fetch(
            self.table(Method::GET, "bookings_detailed")
                .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))]),
        )
        .await?;
        rows.into_iter()
            .next()
            .map(Booking::from)
            .ok_or_else(|| BackendError::NotFound(format!("booking {id}")))
    }

    async fn professional(&self, id: i64) -> BackendResult<Professional> {
        let rows: Vec<ProfessionalRow> = Self::fetch(
            self.table(Method::GET, "professionals")
                .query(&[("select", PROFESSIONAL_SELECT.to_string()), ("id", format!("eq.{id}"))]),
        )
        .await?;
        rows.into_iter()
            .next()
            .map(Professional::from)
            .ok_or_else(|| BackendError::NotFound(format!("professional {id}")))
    }

    async fn count(&self, table: &str, filters: &[(&str, String)]) -> BackendResult<i64> {
        let rows: Vec<IdRow> = Self::fetch(
            self.table(Method::GET, table)
                .query(&[("select", "id".to_string())])
                .query(filters),
        )
        .await?;
        Ok(rows.len() as i64)
    }
}

/// PostgREST reports failures as `{"message": ...}`; anything else is kept raw.
async fn error_from_response(status: StatusCode, resp: reqwest::Response) -> BackendError {
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| v[*key].as_str().map(str::to_string))
        })
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized,
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        s if s.is_client_error() => BackendError::Invalid(message),
        s => BackendError::Internal(anyhow::anyhow!("backend error ({s}): {message}")),
    }
}

fn single<T>(rows: Vec<T>, what: &str) -> BackendResult<T> {
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::Internal(anyhow::anyhow!("backend returned no {what} row")))
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ServiceRow {
    id: i64,
    name: String,
    description: Option<String>,
    duration_minutes: u32,
    price: Option<f64>,
    category: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            id: row.id,
            name: row.name,
            description: row.description.unwrap_or_default(),
            duration_minutes: row.duration_minutes,
            price: Price::from_column(row.price),
            category: row.category.unwrap_or_default(),
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceLink {
    service_id: i64,
}

#[derive(Debug, Deserialize)]
struct ProfessionalRow {
    id: i64,
    name: String,
    specialty: Option<String>,
    bio: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
    #[serde(default)]
    professional_services: Vec<ServiceLink>,
}

impl From<ProfessionalRow> for Professional {
    fn from(row: ProfessionalRow) -> Self {
        Professional {
            id: row.id,
            name: row.name,
            specialty: row.specialty.unwrap_or_default(),
            bio: row.bio.unwrap_or_default(),
            service_ids: row
                .professional_services
                .into_iter()
                .map(|link| link.service_id)
                .collect(),
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BookingRow {
    id: i64,
    client_id: i64,
    professional_id: i64,
    service_id: i64,
    booking_date: NaiveDate,
    start_time: ClockTime,
    end_time: ClockTime,
    status: BookingStatus,
    #[serde(default)]
    client_name: Option<String>,
    #[serde(default)]
    client_phone: Option<String>,
    #[serde(default)]
    client_email: Option<String>,
    #[serde(default)]
    client_notes: Option<String>,
    #[serde(default)]
    cancellation_reason: Option<String>,
    #[serde(default)]
    service_name: Option<String>,
    #[serde(default)]
    professional_name: Option<String>,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            client_id: row.client_id,
            professional_id: row.professional_id,
            service_id: row.service_id,
            booking_date: row.booking_date,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
            client_name: row.client_name.unwrap_or_default(),
            client_phone: row.client_phone.unwrap_or_default(),
            client_email: row.client_email.unwrap_or_default(),
            client_notes: row.client_notes,
            cancellation_reason: row.cancellation_reason,
            service_name: row.service_name,
            professional_name: row.professional_name,
            created_at: row.created_at.naive_utc(),
            updated_at: row.updated_at.naive_utc(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    service_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl From<AuthUser> for User {
    fn from(user: AuthUser) -> Self {
        let role = user.user_metadata["role"]
            .as_str()
            .unwrap_or("staff")
            .to_string();
        User {
            id: user.id,
            email: user.email.unwrap_or_default(),
            role,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct WorkingHoursRow {
    id: i64,
    professional_id: i64,
    day_of_week: u8,
    start_time: ClockTime,
    end_time: ClockTime,
    #[serde(default = "default_true")]
    is_available: bool,
}

impl From<WorkingHoursRow> for WorkingHours {
    fn from(row: WorkingHoursRow) -> Self {
        Self {
            id: row.id,
            professional_id: row.professional_id,
            day_of_week: row.day_of_week,
            start_time: row.start_time,
            end_time: row.end_time,
            is_available: row.is_available,
        }
    }
}

fn default_true() -> bool {
    true
}

#[async_trait]
impl CatalogService for RestBackend {
    async fn list_services(&self) -> BackendResult<Vec<Service>> {
        let rows: Vec<ServiceRow> = Self::fetch(self.table(Method::GET, "services").query(&[
            ("select", "*"),
            ("is_active", "eq.true"),
            ("order", "category.asc"),
        ]))
        .await?;
        Ok(rows.into_iter().map(Service::from).collect())
    }

    async fn list_professionals(&self) -> BackendResult<Vec<Professional>> {
        let rows: Vec<ProfessionalRow> = Self::fetch(self.table(Method::GET, "professionals").query(&[
            ("select", PROFESSIONAL_SELECT),
            ("is_active", "eq.true"),
            ("order", "name.asc"),
        ]))
        .await?;
        Ok(rows.into_iter().map(Professional::from).collect())
    }
}

#[async_trait]
impl BookingService for RestBackend {
    async fn create_booking(&self, request: &BookingRequest) -> BackendResult<BookingOutcome> {
        let free = self
            .check_availability(
                request.professional_id,
                request.date,
                request.start_time,
                request.end_time,
            )
            .await?;
        if !free {
            tracing::info!(
                professional_id = request.professional_id,
                date = %request.date,
                start = %request.start_time,
                "booking rejected: slot unavailable"
            );
            return Ok(BookingOutcome::Rejected {
                reason: SLOT_UNAVAILABLE.to_string(),
            });
        }

        let client_id = self.find_or_create_client(request).await?;

        let inserted: BackendResult<Vec<IdRow>> = Self::fetch(
            self.table(Method::POST, "bookings")
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&json!({
                    "client_id": client_id,
                    "professional_id": request.professional_id,
                    "service_id": request.service_id,
                    "booking_date": request.date,
                    "start_time": request.start_time,
                    "end_time": request.end_time,
                    "status": BookingStatus::Pending.as_str(),
                    "client_notes": request.notes,
                })),
        )
        .await;

        match inserted {
            Ok(rows) => {
                let record_id = single(rows, "booking")?.id;
                tracing::info!(record_id, professional_id = request.professional_id, "booking created");
                Ok(BookingOutcome::Created { record_id })
            }
            // constraint violations come back as 4xx with a readable message
            Err(BackendError::Invalid(reason)) => {
                tracing::info!(%reason, "booking rejected by backend");
                Ok(BookingOutcome::Rejected { reason })
            }
            Err(e) => Err(e),
        }
    }

    async fn check_availability(
        &self,
        professional_id: i64,
        date: NaiveDate,
        start: ClockTime,
        end: ClockTime,
    ) -> BackendResult<bool> {
        Self::fetch(self.rpc(
            "check_availability",
            json!({
                "p_professional_id": professional_id,
                "p_date": date,
                "p_start_time": start,
                "p_end_time": end,
            }),
        ))
        .await
    }

    async fn available_slots(
        &self,
        professional_id: i64,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> BackendResult<Vec<ClockTime>> {
        Self::fetch(self.rpc(
            "get_available_slots",
            json!({
                "p_professional_id": professional_id,
                "p_date": date,
                "p_duration": duration_minutes,
            }),
        ))
        .await
    }
}

#[async_trait]
impl AdminService for RestBackend {
    async fn list_bookings(&self, filter: &BookingFilter) -> BackendResult<Vec<Booking>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "booking_date.asc,start_time.asc".to_string()),
        ];
        if let Some(date) = filter.date {
            query.push(("booking_date", format!("eq.{date}")));
        }
        if let Some(status) = filter.status {
            query.push(("status", format!("eq.{}", status.as_str())));
        }
        if let Some(pid) = filter.professional_id {
            query.push(("professional_id", format!("eq.{pid}")));
        }

        let rows: Vec<BookingRow> =
            Self::fetch(self.table(Method::GET, "bookings_detailed").query(&query)).await?;
        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn update_booking_status(&self, id: i64, change: &StatusChange) -> BackendResult<Booking> {
        let booking = self.booking(id).await?;

        let target = change.target();
        if !booking.status.can_transition_to(target) {
            return Err(BackendError::invalid_transition(booking.status, target));
        }

        let mut updates = json!({ "status": target.as_str() });
        if target == BookingStatus::Cancelled {
            let reason = change.reason().map(str::trim).unwrap_or_default();
            if reason.is_empty() {
                return Err(BackendError::Invalid("a cancellation reason is required".to_string()));
            }
            updates["cancellation_reason"] = json!(reason);
        }

        Self::execute(
            self.table(Method::PATCH, "bookings")
                .query(&[("id", format!("eq.{id}"))])
                .json(&updates),
        )
        .await?;
        tracing::info!(booking_id = id, from = booking.status.as_str(), to = target.as_str(), "booking status changed");

        self.booking(id).await
    }

    async fn all_services(&self) -> BackendResult<Vec<Service>> {
        let rows: Vec<ServiceRow> = Self::fetch(
            self.table(Method::GET, "services")
                .query(&[("select", "*"), ("order", "category.asc")]),
        )
        .await?;
        Ok(rows.into_iter().map(Service::from).collect())
    }

    async fn create_service(&self, input: &ServiceInput) -> BackendResult<Service> {
        input.validate().map_err(BackendError::Invalid)?;
        let rows: Vec<ServiceRow> = Self::fetch(
            self.table(Method::POST, "services")
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&json!({
                    "name": input.name.trim(),
                    "description": input.description,
                    "duration_minutes": input.duration_minutes,
                    "price": input.price.as_column(),
                    "category": input.category,
                    "is_active": true,
                })),
        )
        .await?;
        let service = Service::from(single(rows, "service")?);
        tracing::info!(service_id = service.id, name = %service.name, "service created");
        Ok(service)
    }

    async fn update_service(&self, id: i64, patch: &ServicePatch) -> BackendResult<Service> {
        patch.validate().map_err(BackendError::Invalid)?;

        let mut updates = Map::new();
        if let Some(name) = &patch.name {
            updates.insert("name".into(), json!(name.trim()));
        }
        if let Some(description) = &patch.description {
            updates.insert("description".into(), json!(description));
        }
        if let Some(duration) = patch.duration_minutes {
            updates.insert("duration_minutes".into(), json!(duration));
        }
        if let Some(price) = patch.price {
            updates.insert("price".into(), json!(price.as_column()));
        }
        if let Some(category) = &patch.category {
            updates.insert("category".into(), json!(category));
        }
        if let Some(active) = patch.is_active {
            updates.insert("is_active".into(), json!(active));
        }

        let rows: Vec<ServiceRow> = Self::fetch(
            self.table(Method::PATCH, "services")
                .header("Prefer", RETURN_REPRESENTATION)
                .query(&[("id", format!("eq.{id}"))])
                .json(&Value::Object(updates)),
        )
        .await?;
        rows.into_iter()
            .next()
            .map(Service::from)
            .ok_or_else(|| BackendError::NotFound(format!("service {id}")))
    }

    async fn deactivate_service(&self, id: i64) -> BackendResult<()> {
        let rows: Vec<IdRow> = Self::fetch(
            self.table(Method::PATCH, "services")
                .header("Prefer", RETURN_REPRESENTATION)
                .query(&[("id", format!("eq.{id}"))])
                .json(&json!({ "is_active": false })),
        )
        .await?;
        if rows.is_empty() {
            return Err(BackendError::NotFound(format!("service {id}")));
        }
        tracing::info!(service_id = id, "service deactivated");
        Ok(())
    }

    async fn all_professionals(&self) -> BackendResult<Vec<Professional>> {
        let rows: Vec<ProfessionalRow> = Self::fetch(
            self.table(Method::GET, "professionals")
                .query(&[("select", PROFESSIONAL_SELECT), ("order", "name.asc")]),
        )
        .await?;
        Ok(rows.into_iter().map(Professional::from).collect())
    }

    async fn create_professional(&self, input: &ProfessionalInput) -> BackendResult<Professional> {
        if input.name.trim().is_empty() {
            return Err(BackendError::Invalid("name is required".to_string()));
        }
        let rows: Vec<ProfessionalRow> = Self::fetch(
            self.table(Method::POST, "professionals")
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&json!({
                    "name": input.name.trim(),
                    "specialty": input.specialty,
                    "bio": input.bio,
                    "is_active": true,
                })),
        )
        .await?;
        let professional = Professional::from(single(rows, "professional")?);
        tracing::info!(professional_id = professional.id, "professional created");
        Ok(professional)
    }

    async fn update_professional(
        &self,
        id: i64,
        patch: &ProfessionalPatch,
    ) -> BackendResult<Professional> {
        let mut updates = Map::new();
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(BackendError::Invalid("name is required".to_string()));
            }
            updates.insert("name".into(), json!(name.trim()));
        }
        if let Some(specialty) = &patch.specialty {
            updates.insert("specialty".into(), json!(specialty));
        }
        if let Some(bio) = &patch.bio {
            updates.insert("bio".into(), json!(bio));
        }
        if let Some(active) = patch.is_active {
            updates.insert("is_active".into(), json!(active));
        }

        if !updates.is_empty() {
            Self::execute(
                self.table(Method::PATCH, "professionals")
                    .query(&[("id", format!("eq.{id}"))])
                    .json(&Value::Object(updates)),
            )
            .await?;
        }
        self.professional(id).await
    }

    async fn assign_service(&self, professional_id: i64, service_id: i64) -> BackendResult<()> {
        Self::execute(
            self.table(Method::POST, "professional_services")
                .header("Prefer", "resolution=ignore-duplicates,return=minimal")
                .json(&json!({
                    "professional_id": professional_id,
                    "service_id": service_id,
                })),
        )
        .await
    }

    async fn remove_service(&self, professional_id: i64, service_id: i64) -> BackendResult<()> {
        Self::execute(self.table(Method::DELETE, "professional_services").query(&[
            ("professional_id", format!("eq.{professional_id}")),
            ("service_id", format!("eq.{service_id}")),
        ]))
        .await
    }

    async fn working_hours(&self, professional_id: i64) -> BackendResult<Vec<WorkingHours>> {
        let rows: Vec<WorkingHoursRow> = Self::fetch(self.table(Method::GET, "working_hours").query(&[
            ("select", "*".to_string()),
            ("professional_id", format!("eq.{professional_id}")),
            ("order", "day_of_week.asc".to_string()),
        ]))
        .await?;
        Ok(rows.into_iter().map(WorkingHours::from).collect())
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
        if let (Some(start), Some(end)) = (patch.start_time, patch.end_time) {
            if start >= end {
                return Err(BackendError::Invalid(
                    "working hours must start before they end".to_string(),
                ));
            }
        }

        let rows: Vec<WorkingHoursRow> = Self::fetch(
            self.table(Method::PATCH, "working_hours")
                .header("Prefer", RETURN_REPRESENTATION)
                .query(&[
                    ("id", format!("eq.{id}")),
                    ("professional_id", format!("eq.{professional_id}")),
                ])
                .json(patch),
        )
        .await?;
        let day = rows.into_iter().next().map(WorkingHours::from).ok_or_else(|| {
            BackendError::NotFound(format!("working hours {id} of professional {professional_id}"))
        })?;
        tracing::info!(professional_id, day_of_week = day.day_of_week, "working hours updated");
        Ok(day)
    }

    async fn dashboard_stats(&self, today: NaiveDate) -> BackendResult<DashboardStats> {
        let month_start = today.with_day(1).unwrap_or(today);

        let today_bookings = self
            .count("bookings", &[("booking_date", format!("eq.{today}"))])
            .await?;
        let pending_bookings = self
            .count("bookings", &[("status", format!("eq.{}", BookingStatus::Pending.as_str()))])
            .await?;
        let completed: Vec<PriceRow> = Self::fetch(self.table(Method::GET, "bookings_detailed").query(&[
            ("select", "service_price".to_string()),
            ("status", format!("eq.{}", BookingStatus::Completed.as_str())),
            ("booking_date", format!("gte.{month_start}")),
        ]))
        .await?;

        Ok(DashboardStats {
            today_bookings,
            pending_bookings,
            completed_this_month: completed.len() as i64,
            month_revenue: completed.iter().filter_map(|row| row.service_price).sum(),
        })
    }
}

#[async_trait]
impl IdentityService for RestBackend {
    async fn current_user(&self, token: &str) -> BackendResult<Option<User>> {
        match Self::fetch::<AuthUser>(self.auth(Method::GET, "user", token)).await {
            Ok(user) => Ok(Some(user.into())),
            Err(BackendError::Unauthorized) | Err(BackendError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        let resp: TokenResponse = Self::fetch(
            self.auth(Method::POST, "token", &self.api_key)
                .query(&[("grant_type", "password")])
                .json(&json!({ "email": email.trim(), "password": password })),
        )
        .await
        .map_err(|e| match e {
            // bad credentials come back as 400 invalid_grant
            BackendError::Invalid(_) => BackendError::Unauthorized,
            other => other,
        })?;

        Ok(AuthSession {
            token: resp.access_token,
            user: resp.user.into(),
            expires_at: Utc::now().naive_utc() + chrono::Duration::seconds(resp.expires_in),
        })
    }

    async fn sign_out(&self, token: &str) -> BackendResult<()> {
        match Self::execute(self.auth(Method::POST, "logout", token)).await {
            Ok(()) | Err(BackendError::Unauthorized) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
