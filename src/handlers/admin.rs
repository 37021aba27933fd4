use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::auth::authenticate;
use crate::models::{
    Booking, BookingFilter, DashboardStats, Professional, ProfessionalInput, ProfessionalPatch,
    Service, ServiceInput, ServicePatch, StatusChange, User, WorkingHours, WorkingHoursPatch,
};
use crate::state::AppState;

/// 401 without a valid session, 403 for signed-in users who are not admins.
async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let user = authenticate(state, headers).await?;
    if !user.is_admin() {
        tracing::warn!(user = %user.email, "non-admin tried an admin route");
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

// GET /api/admin/bookings?date=&status=&professional_id=
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<Vec<Booking>>, AppError> {
    require_admin(&state, &headers).await?;
    Ok(Json(state.admin.list_bookings(&filter).await?))
}

async fn change_status(
    state: &AppState,
    headers: &HeaderMap,
    id: i64,
    change: StatusChange,
) -> Result<Json<Booking>, AppError> {
    let user = require_admin(state, headers).await?;
    let booking = state.admin.update_booking_status(id, &change).await?;
    tracing::info!(booking_id = id, status = booking.status.as_str(), by = %user.email, "booking updated");
    Ok(Json(booking))
}

// POST /api/admin/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    change_status(&state, &headers, id, StatusChange::Confirmed).await
}

// POST /api/admin/bookings/:id/complete
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    change_status(&state, &headers, id, StatusChange::Completed).await
}

#[derive(Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: String,
}

// POST /api/admin/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<CancelRequest>,
) -> Result<Json<Booking>, AppError> {
    change_status(&state, &headers, id, StatusChange::Cancelled { reason: body.reason }).await
}

// GET /api/admin/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Service>>, AppError> {
    require_admin(&state, &headers).await?;
    Ok(Json(state.admin.all_services().await?))
}

// POST /api/admin/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(input): Json<ServiceInput>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    require_admin(&state, &headers).await?;
    let service = state.admin.create_service(&input).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

// PATCH /api/admin/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(patch): Json<ServicePatch>,
) -> Result<Json<Service>, AppError> {
    require_admin(&state, &headers).await?;
    Ok(Json(state.admin.update_service(id, &patch).await?))
}

// DELETE /api/admin/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&state, &headers).await?;
    state.admin.deactivate_service(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/admin/professionals
pub async fn list_professionals(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Professional>>, AppError> {
    require_admin(&state, &headers).await?;
    Ok(Json(state.admin.all_professionals().await?))
}

// POST /api/admin/professionals
pub async fn create_professional(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(input): Json<ProfessionalInput>,
) -> Result<(StatusCode, Json<Professional>), AppError> {
    require_admin(&state, &headers).await?;
    let professional = state.admin.create_professional(&input).await?;
    Ok((StatusCode::CREATED, Json(professional)))
}

// PATCH /api/admin/professionals/:id
pub async fn update_professional(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(patch): Json<ProfessionalPatch>,
) -> Result<Json<Professional>, AppError> {
    require_admin(&state, &headers).await?;
    Ok(Json(state.admin.update_professional(id, &patch).await?))
}

// PUT /api/admin/professionals/:id/services/:service_id
pub async fn assign_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, service_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    require_admin(&state, &headers).await?;
    state.admin.assign_service(id, service_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// DELETE /api/admin/professionals/:id/services/:service_id
pub async fn remove_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, service_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    require_admin(&state, &headers).await?;
    state.admin.remove_service(id, service_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/admin/professionals/:id/working-hours
pub async fn working_hours(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Vec<WorkingHours>>, AppError> {
    require_admin(&state, &headers).await?;
    Ok(Json(state.admin.working_hours(id).await?))
}

// PATCH /api/admin/professionals/:id/working-hours/:hours_id
pub async fn update_working_hours(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, hours_id)): Path<(i64, i64)>,
    Json(patch): Json<WorkingHoursPatch>,
) -> Result<Json<WorkingHours>, AppError> {
    let user = require_admin(&state, &headers).await?;
    let day = state.admin.update_working_hours(id, hours_id, &patch).await?;
    tracing::info!(professional_id = id, day_of_week = day.day_of_week, by = %user.email, "schedule changed");
    Ok(Json(day))
}

// GET /api/admin/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardStats>, AppError> {
    require_admin(&state, &headers).await?;
    let today = chrono::Local::now().date_naive();
    Ok(Json(state.admin.dashboard_stats(today).await?))
}
