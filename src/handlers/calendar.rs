use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{CalendarDay, ClockTime, OpeningHours, TimeSlot};
use crate::services::calendar::{month_grid, shift_month, time_slots};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Serialize)]
pub struct MonthRef {
    year: i32,
    month: u32,
}

#[derive(Serialize)]
pub struct CalendarResponse {
    year: i32,
    month: u32,
    days: Vec<Option<CalendarDay>>,
    previous: MonthRef,
    next: MonthRef,
}

// GET /api/calendar?year=&month=
pub async fn month(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<CalendarResponse>, AppError> {
    let today = chrono::Local::now().date_naive();
    let year = query.year.unwrap_or(today.year());
    let month = query.month.unwrap_or(today.month());
    if !(1..=12).contains(&month) {
        return Err(AppError::BadRequest(format!("invalid month: {month}")));
    }

    let days = month_grid(year, month, today, &state.config.hours)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let (py, pm) = shift_month(year, month, -1);
    let (ny, nm) = shift_month(year, month, 1);

    Ok(Json(CalendarResponse {
        year,
        month,
        days,
        previous: MonthRef { year: py, month: pm },
        next: MonthRef { year: ny, month: nm },
    }))
}

#[derive(Serialize)]
pub struct SlotsResponse {
    hours: OpeningHours,
    slots: Vec<TimeSlot>,
}

// GET /api/slots
pub async fn slots(State(state): State<Arc<AppState>>) -> Json<SlotsResponse> {
    let hours = state.config.hours.clone();
    let slots = time_slots(&hours)
        .into_iter()
        .map(|start| TimeSlot { start })
        .collect();
    Json(SlotsResponse { hours, slots })
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub professional_id: i64,
    pub date: NaiveDate,
    pub duration: u32,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    slots: Vec<ClockTime>,
}

// GET /api/availability?professional_id=&date=&duration=
pub async fn availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    if query.duration == 0 {
        return Err(AppError::BadRequest("duration must be positive".to_string()));
    }
    let slots = state
        .bookings
        .available_slots(query.professional_id, query.date, query.duration)
        .await?;
    Ok(Json(AvailabilityResponse { slots }))
}
