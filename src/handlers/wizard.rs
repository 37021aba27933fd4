use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ClockTime, Field};
use crate::services::wizard::{WizardEvent, WizardSnapshot};
use crate::state::AppState;

#[derive(Serialize)]
pub struct WizardResponse {
    id: Uuid,
    #[serde(flatten)]
    snapshot: WizardSnapshot,
}

/// What a browser may send. Selections arrive as ids and are resolved
/// against the live catalog before reaching the wizard.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardAction {
    SelectService { service_id: i64 },
    SelectProfessional { professional_id: i64 },
    SelectDate { date: NaiveDate },
    SelectTime { time: ClockTime },
    Next,
    Back,
    UpdateField { field: Field, value: String },
    Retry,
    Reset,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("wizard session {id}"))
}

async fn resolve(state: &AppState, action: WizardAction) -> Result<WizardEvent, AppError> {
    let event = match action {
        WizardAction::SelectService { service_id } => {
            let service = state
                .catalog
                .list_services()
                .await?
                .into_iter()
                .find(|s| s.id == service_id)
                .ok_or_else(|| AppError::BadRequest(format!("unknown service {service_id}")))?;
            WizardEvent::SelectService { service }
        }
        WizardAction::SelectProfessional { professional_id } => {
            let professional = state
                .catalog
                .list_professionals()
                .await?
                .into_iter()
                .find(|p| p.id == professional_id)
                .ok_or_else(|| {
                    AppError::BadRequest(format!("unknown professional {professional_id}"))
                })?;
            WizardEvent::SelectProfessional { professional }
        }
        WizardAction::SelectDate { date } => WizardEvent::SelectDate { date },
        WizardAction::SelectTime { time } => WizardEvent::SelectTime { time },
        WizardAction::Next => WizardEvent::Next,
        WizardAction::Back => WizardEvent::Back,
        WizardAction::UpdateField { field, value } => WizardEvent::UpdateField { field, value },
        WizardAction::Retry => WizardEvent::Retry,
        WizardAction::Reset => WizardEvent::Reset,
    };
    Ok(event)
}

// POST /api/wizard
pub async fn create(State(state): State<Arc<AppState>>) -> (StatusCode, Json<WizardResponse>) {
    let (id, snapshot) = state.sessions.create();
    (StatusCode::CREATED, Json(WizardResponse { id, snapshot }))
}

// GET /api/wizard/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardResponse>, AppError> {
    let snapshot = state.sessions.snapshot(id).ok_or_else(|| session_not_found(id))?;
    Ok(Json(WizardResponse { id, snapshot }))
}

// POST /api/wizard/:id/events
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(action): Json<WizardAction>,
) -> Result<Json<WizardResponse>, AppError> {
    if state.sessions.snapshot(id).is_none() {
        return Err(session_not_found(id));
    }
    let event = resolve(&state, action).await?;
    let snapshot = state
        .sessions
        .dispatch(id, today(), event)
        .ok_or_else(|| session_not_found(id))?;
    Ok(Json(WizardResponse { id, snapshot }))
}

// POST /api/wizard/:id/submit
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardResponse>, AppError> {
    let snapshot = state
        .sessions
        .submit(id, today(), state.bookings.clone())
        .await
        .ok_or_else(|| session_not_found(id))?;
    Ok(Json(WizardResponse { id, snapshot }))
}

// DELETE /api/wizard/:id
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(id))
    }
}
