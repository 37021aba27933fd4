use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::backend::BackendResult;
use crate::models::{Professional, Service};
use crate::state::AppState;

/// Catalog listing. A failed lookup still answers 200 with an empty list and
/// the error text, so the booking page can render its own message.
#[derive(Debug, Serialize)]
pub struct CatalogResponse<T> {
    pub items: Vec<T>,
    pub error: Option<String>,
}

impl<T> From<BackendResult<Vec<T>>> for CatalogResponse<T> {
    fn from(result: BackendResult<Vec<T>>) -> Self {
        match result {
            Ok(items) => Self { items, error: None },
            Err(e) => {
                tracing::warn!(error = %e, "catalog lookup failed");
                Self {
                    items: vec![],
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

// GET /api/services
pub async fn list_services(State(state): State<Arc<AppState>>) -> Json<CatalogResponse<Service>> {
    Json(state.catalog.list_services().await.into())
}

// GET /api/professionals
pub async fn list_professionals(
    State(state): State<Arc<AppState>>,
) -> Json<CatalogResponse<Professional>> {
    Json(state.catalog.list_professionals().await.into())
}
