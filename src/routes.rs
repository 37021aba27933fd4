use std::sync::Arc;

use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/services", get(handlers::catalog::list_services))
        .route("/api/professionals", get(handlers::catalog::list_professionals))
        .route("/api/calendar", get(handlers::calendar::month))
        .route("/api/slots", get(handlers::calendar::slots))
        .route("/api/availability", get(handlers::calendar::availability))
        .route("/api/wizard", post(handlers::wizard::create))
        .route(
            "/api/wizard/:id",
            get(handlers::wizard::get).delete(handlers::wizard::remove),
        )
        .route("/api/wizard/:id/events", post(handlers::wizard::dispatch))
        .route("/api/wizard/:id/submit", post(handlers::wizard::submit))
        .route("/api/auth/sign-in", post(handlers::auth::sign_in))
        .route("/api/auth/sign-out", post(handlers::auth::sign_out))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/admin/bookings", get(handlers::admin::list_bookings))
        .route(
            "/api/admin/bookings/:id/confirm",
            post(handlers::admin::confirm_booking),
        )
        .route(
            "/api/admin/bookings/:id/complete",
            post(handlers::admin::complete_booking),
        )
        .route(
            "/api/admin/bookings/:id/cancel",
            post(handlers::admin::cancel_booking),
        )
        .route(
            "/api/admin/services",
            get(handlers::admin::list_services).post(handlers::admin::create_service),
        )
        .route(
            "/api/admin/services/:id",
            patch(handlers::admin::update_service)
                .delete(handlers::admin::delete_service),
        )
        .route(
            "/api/admin/professionals",
            get(handlers::admin::list_professionals).post(handlers::admin::create_professional),
        )
        .route(
            "/api/admin/professionals/:id",
            patch(handlers::admin::update_professional),
        )
        .route(
            "/api/admin/professionals/:id/services/:service_id",
            put(handlers::admin::assign_service).delete(handlers::admin::remove_service),
        )
        .route(
            "/api/admin/professionals/:id/working-hours",
            get(handlers::admin::working_hours),
        )
        .route(
            "/api/admin/professionals/:id/working-hours/:hours_id",
            patch(handlers::admin::update_working_hours),
        )
        .route("/api/admin/stats", get(handlers::admin::stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
