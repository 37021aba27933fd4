use std::sync::Arc;

use crate::backend::{AdminService, Backend, BookingService, CatalogService, IdentityService};
use crate::config::AppConfig;
use crate::services::sessions::WizardSessions;

pub struct AppState {
    pub config: AppConfig,
    pub catalog: Arc<dyn CatalogService>,
    pub bookings: Arc<dyn BookingService>,
    pub admin: Arc<dyn AdminService>,
    pub identity: Arc<dyn IdentityService>,
    pub sessions: Arc<WizardSessions>,
}

impl AppState {
    /// Wires every port to the same system of record.
    pub fn with_backend<B: Backend + 'static>(config: AppConfig, backend: Arc<B>) -> Self {
        let sessions = Arc::new(WizardSessions::new(
            config.hours.clone(),
            config.success_reset,
            config.wizard_idle_ttl,
        ));
        Self {
            catalog: backend.clone(),
            bookings: backend.clone(),
            admin: backend.clone(),
            identity: backend,
            sessions,
            config,
        }
    }
}
