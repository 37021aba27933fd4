use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use salon_booking::backend::rest::RestBackend;
use salon_booking::backend::sqlite::SqliteBackend;
use salon_booking::config::{AppConfig, BackendKind};
use salon_booking::db;
use salon_booking::models::user::ROLE_ADMIN;
use salon_booking::routes::build_router;
use salon_booking::state::AppState;

const SESSION_SWEEP_EVERY: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(hours = %config.hours.to_human_readable(), "opening hours");

    let state = match config.backend {
        BackendKind::Rest => {
            anyhow::ensure!(
                !config.backend_url.is_empty() && !config.backend_api_key.is_empty(),
                "BACKEND_URL and BACKEND_API_KEY must be set when BACKEND=rest"
            );
            tracing::info!("using hosted backend at {}", config.backend_url);
            let backend = RestBackend::new(
                &config.backend_url,
                &config.backend_api_key,
                config.backend_timeout,
            )?;
            AppState::with_backend(config.clone(), Arc::new(backend))
        }
        BackendKind::Sqlite => {
            tracing::info!("using sqlite backend at {}", config.database_url);
            let conn = db::init_db(&config.database_url)?;
            let backend = SqliteBackend::new(conn, config.hours.clone(), config.session_ttl);

            if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
                if backend.ensure_user(email, password, ROLE_ADMIN)? {
                    tracing::info!(%email, "seeded admin account");
                }
            }
            let expired = backend.expire_sessions()?;
            if expired > 0 {
                tracing::info!(expired, "removed expired sign-in sessions");
            }

            AppState::with_backend(config.clone(), Arc::new(backend))
        }
    };

    state.sessions.spawn_sweeper(SESSION_SWEEP_EVERY);

    let app = build_router(Arc::new(state));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
