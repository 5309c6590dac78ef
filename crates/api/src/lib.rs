//! `api` crate: HTTP layer of the carewatch service.
//!
//! Exposes:
//!   POST   /api/device/{location,heart-rate,temperature,fall}
//!   GET    /api/device/:dependent_id/config
//!   POST   /api/line/webhook
//!   /api/liff/*    caregiver forms opened inside LINE
//!   /api/admin/*   back-office endpoints (bearer token)
//!   GET    /health

pub mod alerts;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use db::DbPool;
use monitor::Assessor;
use notify::Notifier;

pub use config::{LiffUrls, ServerConfig};
pub use error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub notifier: Arc<dyn Notifier>,
    pub assessor: Arc<Assessor>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, notifier: Arc<dyn Notifier>, assessor: Assessor, config: ServerConfig) -> Self {
        Self {
            pool,
            notifier,
            assessor: Arc::new(assessor),
            config: Arc::new(config),
        }
    }
}

/// Build the full route table.
pub fn router(state: AppState) -> Router {
    use handlers::{borrows, dashboard, dependents, device, equipment, line, liff, rescues, users};

    let device_routes = Router::new()
        .route("/location", post(device::location))
        .route("/heart-rate", post(device::heart_rate))
        .route("/temperature", post(device::temperature))
        .route("/fall", post(device::fall))
        .route("/:dependent_id/config", get(device::config));

    let liff_routes = Router::new()
        .route("/register", post(liff::register))
        .route("/users/:line_user_id/profile", get(liff::profile))
        .route("/users/:line_user_id/borrows", get(liff::list_borrows))
        .route("/dependents", post(liff::add_dependent))
        .route("/dependents/:id/safe-zone", put(liff::set_safe_zone))
        .route("/dependents/:id/thresholds", put(liff::set_thresholds))
        .route("/borrows", post(liff::create_borrow))
        .route("/borrows/:id/return", post(liff::request_return));

    let admin_routes = Router::new()
        .route("/dashboard", get(dashboard::summary))
        .route("/users", get(users::list))
        .route("/users/:id", get(users::get))
        .route("/users/:id/status", put(users::update_status))
        .route("/equipment", get(equipment::list).post(equipment::create))
        .route(
            "/equipment/:id",
            get(equipment::get).put(equipment::update).delete(equipment::delete),
        )
        .route("/borrows", get(borrows::list))
        .route("/borrows/:id", get(borrows::get))
        .route("/borrows/:id/approve", post(borrows::approve))
        .route("/borrows/:id/reject", post(borrows::reject))
        .route("/borrows/:id/confirm-return", post(borrows::confirm_return))
        .route("/borrows/:id/fail-return", post(borrows::fail_return))
        .route("/dependents", get(dependents::list))
        .route("/dependents/:id/locations", get(dependents::locations))
        .route("/dependents/:id/vitals", get(dependents::vitals))
        .route("/rescues", get(rescues::list))
        .route("/rescues/:id/close", post(rescues::close))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/device", device_routes)
        .route("/api/line/webhook", post(line::webhook))
        .nest("/api/liff", liff_routes)
        .nest("/api/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod router_tests;
