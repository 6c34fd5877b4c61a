//! HTTP API module for the firmware notifier
//!
//! A thin adapter over the subscription flows, the device catalog and the
//! metrics registry.
//!
//! # Endpoints
//! - `GET /health` - health check
//! - `GET /metrics` - Prometheus metrics
//! - `GET /stats` - subscription counts
//! - `GET /devices` - device catalog grouped by family
//! - `POST /subscribe` - subscribe an email address to a device
//! - `GET /unsubscribe?token=` - unsubscribe confirmation page
//! - `POST /unsubscribe` - consume an unsubscribe token

mod error;
pub mod handlers;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub use state::AppState;

/// Creates the main Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/stats", get(handlers::stats_handler))
        .route("/devices", get(handlers::devices_handler))
        .route("/subscribe", post(handlers::subscribe_handler))
        .route(
            "/unsubscribe",
            get(handlers::unsubscribe_page).post(handlers::unsubscribe_handler),
        )
        .with_state(state)
}
