pub mod config;
pub mod controllers;
pub mod error;
pub mod layout;
pub mod middleware;
pub mod models;
pub mod selection;
pub mod services;

use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::bus_api::BusApiClient;
use crate::services::in_flight::InFlightSeats;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub bus_api: BusApiClient,
    /// Места, бронь которых сейчас отправляется (общая для всех запросов).
    pub in_flight: Arc<InFlightSeats>,
}

impl AppState {
    pub fn new(config: config::Config) -> Result<Arc<Self>, error::ApiError> {
        let bus_api = BusApiClient::from_config(&config.api, &config.circuit_breaker)?;
        Ok(Arc::new(Self {
            config,
            bus_api,
            in_flight: InFlightSeats::new(),
        }))
    }
}

async fn health(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
        "bus_api": state.bus_api.circuit_state(),
        "bookings_in_flight": state.in_flight.len(),
    }))
}

/// Главный роутер: `/`, `/health` и всё API под `/api`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Bus Booking API v1.0" }))
        .route("/health", get(health))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
