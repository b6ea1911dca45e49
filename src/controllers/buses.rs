use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

use crate::models::NewBus;
use crate::services::catalog::{popular_routes, BusFilter, BusListing};
use crate::AppState;

use super::upstream_status;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/buses", get(list_buses).post(create_bus))
}

#[derive(Debug, Serialize)]
struct BusListResponse {
    buses: Vec<BusListing>,
    count: usize,
    popular_routes: Vec<String>,
}

// GET /api/buses?from=&to=&max_price=
async fn list_buses(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<BusFilter>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let buses = state.bus_api.list_buses().await.map_err(|e| {
        tracing::error!("list_buses failed: {}", e);
        (upstream_status(&e), "Не удалось получить список автобусов".to_string())
    })?;

    // популярные маршруты считаются по всем автобусам, а не по отфильтрованным
    let popular_routes = popular_routes(&buses);
    let listings: Vec<BusListing> = filter
        .apply(&buses)
        .into_iter()
        .map(BusListing::from_bus)
        .collect();

    Ok(Json(BusListResponse {
        count: listings.len(),
        buses: listings,
        popular_routes,
    }))
}

// POST /api/buses
async fn create_bus(
    State(state): State<Arc<AppState>>,
    Json(form): Json<NewBus>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(errors) = form.validate() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, errors.to_string()));
    }

    match state.bus_api.create_bus(&form).await {
        Ok(bus) => Ok((StatusCode::CREATED, Json(bus))),
        Err(e) => {
            tracing::error!("create_bus failed: {}", e);
            Err((upstream_status(&e), format!("Не удалось добавить автобус: {}", e)))
        }
    }
}
