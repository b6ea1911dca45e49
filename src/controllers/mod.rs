pub mod buses;
pub mod seats;

use axum::{http::StatusCode, Router};
use std::sync::Arc;

use crate::error::ApiError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(buses::routes())
        .merge(seats::routes())
}

/// HTTP-статус для ошибки внешнего API.
pub(crate) fn upstream_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::CircuitOpen => StatusCode::SERVICE_UNAVAILABLE,
        ApiError::Http(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        ApiError::Http(_) => StatusCode::BAD_GATEWAY,
        ApiError::Status { status, .. } if *status >= 500 => StatusCode::BAD_GATEWAY,
        ApiError::Status { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
    }
}
