//! Клиент внешнего REST API автобусов.
//!
//! `BusApi` - контракт, через который экран мест получает автобус и
//! бронирует места; `BusApiClient` - его реализация поверх reqwest.
//! Все сетевые вызовы идут через `CircuitBreaker` и ограничены таймаутом.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::{ApiConfig, CircuitBreakerConfig};
use crate::error::ApiError;
use crate::models::{AuthToken, BookingReceipt, Bus, BusDetail, BusId, NewBus, SeatId};
use crate::services::breaker::{CircuitBreaker, CircuitState};

/// Внешний сервис автобусов и бронирований.
pub trait BusApi: Send + Sync {
    /// Автобус и все его места. Идемпотентно, можно повторять.
    fn fetch_bus_detail(
        &self,
        bus_id: BusId,
    ) -> impl Future<Output = Result<BusDetail, ApiError>> + Send;

    /// Бронирует одно место. Не идемпотентно: один вызов на место.
    fn submit_booking(
        &self,
        seat_id: SeatId,
        token: &AuthToken,
    ) -> impl Future<Output = Result<BookingReceipt, ApiError>> + Send;
}

#[derive(Debug, Serialize)]
struct BookingRequest {
    seat_id: SeatId,
}

// DRF отдаёт ошибки либо как {"error": ...}, либо как {"detail": ...}
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
}

#[derive(Clone)]
pub struct BusApiClient {
    base_url: String,
    http_client: reqwest::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl BusApiClient {
    pub fn from_config(api: &ApiConfig, breaker: &CircuitBreakerConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: api.base_url.trim_end_matches('/').to_string(),
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::new(
                breaker.failure_threshold,
                Duration::from_secs(breaker.timeout_seconds),
            )),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Выполняет запрос через Circuit Breaker. Сбоем считаются только
    /// сетевые ошибки и 5xx: отказ вида "место занято" сервис не ломает.
    async fn execute_with_circuit_breaker<F, T>(&self, operation: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if !self.circuit_breaker.can_execute() {
            warn!("Circuit breaker is OPEN - blocking bus API request");
            return Err(ApiError::CircuitOpen);
        }

        let result = operation.await;
        match &result {
            Err(e) if e.is_outage() => {
                error!("Bus API request failed: {}", e);
                self.circuit_breaker.record_failure();
            }
            _ => self.circuit_breaker.record_success(),
        }
        result
    }

    /// Список всех автобусов (`GET /buses/`).
    pub async fn list_buses(&self) -> Result<Vec<Bus>, ApiError> {
        let operation = async {
            let response = self.http_client.get(self.url("buses/")).send().await?;
            decode(response).await
        };
        self.execute_with_circuit_breaker(operation).await
    }

    /// Создаёт автобус (`POST /buses/`). Форма должна быть уже провалидирована.
    pub async fn create_bus(&self, bus: &NewBus) -> Result<Bus, ApiError> {
        info!("Creating bus {} ({} -> {})", bus.bus_number, bus.origin, bus.destination);

        let operation = async {
            let response = self
                .http_client
                .post(self.url("buses/"))
                .json(bus)
                .send()
                .await?;
            decode(response).await
        };
        self.execute_with_circuit_breaker(operation).await
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }
}

impl BusApi for BusApiClient {
    async fn fetch_bus_detail(&self, bus_id: BusId) -> Result<BusDetail, ApiError> {
        let operation = async {
            let response = self
                .http_client
                .get(self.url(&format!("buses/{}/", bus_id)))
                .send()
                .await?;
            decode(response).await
        };
        self.execute_with_circuit_breaker(operation).await
    }

    async fn submit_booking(&self, seat_id: SeatId, token: &AuthToken) -> Result<BookingReceipt, ApiError> {
        info!("Submitting booking for seat {}", seat_id);

        let operation = async {
            let response = self
                .http_client
                .post(self.url("booking/"))
                .header(reqwest::header::AUTHORIZATION, token.header_value())
                .json(&BookingRequest { seat_id })
                .send()
                .await?;
            decode(response).await
        };
        self.execute_with_circuit_breaker(operation).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.or(b.detail))
        .unwrap_or(body);

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}
