use thiserror::Error;

use crate::models::{BookingReceipt, SeatId};
use crate::selection::SelectionRejected;

/// Ошибки обращения к внешнему API автобусов.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Circuit breaker разомкнут, запрос не отправлялся.
    #[error("Circuit breaker is open - bus API temporarily unavailable")]
    CircuitOpen,
    #[error("Bus API request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// API ответил, но не 2xx. `message` берётся из поля `error`/`detail` тела.
    #[error("Bus API responded with {status}: {message}")]
    Status { status: u16, message: String },
}

impl ApiError {
    /// Сбой самого сервиса (сеть, 5xx), а не отказ по бизнес-правилу.
    pub fn is_outage(&self) -> bool {
        match self {
            ApiError::CircuitOpen | ApiError::Http(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
        }
    }
}

/// Место, которое не удалось забронировать.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FailedSeat {
    pub seat_id: SeatId,
    pub reason: String,
}

/// Ошибки экрана выбора мест. Ни одна не фатальна: худший случай -
/// устаревший экран, который лечится обновлением.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Error in fetching seats: {0}")]
    FetchFailed(#[source] ApiError),
    #[error("Please login to book seats")]
    Unauthenticated,
    #[error("Please select at least one seat")]
    EmptySelection,
    #[error("Booking is already being submitted")]
    SubmissionInProgress,
    #[error("Seat {0} does not belong to this bus")]
    UnknownSeat(SeatId),
    #[error("No bus is loaded")]
    NotLoaded,
    #[error(transparent)]
    Rejected(#[from] SelectionRejected),
    /// Часть (или все) запросов на бронирование не прошли.
    #[error("Booking failed for {} of {} seat(s)", .failed.len(), .failed.len() + .booked.len())]
    BookingFailed {
        booked: Vec<BookingReceipt>,
        failed: Vec<FailedSeat>,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be set in production")]
    Missing { name: &'static str },
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}
