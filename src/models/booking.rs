use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SeatId;

/// Ответ внешнего API на бронирование одного места.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub id: i64,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub bus: String,
    pub seat: SeatId,
    #[serde(default)]
    pub booking_time: Option<DateTime<Utc>>,
}
