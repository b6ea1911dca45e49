use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::Seat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(pub i64);

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Поле `orgin` во внешнем API написано с опечаткой, сохраняем её на проводе
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: BusId,
    pub bus_name: String,
    pub bus_number: String,
    #[serde(rename = "orgin")]
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub features: String,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub reach_time: Option<NaiveTime>,
    #[serde(default)]
    pub no_of_seats: u32,
    #[serde(default, deserialize_with = "super::de::optional_decimal")]
    pub price: Option<f64>,
}

/// Автобус вместе с его местами (`GET /buses/{id}/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusDetail {
    #[serde(flatten)]
    pub bus: Bus,
    #[serde(default)]
    pub seats: Vec<Seat>,
}

/// Форма добавления автобуса.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewBus {
    #[validate(length(min = 1, max = 100))]
    pub bus_name: String,
    #[validate(length(min = 1, max = 100))]
    pub bus_number: String,
    #[serde(rename = "orgin")]
    #[validate(length(min = 1, max = 100))]
    pub origin: String,
    #[validate(length(min = 1, max = 100))]
    pub destination: String,
    #[validate(length(min = 1))]
    pub features: String,
    pub start_time: NaiveTime,
    pub reach_time: NaiveTime,
    #[validate(range(min = 1))]
    pub no_of_seats: u32,
    // DecimalField(max_digits=8, decimal_places=2)
    #[validate(range(min = 0.0, max = 999_999.99))]
    pub price: f64,
}
