use serde::{Deserialize, Serialize};
use std::fmt;

/// Непрозрачный идентификатор места во внешнем API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(pub i64);

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seat {
    pub id: SeatId,
    #[serde(deserialize_with = "super::de::string_or_number")]
    pub seat_number: String,
    #[serde(default)]
    pub is_booked: bool,
}

impl Seat {
    pub fn new(id: i64, seat_number: impl Into<String>, is_booked: bool) -> Self {
        Self {
            id: SeatId(id),
            seat_number: seat_number.into(),
            is_booked,
        }
    }

    /// Номер места как положительное число.
    ///
    /// Берутся ведущие цифры ("12A" -> 12); пустой, нулевой или нечисловой
    /// номер даёт `None`.
    pub fn number(&self) -> Option<u32> {
        let trimmed = self.seat_number.trim_start();
        let digits = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .map_or(trimmed, |end| &trimmed[..end]);
        digits.parse::<u32>().ok().filter(|n| *n > 0)
    }
}
