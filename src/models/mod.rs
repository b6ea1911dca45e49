pub mod auth;
pub mod booking;
pub mod bus;
pub mod seat;

pub use auth::AuthToken;
pub use booking::BookingReceipt;
pub use bus::{Bus, BusDetail, BusId, NewBus};
pub use seat::{Seat, SeatId};

/// Помощники десериализации для полей, которые внешний API отдаёт
/// то строкой, то числом (DecimalField, CharField с номерами).
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Int(i64),
        Float(f64),
        Str(String),
    }

    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Loose::deserialize(deserializer)? {
            Loose::Int(n) => n.to_string(),
            Loose::Float(n) => n.to_string(),
            Loose::Str(s) => s,
        })
    }

    // "500.00", 500, 500.5 и null -> Option<f64>
    pub fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Loose>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Loose::Int(n)) => Ok(Some(n as f64)),
            Some(Loose::Float(n)) => Ok(Some(n)),
            Some(Loose::Str(s)) if s.trim().is_empty() => Ok(None),
            Some(Loose::Str(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
