//! Места, бронирование которых уже отправлено во внешний API.
//!
//! Общий для всех запросов реестр: пока бронь места в полёте, повторная
//! отправка того же места отклоняется. Запись снимается, когда
//! `InFlightClaim` уничтожается, при любом исходе (в том числе если
//! обработчик запроса был отменён).

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::models::{BusId, SeatId};

#[derive(Debug, Default)]
pub struct InFlightSeats {
    seats: Mutex<HashSet<(BusId, SeatId)>>,
}

impl InFlightSeats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<(BusId, SeatId)>> {
        self.seats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Занимает все места сразу или ни одного: `None`, если хоть одно уже
    /// в полёте.
    pub fn claim(self: &Arc<Self>, bus_id: BusId, seat_ids: &[SeatId]) -> Option<InFlightClaim> {
        let mut seats = self.lock();
        if seat_ids.iter().any(|id| seats.contains(&(bus_id, *id))) {
            return None;
        }

        let keys: Vec<(BusId, SeatId)> = seat_ids.iter().map(|id| (bus_id, *id)).collect();
        seats.extend(keys.iter().copied());
        debug!("Claimed {} seat(s) of bus {} for booking", keys.len(), bus_id);

        Some(InFlightClaim {
            registry: Arc::clone(self),
            keys,
        })
    }

    pub fn contains_any(&self, bus_id: BusId, seat_ids: &[SeatId]) -> bool {
        let seats = self.lock();
        seat_ids.iter().any(|id| seats.contains(&(bus_id, *id)))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Занятые места; освобождаются при drop.
#[derive(Debug)]
pub struct InFlightClaim {
    registry: Arc<InFlightSeats>,
    keys: Vec<(BusId, SeatId)>,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        let mut seats = self.registry.lock();
        for key in &self.keys {
            seats.remove(key);
        }
    }
}
