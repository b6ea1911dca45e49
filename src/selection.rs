//! Выбор мест пользователем.
//!
//! `SelectionSet` меняется только через `toggle`, который возвращает новое
//! состояние и ничего не трогает при отказе.

use serde::Serialize;
use thiserror::Error;

use crate::models::{Seat, SeatId};

/// Сколько мест можно выбрать за один раз.
pub const MAX_SELECTED_SEATS: usize = 6;

/// Почему место не удалось выбрать. Состояние при этом не меняется.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRejected {
    #[error("Seat is already booked")]
    AlreadyBooked,
    #[error("You can select maximum 6 seats at a time")]
    LimitExceeded,
}

/// Упорядоченный набор выбранных мест без повторов, не больше
/// `MAX_SELECTED_SEATS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectionSet {
    ids: Vec<SeatId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Восстанавливает выбор из списка id, присланного клиентом, прогоняя
    /// каждый id через `toggle`. Повторы, неизвестные id и отклонённые
    /// места отбрасываются; лимит применяется к уже принятым местам, так
    /// что отброшенный id не занимает место в наборе.
    pub fn replay(ids: &[SeatId], seats: &[Seat]) -> Self {
        let mut selection = Self::new();
        for id in ids {
            if selection.len() == MAX_SELECTED_SEATS {
                break;
            }
            if selection.contains(*id) {
                continue;
            }
            let Some(seat) = seats.iter().find(|seat| seat.id == *id) else {
                continue;
            };
            if let Ok(next) = selection.toggle(seat) {
                selection = next;
            }
        }
        selection
    }

    pub fn ids(&self) -> &[SeatId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: SeatId) -> bool {
        self.ids.contains(&id)
    }

    /// Переключает место.
    ///
    /// Забронированное место - `AlreadyBooked`; уже выбранное снимается
    /// (всегда можно); при полном наборе - `LimitExceeded`; иначе место
    /// добавляется в конец.
    pub fn toggle(&self, seat: &Seat) -> Result<Self, SelectionRejected> {
        if seat.is_booked {
            return Err(SelectionRejected::AlreadyBooked);
        }

        if self.contains(seat.id) {
            let ids = self.ids.iter().copied().filter(|id| *id != seat.id).collect();
            return Ok(Self { ids });
        }

        if self.ids.len() >= MAX_SELECTED_SEATS {
            return Err(SelectionRejected::LimitExceeded);
        }

        let mut ids = self.ids.clone();
        ids.push(seat.id);
        Ok(Self { ids })
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Оставляет только места, которые есть в `seats` и не забронированы.
    /// Порядок сохраняется.
    pub fn retain_available(&self, seats: &[Seat]) -> Self {
        let ids = self
            .ids
            .iter()
            .copied()
            .filter(|id| seats.iter().any(|seat| seat.id == *id && !seat.is_booked))
            .collect();
        Self { ids }
    }

    /// Убирает перечисленные места (например, успешно забронированные).
    pub fn without(&self, removed: &[SeatId]) -> Self {
        let ids = self
            .ids
            .iter()
            .copied()
            .filter(|id| !removed.contains(id))
            .collect();
        Self { ids }
    }
}

/// Итог выбора для панели бронирования.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub total_price: f64,
    pub seat_numbers: Vec<String>,
}

/// Считает итог. Неизвестная цена считается нулём; id, которых уже нет в
/// `seats`, пропускаются в `seat_numbers`.
pub fn compute_summary(selection: &SelectionSet, seats: &[Seat], price_per_seat: Option<f64>) -> Summary {
    let count = selection.len();
    let seat_numbers = selection
        .ids()
        .iter()
        .filter_map(|id| seats.iter().find(|seat| seat.id == *id))
        .map(|seat| seat.seat_number.clone())
        .collect();

    Summary {
        count,
        total_price: count as f64 * price_per_seat.unwrap_or(0.0),
        seat_numbers,
    }
}

/// Отображаемое состояние места; нигде не хранится.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatState {
    Available,
    Selected,
    Booked,
}

pub fn seat_state(seat: &Seat, selection: &SelectionSet) -> SeatState {
    if seat.is_booked {
        SeatState::Booked
    } else if selection.contains(seat.id) {
        SeatState::Selected
    } else {
        SeatState::Available
    }
}

/// Счётчики для легенды схемы.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeatCounts {
    pub available: usize,
    pub booked: usize,
    pub selected: usize,
}

impl SeatCounts {
    pub fn tally(seats: &[Seat], selection: &SelectionSet) -> Self {
        let booked = seats.iter().filter(|seat| seat.is_booked).count();
        Self {
            available: seats.len() - booked,
            booked,
            selected: selection.len(),
        }
    }
}
