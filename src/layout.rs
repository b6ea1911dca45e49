//! Раскладка салона автобуса.
//!
//! Из плоского списка мест строится двусторонняя схема: ряды слева и
//! справа от прохода. Форма салона (мест в ряду, число рядов) зависит
//! только от максимального номера места, а места раскладываются по
//! позиции после сортировки, а не по числовому значению номера: пропуски
//! в нумерации не дают пустых ячеек.

use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::models::Seat;

/// Максимальный номер места для компактного салона 2+2.
pub const COMPACT_MAX_SEAT: u32 = 30;
/// Максимальный номер места для стандартного салона 2+3.
pub const STANDARD_MAX_SEAT: u32 = 45;

/// Тип салона.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// 2 + 2
    Compact,
    /// 2 + 3
    Standard,
    /// 3 + 3
    Luxury,
}

impl LayoutKind {
    pub fn for_max_seat(max_seat_number: u32) -> Self {
        if max_seat_number <= COMPACT_MAX_SEAT {
            LayoutKind::Compact
        } else if max_seat_number <= STANDARD_MAX_SEAT {
            LayoutKind::Standard
        } else {
            LayoutKind::Luxury
        }
    }

    pub const fn seats_per_row(self) -> usize {
        self.left_count() + self.right_count()
    }

    pub const fn left_count(self) -> usize {
        match self {
            LayoutKind::Compact | LayoutKind::Standard => 2,
            LayoutKind::Luxury => 3,
        }
    }

    pub const fn right_count(self) -> usize {
        match self {
            LayoutKind::Compact => 2,
            LayoutKind::Standard | LayoutKind::Luxury => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            LayoutKind::Compact => "Compact (2+2)",
            LayoutKind::Standard => "Standard (2+3)",
            LayoutKind::Luxury => "Luxury (3+3)",
        }
    }
}

/// Производный профиль вместимости, нигде не хранится.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityProfile {
    pub max_seat_number: u32,
    pub kind: LayoutKind,
    pub seats_per_row: usize,
    pub row_count: usize,
    pub left_count: usize,
    pub right_count: usize,
}

/// Считает профиль по номерам мест.
///
/// `None` для пустого списка (и для списка, где ни один номер не
/// разбирается как число): вызывающий показывает "мест нет".
pub fn compute_capacity_profile(seats: &[Seat]) -> Option<CapacityProfile> {
    let max_seat_number = seats.iter().filter_map(Seat::number).max()?;
    let kind = LayoutKind::for_max_seat(max_seat_number);
    let seats_per_row = kind.seats_per_row();

    Some(CapacityProfile {
        max_seat_number,
        kind,
        seats_per_row,
        row_count: (max_seat_number as usize).div_ceil(seats_per_row),
        left_count: kind.left_count(),
        right_count: kind.right_count(),
    })
}

/// Ряды слева и справа от прохода, выровненные по индексу.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeatRows {
    pub left: Vec<Vec<Seat>>,
    pub right: Vec<Vec<Seat>>,
}

impl SeatRows {
    pub fn iter_seats(&self) -> impl Iterator<Item = &Seat> {
        self.left
            .iter()
            .zip(&self.right)
            .flat_map(|(left, right)| left.iter().chain(right))
    }
}

// Нечисловые номера уходят в конец, sort_by_key стабилен
fn sort_key(seat: &Seat) -> (bool, u32) {
    match seat.number() {
        Some(n) => (false, n),
        None => (true, 0),
    }
}

/// Раскладывает места по рядам.
///
/// Каждый ряд - `seats_per_row` соседних мест после сортировки по номеру:
/// первые `left_count` идут влево, остальные вправо. Короткий последний
/// ряд через проход не перетекает. Хвост добивается пустыми рядами до
/// `row_count`, но всего рядов не больше, чем мест: профиль считается по
/// максимальному номеру, и один огромный номер не должен раздувать схему.
/// Если мест больше, чем `row_count * seats_per_row` (дубли номеров),
/// добавляются ряды, ни одно место не теряется.
pub fn build_rows(seats: &[Seat], profile: &CapacityProfile) -> SeatRows {
    let mut sorted: Vec<&Seat> = seats.iter().collect();
    sorted.sort_by_key(|seat| sort_key(seat));

    let mut rows = SeatRows::default();
    for chunk in sorted.chunks(profile.seats_per_row) {
        let (left, right) = chunk.split_at(chunk.len().min(profile.left_count));
        rows.left.push(left.iter().map(|seat| (*seat).clone()).collect());
        rows.right.push(right.iter().map(|seat| (*seat).clone()).collect());
    }

    let padded_rows = profile.row_count.min(seats.len());
    while rows.left.len() < padded_rows {
        rows.left.push(Vec::new());
        rows.right.push(Vec::new());
    }

    rows
}

/// Хеш набора мест: меняется при любом изменении id, номера или статуса.
pub fn fingerprint(seats: &[Seat]) -> u64 {
    let mut hasher = DefaultHasher::new();
    seats.hash(&mut hasher);
    hasher.finish()
}

/// Готовая схема салона.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatMap {
    pub profile: CapacityProfile,
    pub rows: SeatRows,
    #[serde(skip)]
    fingerprint: u64,
}

impl SeatMap {
    pub fn build(seats: &[Seat]) -> Option<Self> {
        let profile = compute_capacity_profile(seats)?;
        let rows = build_rows(seats, &profile);
        Some(Self {
            profile,
            rows,
            fingerprint: fingerprint(seats),
        })
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

/// Мемоизация схемы: пересчёт только когда поменялся набор мест,
/// переключение выбора схему не трогает.
#[derive(Debug, Default)]
pub struct LayoutMemo {
    cached: Option<SeatMap>,
    builds: usize,
}

impl LayoutMemo {
    pub fn get_or_build(&mut self, seats: &[Seat]) -> Option<&SeatMap> {
        let current = fingerprint(seats);
        let stale = self
            .cached
            .as_ref()
            .map_or(true, |map| map.fingerprint != current);

        if stale {
            self.cached = SeatMap::build(seats);
            self.builds += 1;
        }

        self.cached.as_ref()
    }

    /// Сколько раз схема реально пересчитывалась.
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
