//! Состояние экрана выбора мест одного автобуса.
//!
//! Контроллер владеет загруженными местами, мемоизированной схемой салона
//! и выбором пользователя. Схема и выбор считаются чистыми функциями из
//! `layout` и `selection`; контроллер только хранит результат и общается
//! с внешним API через `BusApi`.
//!
//! Политика обновления: после `refresh` выбор сохраняется для мест, которые
//! по-прежнему есть в автобусе и свободны; остальные тихо снимаются.
//!
//! Бронирование отправляет по запросу на место параллельно. Исходы
//! учитываются по каждому месту: подтверждённые места помечаются
//! забронированными и уходят из выбора, неудачные остаются выбранными,
//! после любой неудачи места перечитываются из API.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{FailedSeat, ViewError};
use crate::layout::{LayoutMemo, SeatMap};
use crate::models::{AuthToken, BookingReceipt, Bus, BusId, Seat, SeatId};
use crate::selection::{compute_summary, seat_state, SeatCounts, SeatState, SelectionSet, Summary};
use crate::services::bus_api::BusApi;
use crate::services::in_flight::InFlightSeats;

/// Навигация (редирект) - побочный эффект, ответа не ждём.
pub trait Navigator: Send + Sync {
    fn redirect_to(&self, path: &str);
}

/// Результат полностью успешного бронирования.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingReport {
    pub receipts: Vec<BookingReceipt>,
    pub summary: Summary,
}

pub struct SeatViewController<A, N> {
    api: A,
    navigator: N,
    login_path: String,
    bus_id: Option<BusId>,
    bus: Option<Bus>,
    seats: Vec<Seat>,
    selection: SelectionSet,
    layout: LayoutMemo,
    in_flight: Arc<InFlightSeats>,
}

impl<A: BusApi, N: Navigator> SeatViewController<A, N> {
    pub fn new(api: A, navigator: N, login_path: impl Into<String>) -> Self {
        Self {
            api,
            navigator,
            login_path: login_path.into(),
            bus_id: None,
            bus: None,
            seats: Vec::new(),
            selection: SelectionSet::new(),
            layout: LayoutMemo::default(),
            in_flight: InFlightSeats::new(),
        }
    }

    /// Общий реестр отправленных броней: экраны с одним реестром не
    /// бронируют одно место дважды одновременно.
    pub fn with_in_flight(mut self, in_flight: Arc<InFlightSeats>) -> Self {
        self.in_flight = in_flight;
        self
    }

    /// Вход на экран: загружает автобус с местами, выбор пустой.
    /// При ошибке экран остаётся пустым.
    pub async fn load(&mut self, bus_id: BusId) -> Result<(), ViewError> {
        self.bus_id = Some(bus_id);
        self.selection.clear();

        match self.api.fetch_bus_detail(bus_id).await {
            Ok(detail) => {
                info!("Loaded bus {} with {} seats", bus_id, detail.seats.len());
                self.bus = Some(detail.bus);
                self.seats = detail.seats;
                Ok(())
            }
            Err(e) => {
                error!("Failed to load bus {}: {}", bus_id, e);
                self.bus = None;
                self.seats.clear();
                self.layout.invalidate();
                Err(ViewError::FetchFailed(e))
            }
        }
    }

    /// Ручное обновление. Места заменяются целиком, выбор сверяется с
    /// новыми местами. При ошибке остаётся прежнее состояние.
    pub async fn refresh(&mut self) -> Result<(), ViewError> {
        let bus_id = self.bus_id.ok_or(ViewError::NotLoaded)?;

        let detail = self.api.fetch_bus_detail(bus_id).await.map_err(|e| {
            warn!("Failed to refresh bus {}: {}", bus_id, e);
            ViewError::FetchFailed(e)
        })?;

        let before = self.selection.len();
        self.selection = self.selection.retain_available(&detail.seats);
        if self.selection.len() != before {
            info!(
                "Refresh dropped {} selected seat(s) that are no longer available",
                before - self.selection.len()
            );
        }

        self.bus = Some(detail.bus);
        self.seats = detail.seats;
        Ok(())
    }

    pub fn bus(&self) -> Option<&Bus> {
        self.bus.as_ref()
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Отправляется ли сейчас бронь какого-то из выбранных мест
    /// (кнопку надо заблокировать).
    pub fn is_submitting(&self) -> bool {
        self.bus_id
            .is_some_and(|bus_id| self.in_flight.contains_any(bus_id, self.selection.ids()))
    }

    /// Схема салона; `None`, если у автобуса нет мест.
    pub fn seat_map(&mut self) -> Option<&SeatMap> {
        self.layout.get_or_build(&self.seats)
    }

    /// Сколько раз схема реально пересчитывалась.
    pub fn layout_builds(&self) -> usize {
        self.layout.builds()
    }

    pub fn seat_state(&self, seat_id: SeatId) -> Option<SeatState> {
        self.find_seat(seat_id).map(|seat| seat_state(seat, &self.selection))
    }

    pub fn counts(&self) -> SeatCounts {
        SeatCounts::tally(&self.seats, &self.selection)
    }

    pub fn summary(&self) -> Summary {
        compute_summary(
            &self.selection,
            &self.seats,
            self.bus.as_ref().and_then(|bus| bus.price),
        )
    }

    fn find_seat(&self, seat_id: SeatId) -> Option<&Seat> {
        self.seats.iter().find(|seat| seat.id == seat_id)
    }

    /// Переключает место. При отказе выбор не меняется.
    pub fn toggle(&mut self, seat_id: SeatId) -> Result<(), ViewError> {
        let seat = self.find_seat(seat_id).ok_or(ViewError::UnknownSeat(seat_id))?;
        self.selection = self.selection.toggle(seat)?;
        Ok(())
    }

    /// Восстанавливает выбор, присланный клиентом (см. `SelectionSet::replay`).
    pub fn restore_selection(&mut self, ids: &[SeatId]) {
        self.selection = SelectionSet::replay(ids, &self.seats);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Бронирует все выбранные места.
    ///
    /// Без токена запрос не отправляется: пользователь уходит на страницу
    /// входа. Каждое место - отдельный запрос, все запросы идут
    /// параллельно. Если бронь какого-то из мест уже в полёте (с этого или
    /// другого экрана с тем же реестром), ничего не отправляется.
    pub async fn book(&mut self, token: Option<&AuthToken>) -> Result<BookingReport, ViewError> {
        let Some(token) = token else {
            warn!("Booking attempted without auth token, redirecting to {}", self.login_path);
            self.navigator.redirect_to(&self.login_path);
            return Err(ViewError::Unauthenticated);
        };

        if self.selection.is_empty() {
            return Err(ViewError::EmptySelection);
        }
        let bus_id = self.bus_id.ok_or(ViewError::NotLoaded)?;

        let summary = self.summary();
        let requested: Vec<SeatId> = self.selection.ids().to_vec();
        let Some(claim) = self.in_flight.claim(bus_id, &requested) else {
            warn!("Booking for bus {} already in progress for {:?}", bus_id, requested);
            return Err(ViewError::SubmissionInProgress);
        };
        info!("Booking {} seat(s): {:?}", requested.len(), requested);

        let api = &self.api;
        let outcomes = join_all(requested.iter().map(|&seat_id| async move {
            (seat_id, api.submit_booking(seat_id, token).await)
        }))
        .await;
        drop(claim);

        let mut receipts = Vec::new();
        let mut failed = Vec::new();
        for (seat_id, outcome) in outcomes {
            match outcome {
                Ok(receipt) => receipts.push(receipt),
                Err(e) => {
                    warn!("Booking for seat {} failed: {}", seat_id, e);
                    failed.push(FailedSeat {
                        seat_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let confirmed: Vec<SeatId> = requested
            .iter()
            .copied()
            .filter(|id| failed.iter().all(|f| f.seat_id != *id))
            .collect();
        for seat in self.seats.iter_mut().filter(|seat| confirmed.contains(&seat.id)) {
            seat.is_booked = true;
        }
        self.selection = self.selection.without(&confirmed);

        if failed.is_empty() {
            info!("Successfully booked {} seat(s)", receipts.len());
            return Ok(BookingReport { receipts, summary });
        }

        error!(
            "Booking failed for {} of {} seat(s), reconciling seats",
            failed.len(),
            requested.len()
        );
        // Если перечитать не удалось, остаётся локально применённое состояние
        if let Err(e) = self.refresh().await {
            warn!("Reconcile after failed booking did not succeed: {}", e);
        }

        Err(ViewError::BookingFailed {
            booked: receipts,
            failed,
        })
    }
}
