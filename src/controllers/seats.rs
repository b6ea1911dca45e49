use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ViewError;
use crate::layout::CapacityProfile;
use crate::middleware::MaybeAuthToken;
use crate::models::{Bus, BusId, Seat, SeatId};
use crate::selection::{seat_state, SeatCounts, SeatState, SelectionRejected, SelectionSet, Summary};
use crate::services::bus_api::{BusApi, BusApiClient};
use crate::services::seat_view::{Navigator, SeatViewController};
use crate::AppState;

use super::upstream_status;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/buses/{bus_id}/seat-map", get(get_seat_map))
        .route("/buses/{bus_id}/selection/toggle", post(toggle_seat))
        .route("/buses/{bus_id}/summary", post(get_summary))
        .route("/buses/{bus_id}/bookings", post(book_seats))
}

/* ---------- helpers ---------- */

/// Запоминает редирект, чтобы вернуть его клиенту в теле ответа.
#[derive(Debug, Default)]
pub struct RedirectCapture {
    path: Mutex<Option<String>>,
}

impl RedirectCapture {
    pub fn take(&self) -> Option<String> {
        self.path.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl Navigator for RedirectCapture {
    fn redirect_to(&self, path: &str) {
        *self.path.lock().unwrap_or_else(PoisonError::into_inner) = Some(path.to_string());
    }
}

type HttpSeatView = SeatViewController<BusApiClient, RedirectCapture>;

fn new_view(state: &AppState) -> HttpSeatView {
    SeatViewController::new(
        state.bus_api.clone(),
        RedirectCapture::default(),
        state.config.booking.login_path.clone(),
    )
    .with_in_flight(state.in_flight.clone())
}

// Загружает автобус и восстанавливает выбор клиента
async fn open_view(state: &AppState, bus_id: i64, selection: &[SeatId]) -> Result<HttpSeatView, Response> {
    let mut view = new_view(state);
    view.load(BusId(bus_id))
        .await
        .map_err(|e| view_error_response(e, None))?;
    view.restore_selection(selection);
    Ok(view)
}

fn view_error_response(err: ViewError, redirect: Option<String>) -> Response {
    let status = match &err {
        ViewError::FetchFailed(e) => upstream_status(e),
        ViewError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ViewError::EmptySelection | ViewError::NotLoaded | ViewError::Rejected(_) => StatusCode::BAD_REQUEST,
        ViewError::UnknownSeat(_) => StatusCode::NOT_FOUND,
        ViewError::SubmissionInProgress | ViewError::BookingFailed { .. } => StatusCode::CONFLICT,
    };

    let message = err.to_string();
    let body = match err {
        ViewError::BookingFailed { booked, failed } => json!({
            "error": message,
            "booked": booked,
            "failed": failed,
        }),
        _ => match redirect {
            Some(path) => json!({ "error": message, "redirect": path }),
            None => json!({ "error": message }),
        },
    };

    (status, Json(body)).into_response()
}

#[derive(Debug, Serialize)]
struct SeatCell {
    id: SeatId,
    seat_number: String,
    state: SeatState,
}

fn cells(rows: &[Vec<Seat>], selection: &SelectionSet) -> Vec<Vec<SeatCell>> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|seat| SeatCell {
                    id: seat.id,
                    seat_number: seat.seat_number.clone(),
                    state: seat_state(seat, selection),
                })
                .collect()
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct SeatMapResponse {
    bus: Option<Bus>,
    /// `true`, если у автобуса нет мест ("No Seats Available").
    empty: bool,
    layout: Option<&'static str>,
    profile: Option<CapacityProfile>,
    left_rows: Vec<Vec<SeatCell>>,
    right_rows: Vec<Vec<SeatCell>>,
    counts: SeatCounts,
    selection: SelectionSet,
    summary: Summary,
}

fn seat_map_response<A: BusApi, N: Navigator>(view: &mut SeatViewController<A, N>) -> SeatMapResponse {
    let selection = view.selection().clone();
    let counts = view.counts();
    let summary = view.summary();
    let bus = view.bus().cloned();

    let (profile, left_rows, right_rows) = match view.seat_map() {
        Some(map) => (
            Some(map.profile),
            cells(&map.rows.left, &selection),
            cells(&map.rows.right, &selection),
        ),
        None => (None, Vec::new(), Vec::new()),
    };

    SeatMapResponse {
        bus,
        empty: profile.is_none(),
        layout: profile.map(|p| p.kind.label()),
        profile,
        left_rows,
        right_rows,
        counts,
        selection,
        summary,
    }
}

// Повторы и лимит разбирает replay при сверке с местами
fn parse_selected(raw: &str) -> Vec<SeatId> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .map(SeatId)
        .collect()
}

/* ---------- SEAT MAP ---------- */

#[derive(Debug, Deserialize)]
struct SeatMapQuery {
    /// Выбранные места через запятую: `?selected=3,7`
    #[serde(default)]
    selected: String,
}

// GET /api/buses/{bus_id}/seat-map
async fn get_seat_map(
    State(state): State<Arc<AppState>>,
    Path(bus_id): Path<i64>,
    Query(query): Query<SeatMapQuery>,
) -> Response {
    let selection = parse_selected(&query.selected);
    match open_view(&state, bus_id, &selection).await {
        Ok(mut view) => Json(seat_map_response(&mut view)).into_response(),
        Err(response) => response,
    }
}

/* ---------- SELECTION ---------- */

#[derive(Debug, Deserialize)]
struct ToggleRequest {
    #[serde(default)]
    selection: Vec<SeatId>,
    seat_id: SeatId,
}

#[derive(Debug, Serialize)]
struct ToggleResponse {
    selection: SelectionSet,
    rejected: Option<SelectionRejected>,
    message: Option<String>,
    summary: Summary,
}

// POST /api/buses/{bus_id}/selection/toggle
async fn toggle_seat(
    State(state): State<Arc<AppState>>,
    Path(bus_id): Path<i64>,
    Json(req): Json<ToggleRequest>,
) -> Response {
    let mut view = match open_view(&state, bus_id, &req.selection).await {
        Ok(view) => view,
        Err(response) => return response,
    };

    // отказ выбора - не ошибка запроса, а уведомление пользователю
    let rejected = match view.toggle(req.seat_id) {
        Ok(()) => None,
        Err(ViewError::Rejected(reason)) => Some(reason),
        Err(e) => return view_error_response(e, None),
    };

    Json(ToggleResponse {
        selection: view.selection().clone(),
        message: rejected.map(|r| r.to_string()),
        rejected,
        summary: view.summary(),
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
struct SelectionRequest {
    #[serde(default)]
    selection: Vec<SeatId>,
}

// POST /api/buses/{bus_id}/summary
async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(bus_id): Path<i64>,
    Json(req): Json<SelectionRequest>,
) -> Response {
    match open_view(&state, bus_id, &req.selection).await {
        Ok(view) => Json(view.summary()).into_response(),
        Err(response) => response,
    }
}

/* ---------- BOOKINGS ---------- */

// POST /api/buses/{bus_id}/bookings
async fn book_seats(
    State(state): State<Arc<AppState>>,
    Path(bus_id): Path<i64>,
    token: MaybeAuthToken,
    Json(req): Json<SelectionRequest>,
) -> Response {
    // без токена не делаем ни одного запроса во внешний API
    if token.token().is_none() {
        let mut view = new_view(&state);
        let err = match view.book(None).await {
            Ok(_) => ViewError::Unauthenticated,
            Err(e) => e,
        };
        let redirect = view.navigator().take();
        return view_error_response(err, redirect);
    }

    let mut view = match open_view(&state, bus_id, &req.selection).await {
        Ok(view) => view,
        Err(response) => return response,
    };

    match view.book(token.token()).await {
        Ok(report) => (
            StatusCode::CREATED,
            Json(json!({
                "message": format!("Successfully booked {} seat(s)!", report.receipts.len()),
                "receipts": report.receipts,
                "summary": report.summary,
            })),
        )
            .into_response(),
        Err(e) => {
            let redirect = view.navigator().take();
            view_error_response(e, redirect)
        }
    }
}
