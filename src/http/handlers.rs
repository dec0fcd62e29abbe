use std::collections::HashMap;
use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header::USER_AGENT};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::model::{Booking, Room, RoomId, Span, User};
use crate::timeutil::{format_iso, now_ms, parse_iso};

use super::AppState;
use super::error::ApiError;

fn peer_ip(addr: &SocketAddr) -> String {
    addr.ip().to_string()
}

fn agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
}

// ── Health ───────────────────────────────────────────────

pub async fn health(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    state
        .requests
        .record("/health", peer_ip(&addr), agent(&headers))
        .await;
    Json(json!({ "status": "ok", "timestamp": format_iso(now_ms()) }))
}

pub async fn ping(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    state
        .requests
        .record("/ping", peer_ip(&addr), agent(&headers))
        .await;
    Json(json!({ "message": "pong", "timestamp": format_iso(now_ms()) }))
}

// ── Rooms ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateRoomRequest {
    name: Option<String>,
    capacity: Option<u32>,
    location: Option<String>,
}

pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<Room>> {
    Json(state.engine.list_rooms().await)
}

pub async fn create_room(
    State(state): State<AppState>,
    Json(body): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    let name = body.name.ok_or(ApiError::MissingField("name"))?;
    let capacity = body.capacity.ok_or(ApiError::MissingField("capacity"))?;
    let room = state
        .engine
        .create_room(&name, capacity, body.location)
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn delete_room(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.engine.delete_room(id).await? {
        Ok(Json(json!({ "message": "Room deleted successfully" })))
    } else {
        Err(ApiError::NotFound("Room not found".into()))
    }
}

// ── Users ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateUserRequest {
    name: Option<String>,
    email: Option<String>,
}

pub async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.engine.list_users())
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let name = body.name.ok_or(ApiError::MissingField("name"))?;
    let email = body.email.ok_or(ApiError::MissingField("email"))?;
    let user = state.engine.create_user(&name, &email).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.engine.delete_user(id).await? {
        Ok(Json(json!({ "message": "User deleted successfully" })))
    } else {
        Err(ApiError::NotFound("User not found".into()))
    }
}

// ── Bookings ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    user_name: Option<String>,
    room_id: Option<RoomId>,
    date: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: u64,
    pub user_name: String,
    pub room_id: RoomId,
    pub room_name: String,
    pub start_time: String,
    pub end_time: String,
}

impl AppState {
    async fn booking_response(&self, booking: &Booking) -> BookingResponse {
        let user_name = self
            .engine
            .get_user(&booking.user_id)
            .map(|u| u.name)
            .unwrap_or_default();
        let room_name = self
            .engine
            .get_room_info(booking.room_id)
            .await
            .map(|r| r.name)
            .unwrap_or_default();
        BookingResponse {
            id: booking.id,
            user_name,
            room_id: booking.room_id,
            room_name,
            start_time: format_iso(booking.span.start),
            end_time: format_iso(booking.span.end),
        }
    }

    async fn booking_responses(&self, bookings: &[Booking]) -> Vec<BookingResponse> {
        let mut out = Vec::with_capacity(bookings.len());
        for booking in bookings {
            out.push(self.booking_response(booking).await);
        }
        out
    }
}

fn parse_datetime(field: &'static str, value: &str) -> Result<i64, ApiError> {
    parse_iso(value).ok_or_else(|| ApiError::BadDatetime(format!("{field}: {value}")))
}

pub async fn create_booking(
    State(state): State<AppState>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let user_name = body.user_name.ok_or(ApiError::MissingField("user_name"))?;
    let room_id = body.room_id.ok_or(ApiError::MissingField("room_id"))?;
    let date = body.date.ok_or(ApiError::MissingField("date"))?;
    let start_time = body.start_time.ok_or(ApiError::MissingField("start_time"))?;
    let end_time = body.end_time.ok_or(ApiError::MissingField("end_time"))?;

    // The date field is required alongside the full datetimes but is not
    // cross-checked against them (kept for wire compatibility).
    NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| ApiError::BadDatetime(format!("date: {date}")))?;

    // Boundary resolves user_name -> User; the engine only sees ids.
    let user = state
        .engine
        .find_user_by_name(&user_name)
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let start = parse_datetime("start_time", &start_time)?;
    let end = parse_datetime("end_time", &end_time)?;
    if start >= end {
        return Err(ApiError::Validation(
            "start_time must be before end_time".into(),
        ));
    }

    let booking = state
        .engine
        .create_booking(room_id, user.id, Span::new(start, end))
        .await?;
    let response = state.booking_response(&booking).await;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = if let Some(user_name) = params.get("user_name") {
        match state.engine.find_user_by_name(user_name) {
            Some(user) => state.engine.bookings_by_user(user.id).await,
            // Unknown name matches nothing — a filter miss, not an error.
            None => Vec::new(),
        }
    } else if let Some(room_id) = params.get("room_id") {
        let room_id: RoomId = room_id
            .parse()
            .map_err(|_| ApiError::Validation(format!("invalid room_id: {room_id}")))?;
        state.engine.bookings_by_room(room_id).await
    } else if let Some(date) = params.get("date") {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ApiError::BadDatetime(format!("date: {date}")))?;
        state.engine.bookings_on(date).await
    } else {
        state.engine.all_bookings().await
    };

    Ok(Json(state.booking_responses(&bookings).await))
}

pub async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_name = params
        .get("user_name")
        .ok_or(ApiError::MissingField("user_name"))?;

    let booking = state.engine.require_booking(id).await?;
    let owner = state.engine.get_user(&booking.user_id);
    if owner.map(|u| u.name) != Some(user_name.clone()) {
        return Err(ApiError::PermissionDenied);
    }

    if state.engine.cancel_booking(id).await? {
        Ok(Json(json!({ "message": "Booking deleted successfully" })))
    } else {
        Err(ApiError::NotFound("Booking not found".into()))
    }
}

// ── Admin ────────────────────────────────────────────────

pub async fn admin_list_requests(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<super::reqlog::RequestRecord>>, ApiError> {
    let limit = match params.get("limit") {
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::Validation(format!("invalid limit: {raw}")))?,
        None => 100,
    };
    Ok(Json(state.requests.all(limit).await))
}

pub async fn admin_clear_requests(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.requests.clear().await;
    Json(json!({ "message": "Request log cleared" }))
}
