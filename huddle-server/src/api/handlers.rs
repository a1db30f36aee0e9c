use crate::app::AppState;
use crate::room::RoomLookupError;
use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use huddle_core::{HealthReport, RoomCredentials, RoomId, RoomKey};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub room_key: String,
}

/// `POST /api/rooms/create`
pub async fn create_room(State(state): State<AppState>) -> Json<RoomCredentials> {
    Json(state.room_manager.create_room())
}

/// `GET /api/rooms/verify/{room_id}?room_key=..`
pub async fn verify_room(
    Path(room_id): Path<String>,
    Query(params): Query<VerifyParams>,
    State(state): State<AppState>,
) -> Result<Json<Value>, RoomLookupError> {
    state
        .room_manager
        .verify(&RoomId(room_id), &RoomKey(params.room_key))?;
    Ok(Json(json!({ "valid": true })))
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        active_rooms: state.room_manager.room_count(),
    })
}
