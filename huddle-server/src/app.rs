use crate::api::{create_room, health, verify_room};
use crate::room::RoomManager;
use crate::signaling::{SignalingService, ws_handler};
use axum::Router;
use axum::routing::{get, post};
use huddle_core::utils::{HEALTH_PATH, ROOMS_CREATE_PATH};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub signaling: SignalingService,
    pub room_manager: RoomManager,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        let signaling = SignalingService::new();
        let room_manager = RoomManager::new(Arc::new(signaling.clone()));
        Self {
            signaling,
            room_manager,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(ROOMS_CREATE_PATH, post(create_room))
        .route("/api/rooms/verify/{room_id}", get(verify_room))
        .route(HEALTH_PATH, get(health))
        .route("/ws/{room_id}", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the room service and relay on an already bound listener.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    info!("Signaling server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
