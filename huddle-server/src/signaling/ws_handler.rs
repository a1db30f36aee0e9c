use crate::app::AppState;
use crate::room::RoomCommand;
use crate::signaling::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, Participant, ParticipantId, RoomId, RoomKey};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const DEFAULT_NAME: &str = "Guest";

#[derive(Debug, Deserialize)]
pub struct JoinParams {
    pub key: Option<String>,
    pub name: Option<String>,
}

/// `GET /ws/{room_id}?key=..&name=..`. The key is checked before upgrading.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(params): Query<JoinParams>,
    State(state): State<AppState>,
) -> Response {
    let room_id = RoomId(room_id);
    let Some(key) = params.key else {
        return (StatusCode::BAD_REQUEST, "Missing room key").into_response();
    };

    let room_tx = match state.room_manager.verify(&room_id, &RoomKey(key)) {
        Ok(tx) => tx,
        Err(e) => {
            warn!("Rejected connection to room {}: {:?}", room_id, e);
            return e.into_response();
        }
    };

    let name = params
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());
    let participant = Participant::new(ParticipantId::generate(), name);

    ws.on_upgrade(move |socket| handle_socket(socket, participant, room_tx, state.signaling))
}

async fn handle_socket(
    socket: WebSocket,
    participant: Participant,
    room_tx: mpsc::Sender<RoomCommand>,
    service: SignalingService,
) {
    let participant_id = participant.id.clone();
    info!("New WebSocket connection: {}", participant_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_peer(participant_id.clone(), tx);

    if let Err(e) = room_tx.send(RoomCommand::Join { participant }).await {
        error!("Room died: {}", e);
        service.remove_peer(&participant_id);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let room_tx = room_tx.clone();
        let participant_id = participant_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::Leave) => {
                            info!("Participant {} sent leave", participant_id);
                            break;
                        }
                        Ok(message) => {
                            let cmd = RoomCommand::Signal {
                                from: participant_id.clone(),
                                message,
                            };
                            if let Err(e) = room_tx.send(cmd).await {
                                error!("Room died: {}", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid message from {}: {}", participant_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_peer(&participant_id);
    let _ = room_tx
        .send(RoomCommand::Disconnect {
            participant_id: participant_id.clone(),
        })
        .await;
    info!("WebSocket disconnected: {}", participant_id);
}
