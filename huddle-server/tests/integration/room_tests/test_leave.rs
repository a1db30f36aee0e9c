use std::time::Duration;

use huddle_core::{ClientMessage, ServerMessage};
use huddle_server::RoomCommand;

use crate::integration::{create_test_room, init_tracing, join};

#[tokio::test]
async fn test_disconnect_notifies_remaining_participants() {
    init_tracing();

    let (cmd_tx, signaling, _room) = create_test_room();
    let a = join(&cmd_tx, "a", "Alice").await;
    let b = join(&cmd_tx, "b", "Bob").await;

    cmd_tx
        .send(RoomCommand::Disconnect {
            participant_id: a.clone(),
        })
        .await
        .unwrap();

    let left = signaling
        .wait_for(&b, "participant_left", 2000)
        .await
        .expect("Bob should hear that Alice left");
    assert!(matches!(left, ServerMessage::ParticipantLeft { participant_id } if participant_id == a));
}

#[tokio::test]
async fn test_room_stops_when_last_participant_leaves() {
    init_tracing();

    let (cmd_tx, _signaling, room) = create_test_room();
    let a = join(&cmd_tx, "a", "Alice").await;

    cmd_tx
        .send(RoomCommand::Signal {
            from: a,
            message: ClientMessage::Leave,
        })
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(2), room)
        .await
        .expect("Room should stop once empty")
        .expect("Room task panicked");
}

#[tokio::test]
async fn test_unknown_disconnect_is_harmless() {
    init_tracing();

    let (cmd_tx, signaling, room) = create_test_room();
    let a = join(&cmd_tx, "a", "Alice").await;

    cmd_tx
        .send(RoomCommand::Disconnect {
            participant_id: "nobody".into(),
        })
        .await
        .unwrap();
    let _ = join(&cmd_tx, "b", "Bob").await;
    signaling.wait_for(&a, "participant_joined", 2000).await;

    assert!(!room.is_finished());
    assert!(
        signaling
            .messages_for(&a)
            .await
            .iter()
            .all(|m| m.kind() != "participant_left")
    );
}
