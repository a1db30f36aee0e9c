use huddle_core::{ClientMessage, IceCandidate, ServerMessage, SessionDescription, StatusPatch};
use huddle_server::RoomCommand;

use crate::integration::{create_test_room, init_tracing, join};

#[tokio::test]
async fn test_offer_reaches_only_its_target() {
    init_tracing();

    let (cmd_tx, signaling, _room) = create_test_room();
    let a = join(&cmd_tx, "a", "Alice").await;
    let b = join(&cmd_tx, "b", "Bob").await;
    let c = join(&cmd_tx, "c", "Carol").await;

    cmd_tx
        .send(RoomCommand::Signal {
            from: a.clone(),
            message: ClientMessage::Offer {
                offer: SessionDescription::offer("v=0"),
                to: b.clone(),
            },
        })
        .await
        .unwrap();
    cmd_tx
        .send(RoomCommand::Signal {
            from: a.clone(),
            message: ClientMessage::IceCandidate {
                candidate: IceCandidate::new("candidate:1"),
                to: b.clone(),
            },
        })
        .await
        .unwrap();

    signaling
        .wait_for(&b, "ice_candidate", 2000)
        .await
        .expect("Bob should get the candidate");
    let offer = signaling
        .wait_for(&b, "offer", 0)
        .await
        .expect("Bob should get the offer");
    assert!(matches!(offer, ServerMessage::Offer { from, .. } if from == a));

    let to_b: Vec<_> = signaling
        .messages_for(&b)
        .await
        .into_iter()
        .map(|m| m.kind())
        .collect();
    assert_eq!(to_b, vec!["room_joined", "participant_joined", "offer", "ice_candidate"]);

    assert!(
        signaling
            .messages_for(&c)
            .await
            .iter()
            .all(|m| !matches!(m, ServerMessage::Offer { .. } | ServerMessage::IceCandidate { .. }))
    );
}

#[tokio::test]
async fn test_signal_to_absent_participant_is_dropped() {
    init_tracing();

    let (cmd_tx, signaling, _room) = create_test_room();
    let a = join(&cmd_tx, "a", "Alice").await;

    cmd_tx
        .send(RoomCommand::Signal {
            from: a.clone(),
            message: ClientMessage::Answer {
                answer: SessionDescription::answer("v=0"),
                to: "ghost".into(),
            },
        })
        .await
        .unwrap();
    let _ = join(&cmd_tx, "b", "Bob").await;
    signaling.wait_for(&a, "participant_joined", 2000).await;

    assert!(signaling.all().await.iter().all(|d| d.msg.kind() != "answer"));
}

#[tokio::test]
async fn test_status_update_is_merged_and_broadcast() {
    init_tracing();

    let (cmd_tx, signaling, _room) = create_test_room();
    let a = join(&cmd_tx, "a", "Alice").await;
    let b = join(&cmd_tx, "b", "Bob").await;

    cmd_tx
        .send(RoomCommand::Signal {
            from: b.clone(),
            message: ClientMessage::ParticipantUpdate {
                data: StatusPatch::muted(true),
            },
        })
        .await
        .unwrap();

    let update = signaling
        .wait_for(&a, "participant_updated", 2000)
        .await
        .expect("Alice should see Bob's update");
    let ServerMessage::ParticipantUpdated { participant } = update else {
        panic!("unexpected message {update:?}");
    };
    assert_eq!(participant.id, b);
    assert!(participant.is_muted);
    assert!(!participant.is_video_off);
    assert_eq!(participant.name, "Bob");
}
