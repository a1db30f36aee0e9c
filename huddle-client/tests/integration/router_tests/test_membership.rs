use huddle_client::{Dispatch, SampleDevices, MediaConstraints, MediaDevices, TrackKind};
use huddle_core::{ConnectionStatus, Participant, ParticipantId, ServerMessage, StatusPatch};

use crate::integration::init_tracing;
use crate::utils::{Harness, LinkOp, LOCAL_ID};

#[tokio::test]
async fn test_snapshot_does_not_open_connections() {
    init_tracing();
    let mut h = Harness::new();

    assert_eq!(h.joined(&["user_a", "user_b"]).await, Dispatch::Applied);

    assert_eq!(h.router.directory().len(), 3);
    assert_eq!(h.router.local_id(), Some(&Harness::local_id()));
    assert!(h.router.peers().is_empty());
    assert!(h.signaling.all().is_empty(), "Newcomer must wait for offers");
}

#[tokio::test]
async fn test_every_newcomer_gets_one_offer() {
    init_tracing();
    let mut h = Harness::new();
    h.joined(&[]).await;

    assert_eq!(h.newcomer("user_a").await, Dispatch::Applied);
    assert_eq!(h.newcomer("user_b").await, Dispatch::Applied);
    assert_eq!(h.newcomer("user_a").await, Dispatch::Ignored);

    let a = ParticipantId::from("user_a");
    let b = ParticipantId::from("user_b");
    assert_eq!(h.router.peers().len(), 2);
    assert_eq!(h.signaling.offers_to(&a), 1);
    assert_eq!(h.signaling.offers_to(&b), 1);
    assert_eq!(h.links.created(), 2);
}

#[tokio::test]
async fn test_own_join_echo_is_ignored() {
    init_tracing();
    let mut h = Harness::new();
    h.joined(&[]).await;

    let echo = ServerMessage::ParticipantJoined {
        participant: Participant::new(Harness::local_id(), "Me"),
    };
    assert_eq!(h.server(echo).await, Dispatch::Ignored);
    assert!(h.router.peers().is_empty());
}

#[tokio::test]
async fn test_local_tracks_are_attached_to_new_connections() {
    init_tracing();
    let stream = SampleDevices.open(&MediaConstraints::default()).await.unwrap();
    let mut h = Harness::with_stream(stream.clone());
    h.joined(&[]).await;

    h.newcomer("user_a").await;

    let record = h.links.link(&ParticipantId::from("user_a")).unwrap();
    let ops = record.ops();
    assert_eq!(ops.len(), 3);
    for track in stream.tracks() {
        assert!(ops.contains(&LinkOp::AddTrack(track.id().to_string())));
    }
    assert_eq!(ops[2], LinkOp::CreateOffer { ice_restart: false });
}

#[tokio::test]
async fn test_leave_removes_connection_and_stream() {
    init_tracing();
    let mut h = Harness::new();
    h.joined(&[]).await;
    h.newcomer("user_a").await;

    let a = ParticipantId::from("user_a");
    h.server(ServerMessage::Answer {
        answer: huddle_core::SessionDescription::answer("remote-answer"),
        from: a.clone(),
    })
    .await;
    h.drain().await;

    let stream = h.router.peers().remote_stream(&a).unwrap();
    assert!(stream.has_kind(TrackKind::Video));
    assert_eq!(
        h.router.directory().get(&a).unwrap().connection_status,
        ConnectionStatus::Connected
    );

    let left = ServerMessage::ParticipantLeft {
        participant_id: a.clone(),
    };
    assert_eq!(h.server(left.clone()).await, Dispatch::Applied);

    assert!(!h.router.peers().contains(&a));
    assert!(h.router.peers().remote_stream(&a).is_none());
    assert!(!h.router.directory().contains(&a));
    assert!(h.links.link(&a).unwrap().is_closed());

    assert_eq!(h.server(left).await, Dispatch::Stale);
}

#[tokio::test]
async fn test_status_updates_apply_to_known_participants() {
    init_tracing();
    let mut h = Harness::new();
    h.joined(&["user_a"]).await;

    let mut muted = Participant::new(ParticipantId::from("user_a"), "Peer user_a");
    muted.apply(&StatusPatch::muted(true));
    assert_eq!(
        h.server(ServerMessage::ParticipantUpdated {
            participant: muted
        })
        .await,
        Dispatch::Applied
    );
    assert!(h.router.directory().get(&"user_a".into()).unwrap().is_muted);

    let stranger = Participant::new(ParticipantId::from("user_x"), "X");
    assert_eq!(
        h.server(ServerMessage::ParticipantUpdated {
            participant: stranger
        })
        .await,
        Dispatch::Stale
    );
    assert_eq!(h.router.directory().len(), 2);
}

#[tokio::test]
async fn test_unknown_message_is_ignored() {
    init_tracing();
    let mut h = Harness::new();
    h.joined(&["user_a"]).await;

    assert_eq!(h.server(ServerMessage::Unknown).await, Dispatch::Ignored);
    assert_eq!(h.router.directory().len(), 2);
}

#[tokio::test]
async fn test_remote_status_follows_the_link_not_the_relay() {
    init_tracing();
    let mut h = Harness::new();

    let mut early = Participant::new(ParticipantId::from("user_a"), "A");
    early.connection_status = ConnectionStatus::Connected;
    h.server(ServerMessage::RoomJoined {
        participants: vec![Participant::new(Harness::local_id(), "Me"), early],
        participant_id: Some(Harness::local_id()),
    })
    .await;

    let status = |h: &Harness, id: &str| {
        h.router
            .directory()
            .get(&ParticipantId::from(id))
            .unwrap()
            .connection_status
    };
    assert_eq!(status(&h, LOCAL_ID), ConnectionStatus::Connected);
    assert_eq!(status(&h, "user_a"), ConnectionStatus::Connecting);

    let mut newcomer = Participant::new(ParticipantId::from("user_b"), "B");
    newcomer.connection_status = ConnectionStatus::Connected;
    assert_eq!(
        h.server(ServerMessage::ParticipantJoined {
            participant: newcomer
        })
        .await,
        Dispatch::Applied
    );
    h.drain().await;
    assert_eq!(status(&h, "user_b"), ConnectionStatus::Connecting);

    h.server(ServerMessage::Answer {
        answer: huddle_core::SessionDescription::answer("remote-answer"),
        from: ParticipantId::from("user_b"),
    })
    .await;
    h.drain().await;
    assert_eq!(status(&h, "user_b"), ConnectionStatus::Connected);
}
