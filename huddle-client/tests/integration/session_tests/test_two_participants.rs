use huddle_client::RoomSession;
use huddle_core::ConnectionStatus;
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{
    CountingDevices, MockLinkFactory, client_config, spawn_test_server, wait_for_view,
};

const VIEW_TIMEOUT_MS: u64 = 5000;

#[tokio::test]
async fn test_two_sessions_connect_and_part() {
    init_tracing();
    let (addr, _state) = spawn_test_server().await;

    let links_a = MockLinkFactory::new();
    let alice = RoomSession::with_parts(
        client_config(addr, "Alice"),
        Arc::new(CountingDevices::default()),
        Arc::new(links_a.clone()),
    );
    let bob = RoomSession::with_parts(
        client_config(addr, "Bob"),
        Arc::new(CountingDevices::default()),
        Arc::new(MockLinkFactory::new()),
    );

    let mut alice_view = alice.subscribe();
    let mut bob_view = bob.subscribe();

    let info = alice.create_room().await.unwrap();
    assert!(
        wait_for_view(&mut alice_view, VIEW_TIMEOUT_MS, |v| {
            v.is_connected && v.local_participant_id.is_some()
        })
        .await
    );

    bob.join_room(info.room_id.clone(), info.room_key.clone())
        .await
        .unwrap();

    let connected = |v: &huddle_client::SessionView| {
        v.participants.len() == 2
            && v.remote_streams.len() == 1
            && v.participants
                .iter()
                .all(|p| p.connection_status == ConnectionStatus::Connected)
    };
    assert!(wait_for_view(&mut alice_view, VIEW_TIMEOUT_MS, connected).await);
    assert!(wait_for_view(&mut bob_view, VIEW_TIMEOUT_MS, connected).await);

    let bob_id = bob.view().local_participant_id.unwrap();
    let alice_id = alice.view().local_participant_id.unwrap();
    assert!(alice.view().remote_stream(&bob_id).is_some());
    assert!(bob.view().remote_stream(&alice_id).is_some());
    assert!(alice.view().participant(&alice_id).unwrap().is_host);

    assert!(bob.toggle_audio().await);
    assert!(
        wait_for_view(&mut alice_view, VIEW_TIMEOUT_MS, |v| {
            v.participant(&bob_id).is_some_and(|p| p.is_muted)
        })
        .await
    );

    bob.leave_room().await;
    assert!(
        wait_for_view(&mut alice_view, VIEW_TIMEOUT_MS, |v| {
            v.participants.len() == 1 && v.remote_streams.is_empty()
        })
        .await
    );
    assert!(links_a.link(&bob_id).unwrap().is_closed());
    assert!(!bob.is_active().await);
    assert!(bob.local_stream().await.is_none());
    assert!(bob.view().participants.is_empty());
    assert!(bob.view().remote_streams.is_empty());

    alice.leave_room().await;
    assert!(!alice.is_active().await);
    assert!(alice.local_stream().await.is_none());
    let view = alice.view();
    assert!(view.room.is_none());
    assert!(view.participants.is_empty());
    assert!(view.remote_streams.is_empty());
    assert!(!view.has_local_stream);
    assert!(!view.is_connected);
}
