use huddle_client::{RoomSession, SessionError};
use huddle_core::{RoomId, RoomKey};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::integration::init_tracing;
use crate::utils::{
    CountingDevices, DeniedDevices, MockLinkFactory, client_config, spawn_test_server,
};

async fn unreachable_addr() -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

#[tokio::test]
async fn test_leave_is_always_safe() {
    init_tracing();
    let session = RoomSession::with_parts(
        client_config(unreachable_addr().await, "Ada"),
        Arc::new(CountingDevices::default()),
        Arc::new(MockLinkFactory::new()),
    );

    session.leave_room().await;
    session.leave_room().await;

    assert!(!session.is_active().await);
    assert!(session.view().room.is_none());
}

#[tokio::test]
async fn test_failed_join_releases_media() {
    init_tracing();
    let devices = CountingDevices::default();
    let session = RoomSession::with_parts(
        client_config(unreachable_addr().await, "Ada"),
        Arc::new(devices.clone()),
        Arc::new(MockLinkFactory::new()),
    );

    let err = session
        .join_room(RoomId::from("ABC123"), RoomKey::from("KEYKEY12"))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Channel(_)));
    assert_eq!(devices.opened(), 1);
    assert!(session.local_stream().await.is_none());
    assert!(!session.is_active().await);

    let view = session.view();
    assert!(!view.is_loading);
    assert!(!view.has_local_stream);
}

#[tokio::test]
async fn test_denied_media_aborts_join() {
    init_tracing();
    let (addr, state) = spawn_test_server().await;
    let creds = state.room_manager.create_room();
    let session = RoomSession::with_parts(
        client_config(addr, "Ada"),
        Arc::new(DeniedDevices),
        Arc::new(MockLinkFactory::new()),
    );

    let err = session
        .join_room(creds.room_id, creds.room_key)
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::MediaAccess(_)));
    assert!(!session.is_active().await);
}

#[tokio::test]
async fn test_wrong_key_is_refused() {
    init_tracing();
    let (addr, state) = spawn_test_server().await;
    let creds = state.room_manager.create_room();
    let session = RoomSession::with_parts(
        client_config(addr, "Ada"),
        Arc::new(CountingDevices::default()),
        Arc::new(MockLinkFactory::new()),
    );

    let err = session
        .join_room(creds.room_id, RoomKey::from("WRONGKEY"))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Channel(_)));
    assert!(session.local_stream().await.is_none());
}

#[tokio::test]
async fn test_create_room_joins_it() {
    init_tracing();
    let (addr, state) = spawn_test_server().await;
    let session = RoomSession::with_parts(
        client_config(addr, "Ada"),
        Arc::new(CountingDevices::default()),
        Arc::new(MockLinkFactory::new()),
    );

    let info = session.create_room().await.unwrap();
    assert_eq!(info.room_id.as_str().len(), 6);
    assert!(session.is_active().await);
    assert!(session.view().has_local_stream);
    assert_eq!(state.room_manager.room_count(), 1);

    let err = session.create_room().await.unwrap_err();
    assert!(matches!(err, SessionError::AlreadyActive));

    session
        .rooms()
        .verify_room(&info.room_id, &info.room_key)
        .await
        .unwrap();

    session.leave_room().await;
    assert!(!session.is_active().await);
    assert!(session.local_stream().await.is_none());
}

#[tokio::test]
async fn test_racing_create_and_join_leaves_no_spinner() {
    init_tracing();
    let (addr, _state) = spawn_test_server().await;
    let session = RoomSession::with_parts(
        client_config(addr, "Ada"),
        Arc::new(CountingDevices::default()),
        Arc::new(MockLinkFactory::new()),
    );
    let existing = session.rooms().create_room().await.unwrap();

    let (created, joined) = tokio::join!(
        session.create_room(),
        session.join_room(existing.room_id, existing.room_key)
    );

    let refused = [&created, &joined]
        .iter()
        .filter(|r| matches!(r, Err(SessionError::AlreadyActive)))
        .count();
    assert_eq!(refused, 1);
    assert!(created.is_ok() || joined.is_ok());
    assert!(session.is_active().await);
    assert!(!session.view().is_loading);
    assert!(session.view().room.is_some());

    session.leave_room().await;
}
