use huddle_core::{HealthReport, RoomCredentials};

use crate::integration::init_tracing;
use crate::utils::{http_url, spawn_test_server};

fn is_code(s: &str, len: usize) -> bool {
    s.len() == len && s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

#[tokio::test]
async fn test_create_room_returns_credentials() {
    init_tracing();

    let (addr, state) = spawn_test_server().await;
    let http = reqwest::Client::new();

    let creds: RoomCredentials = http
        .post(http_url(addr, "/api/rooms/create"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(is_code(creds.room_id.as_str(), 6));
    assert!(is_code(creds.room_key.as_str(), 8));
    assert_eq!(state.room_manager.room_count(), 1);
    assert!(state.room_manager.created_at(&creds.room_id).is_some());
}

#[tokio::test]
async fn test_verify_room_checks_id_and_key() {
    init_tracing();

    let (addr, state) = spawn_test_server().await;
    let creds = state.room_manager.create_room();
    let http = reqwest::Client::new();

    let ok = http
        .get(http_url(
            addr,
            &format!("/api/rooms/verify/{}?room_key={}", creds.room_id, creds.room_key.as_str()),
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);
    let body: serde_json::Value = ok.json().await.unwrap();
    assert_eq!(body["valid"], true);

    let wrong_key = http
        .get(http_url(
            addr,
            &format!("/api/rooms/verify/{}?room_key=NOPE0000", creds.room_id),
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_key.status(), 401);

    let missing = http
        .get(http_url(addr, "/api/rooms/verify/ZZZZZZ?room_key=NOPE0000"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_health_counts_rooms() {
    init_tracing();

    let (addr, state) = spawn_test_server().await;
    state.room_manager.create_room();
    state.room_manager.create_room();

    let report: HealthReport = reqwest::get(http_url(addr, "/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(report.status, "healthy");
    assert_eq!(report.active_rooms, 2);
}
