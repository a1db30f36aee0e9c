use bytes::Bytes;
use huddle_client::{MediaAccessError, MediaConstraints, MediaController, TrackKind};
use std::sync::Arc;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{CountingDevices, DeniedDevices, RecordingSignaling};

#[tokio::test]
async fn test_acquire_reuses_open_stream() {
    init_tracing();
    let devices = CountingDevices::default();
    let mut media = MediaController::new(Arc::new(devices.clone()), MediaConstraints::default());

    let first = media.acquire().await.unwrap();
    let second = media.acquire().await.unwrap();

    assert_eq!(first.id(), second.id());
    assert_eq!(devices.opened(), 1);
    assert_eq!(first.audio_tracks().count(), 1);
    assert_eq!(first.video_tracks().count(), 1);
}

#[tokio::test]
async fn test_audio_only_constraints() {
    init_tracing();
    let constraints = MediaConstraints {
        video: None,
        ..MediaConstraints::default()
    };
    let mut media = MediaController::new(Arc::new(CountingDevices::default()), constraints);

    let stream = media.acquire().await.unwrap();
    assert!(stream.tracks().iter().all(|t| t.kind() == TrackKind::Audio));
    assert!(media.set_video_enabled(false).await);
    assert!(media.is_video_off());
}

#[tokio::test]
async fn test_denied_access_leaves_no_stream() {
    init_tracing();
    let mut media = MediaController::new(Arc::new(DeniedDevices), MediaConstraints::default());

    let err = media.acquire().await.unwrap_err();
    assert!(matches!(err, MediaAccessError::PermissionDenied));
    assert!(!media.has_stream());
}

#[tokio::test]
async fn test_release_stops_tracks_once() {
    init_tracing();
    let mut media = MediaController::new(Arc::new(CountingDevices::default()), MediaConstraints::default());
    let stream = media.acquire().await.unwrap();
    media.toggle_audio().await;

    media.release();
    media.release();

    assert!(!media.has_stream());
    assert!(!media.is_muted(), "Flags reset with the stream");
    assert!(stream.tracks().iter().all(|t| t.is_stopped()));

    let audio = stream.audio_tracks().next().unwrap();
    let err = audio
        .write_sample(Bytes::from_static(&[0u8; 4]), Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, MediaAccessError::TrackStopped));
}

#[tokio::test]
async fn test_disabled_track_swallows_samples() {
    init_tracing();
    let mut media = MediaController::new(Arc::new(CountingDevices::default()), MediaConstraints::default());
    let stream = media.acquire().await.unwrap();
    media.set_video_enabled(false).await;

    let video = stream.video_tracks().next().unwrap();
    assert!(!video.is_enabled());
    video
        .write_sample(Bytes::from_static(&[1u8; 16]), Duration::from_millis(33))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_status_changes_are_announced_once_bound() {
    init_tracing();
    let signaling = RecordingSignaling::new();
    let mut media = MediaController::new(Arc::new(CountingDevices::default()), MediaConstraints::default());
    media.acquire().await.unwrap();

    media.toggle_audio().await;
    assert!(signaling.all().is_empty());

    media.bind_signaling(Arc::new(signaling.clone()));
    assert!(!media.toggle_audio().await);
    assert!(media.toggle_video().await);
    assert_eq!(signaling.all().len(), 2);
}
