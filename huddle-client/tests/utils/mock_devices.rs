use async_trait::async_trait;
use huddle_client::{LocalStream, MediaAccessError, MediaConstraints, MediaDevices, SampleDevices};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Devices the user refused to share.
#[derive(Debug, Clone, Default)]
pub struct DeniedDevices;

#[async_trait]
impl MediaDevices for DeniedDevices {
    async fn open(&self, _constraints: &MediaConstraints) -> Result<LocalStream, MediaAccessError> {
        Err(MediaAccessError::PermissionDenied)
    }
}

/// [`SampleDevices`] that counts how often a stream was opened.
#[derive(Debug, Clone, Default)]
pub struct CountingDevices {
    opened: Arc<AtomicUsize>,
}

impl CountingDevices {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaDevices for CountingDevices {
    async fn open(&self, constraints: &MediaConstraints) -> Result<LocalStream, MediaAccessError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        SampleDevices.open(constraints).await
    }
}
