use crate::error::ChannelError;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, ServerMessage};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};
use url::Url;

const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_millis(250);

/// Connectivity of the signaling channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Open,
    Closed,
    Error,
}

#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Message(ServerMessage),
    Status(ChannelStatus),
}

pub type MessageHandler = Arc<dyn Fn(ChannelEvent) + Send + Sync>;

#[derive(Default)]
struct ChannelTasks {
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

struct ChannelInner {
    handler: RwLock<Option<MessageHandler>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<WsMessage>>>,
    tasks: Mutex<ChannelTasks>,
    status: watch::Sender<ChannelStatus>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChannelInner {
    fn emit(&self, event: ChannelEvent) {
        let handler = self
            .handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match handler {
            Some(handler) => handler(event),
            None => debug!("No handler registered, dropping {:?}", event),
        }
    }

    fn transition(&self, status: ChannelStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            info!("Signaling channel {:?} -> {:?}", previous, status);
            self.emit(ChannelEvent::Status(status));
        }
    }
}

/// WebSocket connection to the signaling relay for one room.
///
/// Every inbound frame and every connectivity change is handed to the single
/// handler registered with [`SignalingChannel::on_message`].
pub struct SignalingChannel {
    inner: Arc<ChannelInner>,
    connect_timeout: Duration,
}

impl SignalingChannel {
    pub fn new(connect_timeout: Duration) -> Self {
        let (status, _) = watch::channel(ChannelStatus::Closed);

        Self {
            inner: Arc::new(ChannelInner {
                handler: RwLock::new(None),
                outbound: Mutex::new(None),
                tasks: Mutex::new(ChannelTasks::default()),
                status,
            }),
            connect_timeout,
        }
    }

    /// Register the dispatch point. Replaces any previous handler.
    pub fn on_message<F>(&self, handler: F)
    where
        F: Fn(ChannelEvent) + Send + Sync + 'static,
    {
        *self
            .inner
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    pub fn status(&self) -> ChannelStatus {
        *self.inner.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChannelStatus> {
        self.inner.status.subscribe()
    }

    pub fn is_open(&self) -> bool {
        self.status() == ChannelStatus::Open
    }

    pub async fn connect(&self, url: &Url) -> Result<(), ChannelError> {
        if self.is_open() {
            return Err(ChannelError::AlreadyConnected);
        }

        info!("Connecting signaling channel to {}{}", url.origin().ascii_serialization(), url.path());

        let stream = match tokio::time::timeout(
            self.connect_timeout,
            tokio_tungstenite::connect_async(url.as_str()),
        )
        .await
        {
            Ok(Ok((stream, _))) => stream,
            Ok(Err(e)) => {
                warn!("Failed to open signaling channel: {}", e);
                self.inner.transition(ChannelStatus::Error);
                return Err(e.into());
            }
            Err(_) => {
                warn!("Signaling channel timed out after {:?}", self.connect_timeout);
                self.inner.transition(ChannelStatus::Error);
                return Err(ChannelError::Timeout(self.connect_timeout));
            }
        };

        let (mut write, mut read) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

        let writer = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let closing = matches!(msg, WsMessage::Close(_));
                if write.send(msg).await.is_err() || closing {
                    break;
                }
            }
        });

        *lock(&self.inner.outbound) = Some(tx);
        self.inner.transition(ChannelStatus::Open);

        let inner = Arc::clone(&self.inner);
        let reader = tokio::spawn(async move {
            let mut failed = false;

            while let Some(frame) = read.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(msg) => inner.emit(ChannelEvent::Message(msg)),
                        Err(e) => warn!("Invalid signaling frame: {}", e),
                    },
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Signaling channel error: {}", e);
                        failed = true;
                        break;
                    }
                }
            }

            lock(&inner.outbound).take();
            inner.transition(if failed {
                ChannelStatus::Error
            } else {
                ChannelStatus::Closed
            });
        });

        let mut tasks = lock(&self.inner.tasks);
        tasks.reader = Some(reader);
        tasks.writer = Some(writer);

        Ok(())
    }

    /// Close the connection. Safe to call any number of times.
    pub async fn close(&self) {
        let outbound = lock(&self.inner.outbound).take();
        let tasks = std::mem::take(&mut *lock(&self.inner.tasks));

        if let Some(reader) = tasks.reader {
            reader.abort();
        }

        if let Some(tx) = outbound {
            let _ = tx.send(WsMessage::Close(None));
        }

        if let Some(writer) = tasks.writer {
            let abort = writer.abort_handle();
            if tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, writer).await.is_err() {
                abort.abort();
            }
        }

        self.inner.transition(ChannelStatus::Closed);
    }
}

impl Drop for SignalingChannel {
    fn drop(&mut self) {
        let tasks = std::mem::take(&mut *lock(&self.inner.tasks));
        for task in [tasks.reader, tasks.writer].into_iter().flatten() {
            task.abort();
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingChannel {
    async fn send(&self, message: ClientMessage) -> Result<(), ChannelError> {
        let json = serde_json::to_string(&message)?;

        let outbound = lock(&self.inner.outbound);
        let Some(tx) = outbound.as_ref() else {
            return Err(ChannelError::NotOpen);
        };

        tx.send(WsMessage::Text(json.into()))
            .map_err(|_| ChannelError::NotOpen)
    }
}
