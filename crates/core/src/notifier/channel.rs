//! Owned notification session.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{Notifier, NotifyError};
use crate::config::NotifierConfig;
use crate::progress::{format_percent, ProgressEvent};

/// Messages held while the backend is unreachable. Older texts go first.
const MAX_QUEUED: usize = 64;

/// What happened to a message handed to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Held until the backend connects.
    Queued,
    /// A video could not be sent; a text notice went out instead.
    FellBack,
    /// Sending failed, or the backend refused the connection for good.
    Failed,
    /// No backend configured, or the channel was already closed.
    Dropped,
}

#[derive(Debug, Clone)]
enum Message {
    Text(String),
    Video { path: PathBuf, caption: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No connect attempted yet.
    Connecting,
    /// The last connect failed transiently; the next send tries again.
    Retrying,
    Ready,
    /// Connect failed permanently, e.g. bad credentials.
    Unavailable,
    Closed,
}

struct State {
    phase: Phase,
    queue: Vec<Message>,
}

/// A single chat session: connect, then any number of sends, then close.
///
/// Messages sent before [`connect`](Self::connect) succeeds are queued and
/// flushed in order once it does. After a transient connect failure every
/// send makes one more connect attempt; the queue keeps at most
/// `MAX_QUEUED` messages meanwhile. Sends hold an async mutex, so messages
/// from concurrent callers never interleave.
pub struct NotificationChannel {
    notifier: Option<Arc<dyn Notifier>>,
    state: Mutex<State>,
    attempts: u32,
    backoff: Duration,
}

impl NotificationChannel {
    pub fn new(notifier: Arc<dyn Notifier>, config: &NotifierConfig) -> Self {
        Self::build(Some(notifier), config)
    }

    /// A channel that accepts and drops everything.
    pub fn disabled() -> Self {
        Self::build(None, &NotifierConfig::default())
    }

    fn build(notifier: Option<Arc<dyn Notifier>>, config: &NotifierConfig) -> Self {
        Self {
            notifier,
            state: Mutex::new(State {
                phase: Phase::Connecting,
                queue: Vec::new(),
            }),
            attempts: config.retry_attempts.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    pub async fn is_ready(&self) -> bool {
        self.state.lock().await.phase == Phase::Ready
    }

    /// Connect the backend and flush anything queued so far.
    ///
    /// Transient failures are retried like sends. The channel stays usable
    /// after a failure: transient ones are retried on later sends, permanent
    /// ones turn every later send into [`Delivery::Failed`].
    pub async fn connect(&self) -> Result<(), NotifyError> {
        let Some(notifier) = &self.notifier else {
            return Ok(());
        };

        let mut state = self.state.lock().await;
        if !matches!(state.phase, Phase::Connecting | Phase::Retrying) {
            return Ok(());
        }

        match self.with_retry(|| notifier.connect()).await {
            Ok(()) => {
                self.become_ready(notifier.as_ref(), &mut state).await;
                Ok(())
            }
            Err(e) => {
                Self::connect_failed(notifier.as_ref(), &mut state, &e);
                Err(e)
            }
        }
    }

    pub async fn send_text(&self, text: impl Into<String>) -> Delivery {
        self.submit(Message::Text(text.into())).await
    }

    /// Send a video, falling back to a text notice if it cannot be delivered.
    pub async fn send_video(&self, path: &Path, caption: impl Into<String>) -> Delivery {
        self.submit(Message::Video {
            path: path.to_path_buf(),
            caption: caption.into(),
        })
        .await
    }

    /// Send one message per crossed progress threshold.
    pub async fn send_progress(&self, label: &str, events: &[ProgressEvent]) {
        for event in events {
            let text = format_percent(label, event.percent, event.eta);
            self.send_text(text).await;
        }
    }

    /// Close the backend. Messages still queued are dropped.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if state.phase == Phase::Closed {
            return;
        }
        let was_ready = state.phase == Phase::Ready;
        state.phase = Phase::Closed;

        if !state.queue.is_empty() {
            warn!(dropped = state.queue.len(), "Closing notification channel with undelivered messages");
            state.queue.clear();
        }

        if let (true, Some(notifier)) = (was_ready, &self.notifier) {
            if let Err(e) = notifier.close().await {
                warn!(error = %e, "Failed to close notification channel");
            }
        }
    }

    async fn submit(&self, message: Message) -> Delivery {
        let Some(notifier) = &self.notifier else {
            return Delivery::Dropped;
        };

        let mut state = self.state.lock().await;
        match state.phase {
            Phase::Connecting => {
                Self::enqueue(&mut state, message);
                Delivery::Queued
            }
            Phase::Retrying => match notifier.connect().await {
                Ok(()) => {
                    self.become_ready(notifier.as_ref(), &mut state).await;
                    self.deliver(notifier.as_ref(), message).await
                }
                Err(e) => {
                    Self::connect_failed(notifier.as_ref(), &mut state, &e);
                    if state.phase == Phase::Retrying {
                        Self::enqueue(&mut state, message);
                        Delivery::Queued
                    } else {
                        Delivery::Failed
                    }
                }
            },
            Phase::Unavailable => {
                debug!("Notification not sent, backend unavailable");
                Delivery::Failed
            }
            Phase::Closed => {
                debug!("Notification dropped, channel closed");
                Delivery::Dropped
            }
            Phase::Ready => self.deliver(notifier.as_ref(), message).await,
        }
    }

    async fn become_ready(&self, notifier: &dyn Notifier, state: &mut State) {
        state.phase = Phase::Ready;
        info!(backend = notifier.name(), queued = state.queue.len(), "Notification channel ready");

        let queued = std::mem::take(&mut state.queue);
        for message in queued {
            self.deliver(notifier, message).await;
        }
    }

    fn connect_failed(notifier: &dyn Notifier, state: &mut State, error: &NotifyError) {
        if error.is_transient() {
            debug!(backend = notifier.name(), error = %error, "Notification backend not reachable yet");
            state.phase = Phase::Retrying;
        } else {
            warn!(
                backend = notifier.name(),
                error = %error,
                dropped = state.queue.len(),
                "Notification backend refused the connection"
            );
            state.phase = Phase::Unavailable;
            state.queue.clear();
        }
    }

    fn enqueue(state: &mut State, message: Message) {
        if state.queue.len() >= MAX_QUEUED {
            let oldest = state
                .queue
                .iter()
                .position(|m| matches!(m, Message::Text(_)))
                .unwrap_or(0);
            state.queue.remove(oldest);
            debug!(limit = MAX_QUEUED, "Notification queue full, dropped oldest message");
        }
        state.queue.push(message);
    }

    /// Caller holds the state lock.
    async fn deliver(&self, notifier: &dyn Notifier, message: Message) -> Delivery {
        match message {
            Message::Text(text) => {
                match self.with_retry(|| notifier.send_text(&text)).await {
                    Ok(()) => Delivery::Delivered,
                    Err(e) => {
                        warn!(backend = notifier.name(), error = %e, "Failed to send notification");
                        Delivery::Failed
                    }
                }
            }
            Message::Video { path, caption } => {
                match self.with_retry(|| notifier.send_video(&path, &caption)).await {
                    Ok(()) => Delivery::Delivered,
                    Err(e) => {
                        warn!(
                            backend = notifier.name(),
                            path = %path.display(),
                            error = %e,
                            "Failed to send video, falling back to text"
                        );
                        let notice = format!("{}\n(video not sent: {})", caption, e);
                        match self.with_retry(|| notifier.send_text(&notice)).await {
                            Ok(()) => Delivery::FellBack,
                            Err(e) => {
                                warn!(error = %e, "Text fallback failed too");
                                Delivery::Failed
                            }
                        }
                    }
                }
            }
        }
    }

    async fn with_retry<F, Fut>(&self, mut send: F) -> Result<(), NotifyError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<(), NotifyError>>,
    {
        let mut attempt = 1;
        loop {
            match send().await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    debug!(attempt, error = %e, "Notification send failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
