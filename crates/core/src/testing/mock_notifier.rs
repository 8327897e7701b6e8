//! Mock chat backend for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notifier::{Notifier, NotifyError};

/// A message the mock backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMessage {
    Text(String),
    Video { path: PathBuf, caption: String },
}

#[derive(Debug, Default)]
struct State {
    sent: Vec<SentMessage>,
    /// Send attempts, successful or not.
    attempts: u32,
    /// Remaining sends that fail with a transient error.
    failures_left: u32,
    reject_videos: bool,
    connect_failure: Option<String>,
    /// Remaining connects that fail with a transient error.
    connect_failures_left: u32,
    connects: u32,
    closed: bool,
}

/// Mock implementation of the Notifier trait.
///
/// # Example
///
/// ```rust,ignore
/// let mock = Arc::new(MockNotifier::new());
/// mock.fail_next_sends(2).await;
///
/// let channel = NotificationChannel::new(mock.clone(), &config);
/// channel.connect().await?;
/// channel.send_text("hello").await;
///
/// assert_eq!(mock.attempts().await, 3);
/// ```
#[derive(Debug, Default)]
pub struct MockNotifier {
    state: Arc<RwLock<State>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far, oldest first.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.state.read().await.sent.clone()
    }

    /// Text messages delivered so far.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .sent
            .iter()
            .filter_map(|m| match m {
                SentMessage::Text(t) => Some(t.clone()),
                SentMessage::Video { .. } => None,
            })
            .collect()
    }

    pub async fn attempts(&self) -> u32 {
        self.state.read().await.attempts
    }

    pub async fn connect_count(&self) -> u32 {
        self.state.read().await.connects
    }

    /// Fail the next `n` sends with a transient HTTP error.
    pub async fn fail_next_sends(&self, n: u32) {
        self.state.write().await.failures_left = n;
    }

    /// Refuse every video as too large.
    pub async fn set_reject_videos(&self, reject: bool) {
        self.state.write().await.reject_videos = reject;
    }

    /// Fail every connect with an authentication error.
    pub async fn set_connect_failure(&self, message: impl Into<String>) {
        self.state.write().await.connect_failure = Some(message.into());
    }

    /// Fail the next `n` connects with a transient HTTP error.
    pub async fn fail_next_connects(&self, n: u32) {
        self.state.write().await.connect_failures_left = n;
    }

    pub async fn was_closed(&self) -> bool {
        self.state.read().await.closed
    }

    async fn attempt(&self) -> Result<(), NotifyError> {
        let mut state = self.state.write().await;
        state.attempts += 1;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(NotifyError::Http("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(&self) -> Result<(), NotifyError> {
        let mut state = self.state.write().await;
        state.connects += 1;
        if let Some(message) = &state.connect_failure {
            return Err(NotifyError::AuthFailed(message.clone()));
        }
        if state.connect_failures_left > 0 {
            state.connect_failures_left -= 1;
            return Err(NotifyError::Http("connection refused".to_string()));
        }
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        self.attempt().await?;
        self.state
            .write()
            .await
            .sent
            .push(SentMessage::Text(text.to_string()));
        Ok(())
    }

    async fn send_video(&self, path: &Path, caption: &str) -> Result<(), NotifyError> {
        self.attempt().await?;
        let mut state = self.state.write().await;
        if state.reject_videos {
            return Err(NotifyError::FileTooLarge {
                size: 100 * 1024 * 1024,
                limit: 16 * 1024 * 1024,
            });
        }
        state.sent.push(SentMessage::Video {
            path: path.to_path_buf(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn close(&self) -> Result<(), NotifyError> {
        self.state.write().await.closed = true;
        Ok(())
    }
}
