//! Types for chat notification backends.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("File too large to send: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Notifier not configured: {0}")]
    NotConfigured(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NotifyError {
    /// Whether sending again might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            NotifyError::Http(_) => true,
            NotifyError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        NotifyError::Http(e.to_string())
    }
}

/// A chat backend able to deliver text and video to one configured recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Verify credentials and make the backend ready to send.
    async fn connect(&self) -> Result<(), NotifyError>;

    async fn send_text(&self, text: &str) -> Result<(), NotifyError>;

    async fn send_video(&self, path: &Path, caption: &str) -> Result<(), NotifyError>;

    async fn close(&self) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(NotifyError::Http("reset".into()).is_transient());
        assert!(NotifyError::Api {
            status: 502,
            message: String::new()
        }
        .is_transient());
        assert!(NotifyError::Api {
            status: 429,
            message: String::new()
        }
        .is_transient());
        assert!(!NotifyError::Api {
            status: 400,
            message: String::new()
        }
        .is_transient());
        assert!(!NotifyError::AuthFailed("bad token".into()).is_transient());
        assert!(!NotifyError::FileTooLarge { size: 2, limit: 1 }.is_transient());
    }
}
