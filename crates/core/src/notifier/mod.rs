//! Chat notifications.
//!
//! Backends implement [`Notifier`]. The pipeline never talks to a backend
//! directly; it goes through one [`NotificationChannel`] owned by the
//! binary, which queues early messages, serializes sends and retries.

mod channel;
mod telegram;
mod types;
mod whatsapp;

pub use channel::{Delivery, NotificationChannel};
pub use telegram::TelegramNotifier;
pub use types::*;
pub use whatsapp::WhatsAppNotifier;

use std::sync::Arc;

use crate::config::{NotifierBackend, NotifierConfig};

/// Build the configured backend, or `None` when notifications are off.
pub fn build_notifier(config: &NotifierConfig) -> Result<Option<Arc<dyn Notifier>>, NotifyError> {
    match config.backend {
        NotifierBackend::None => Ok(None),
        NotifierBackend::Telegram => {
            let section = config
                .telegram
                .as_ref()
                .ok_or_else(|| NotifyError::NotConfigured("telegram".to_string()))?;
            Ok(Some(Arc::new(TelegramNotifier::new(section.clone())?)))
        }
        NotifierBackend::Whatsapp => {
            let section = config
                .whatsapp
                .as_ref()
                .ok_or_else(|| NotifyError::NotConfigured("whatsapp".to_string()))?;
            Ok(Some(Arc::new(WhatsAppNotifier::new(section.clone())?)))
        }
    }
}
