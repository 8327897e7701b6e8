//! WhatsApp Cloud API backend.
//!
//! Videos are uploaded to the media endpoint first and then sent by id.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::{Notifier, NotifyError};
use crate::config::WhatsAppConfig;

/// Cloud API limit for video media.
const MAX_VIDEO_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct GraphError {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MediaUpload {
    id: String,
}

pub struct WhatsAppNotifier {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppNotifier {
    pub fn new(config: WhatsAppConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.phone_number_id,
            path
        )
        .trim_end_matches('/')
        .to_string()
    }

    async fn check(response: reqwest::Response) -> Result<String, NotifyError> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        if (200..300).contains(&status) {
            return Ok(text);
        }
        let message = serde_json::from_str::<GraphError>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);
        if status == 401 || status == 403 {
            return Err(NotifyError::AuthFailed(message));
        }
        Err(NotifyError::Api { status, message })
    }

    async fn send_message(&self, payload: serde_json::Value) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.url("messages"))
            .bearer_auth(&self.config.access_token)
            .json(&payload)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

fn text_payload(recipient: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "messaging_product": "whatsapp",
        "to": recipient,
        "type": "text",
        "text": { "body": text },
    })
}

fn video_payload(recipient: &str, media_id: &str, caption: &str) -> serde_json::Value {
    serde_json::json!({
        "messaging_product": "whatsapp",
        "to": recipient,
        "type": "video",
        "video": { "id": media_id, "caption": caption },
    })
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn connect(&self) -> Result<(), NotifyError> {
        let response = self
            .client
            .get(self.url(""))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;
        Self::check(response).await?;
        info!(recipient = %self.config.recipient, "WhatsApp channel ready");
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        self.send_message(text_payload(&self.config.recipient, text))
            .await
    }

    async fn send_video(&self, path: &Path, caption: &str) -> Result<(), NotifyError> {
        let size = tokio::fs::metadata(path).await?.len();
        if size > MAX_VIDEO_BYTES {
            return Err(NotifyError::FileTooLarge {
                size,
                limit: MAX_VIDEO_BYTES,
            });
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video.mp4".to_string());
        let form = Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", "video/mp4")
            .part(
                "file",
                Part::bytes(bytes).file_name(file_name).mime_str("video/mp4")?,
            );

        debug!(path = %path.display(), size, "Uploading video to WhatsApp");
        let response = self
            .client
            .post(self.url("media"))
            .bearer_auth(&self.config.access_token)
            .multipart(form)
            .send()
            .await?;
        let body = Self::check(response).await?;
        let upload: MediaUpload = serde_json::from_str(&body).map_err(|e| NotifyError::Api {
            status: 200,
            message: format!("unexpected media upload response: {}", e),
        })?;

        self.send_message(video_payload(&self.config.recipient, &upload.id, caption))
            .await
    }
}
