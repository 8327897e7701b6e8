//! Telegram Bot API backend.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::{Notifier, NotifyError};
use crate::config::TelegramConfig;

/// Bot API upload limit for `sendVideo`.
const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct BotResponse<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    #[serde(default)]
    username: Option<String>,
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self { client, config })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    async fn read_response<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<Option<T>, NotifyError> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body: BotResponse<T> = serde_json::from_str(&text).map_err(|_| NotifyError::Api {
            status,
            message: text.chars().take(200).collect(),
        })?;

        if status == 401 || status == 404 {
            return Err(NotifyError::AuthFailed(
                body.description.unwrap_or_else(|| format!("HTTP {}", status)),
            ));
        }
        if !body.ok {
            return Err(NotifyError::Api {
                status,
                message: body.description.unwrap_or_default(),
            });
        }
        Ok(body.result)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn connect(&self) -> Result<(), NotifyError> {
        let response = self.client.get(self.method_url("getMe")).send().await?;
        let me: Option<BotUser> = Self::read_response(response).await?;
        info!(
            bot = ?me.and_then(|u| u.username),
            chat_id = %self.config.chat_id,
            "Telegram bot ready"
        );
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&serde_json::json!({
                "chat_id": self.config.chat_id,
                "text": text,
            }))
            .send()
            .await?;
        Self::read_response::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn send_video(&self, path: &Path, caption: &str) -> Result<(), NotifyError> {
        let size = tokio::fs::metadata(path).await?.len();
        if size > MAX_UPLOAD_BYTES {
            return Err(NotifyError::FileTooLarge {
                size,
                limit: MAX_UPLOAD_BYTES,
            });
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video.mp4".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("video/mp4")?;
        let form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .text("caption", caption.to_string())
            .text("supports_streaming", "true")
            .part("video", part);

        debug!(path = %path.display(), size, "Uploading video to Telegram");
        let response = self
            .client
            .post(self.method_url("sendVideo"))
            .multipart(form)
            .send()
            .await?;
        Self::read_response::<serde_json::Value>(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> TelegramNotifier {
        TelegramNotifier::new(TelegramConfig {
            bot_token: "123:abc".to_string(),
            chat_id: "42".to_string(),
            api_base: "https://api.telegram.example/".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_method_url() {
        assert_eq!(
            notifier().method_url("sendMessage"),
            "https://api.telegram.example/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_bot_response_parsing() {
        let ok: BotResponse<BotUser> =
            serde_json::from_str(r#"{"ok":true,"result":{"id":1,"is_bot":true,"username":"grab_bot"}}"#)
                .unwrap();
        assert!(ok.ok);
        assert_eq!(ok.result.unwrap().username.as_deref(), Some("grab_bot"));

        let err: BotResponse<BotUser> =
            serde_json::from_str(r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#)
                .unwrap();
        assert!(!err.ok);
        assert_eq!(err.description.as_deref(), Some("Bad Request: chat not found"));
    }

    #[tokio::test]
    async fn test_send_video_size_limit() {
        let file = tempfile::NamedTempFile::new().unwrap();
        file.as_file().set_len(MAX_UPLOAD_BYTES + 1).unwrap();

        let err = notifier().send_video(file.path(), "x").await.unwrap_err();
        assert!(matches!(err, NotifyError::FileTooLarge { .. }));
    }
}
