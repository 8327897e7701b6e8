//! OpenAI chat-completions translator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{TranslateError, Translator};
use crate::config::TranslatorConfig;

pub struct OpenAiTranslator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl OpenAiTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self, TranslateError> {
        if !config.is_enabled() {
            return Err(TranslateError::NotConfigured);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranslateError::Http(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    error: ChatErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ChatErrorDetail {
    message: String,
}

fn system_prompt(source_language: &str, target_language: &str) -> String {
    format!(
        "You translate SubRip (.srt) subtitles from {} to {}. \
         Keep every cue number and every timestamp line exactly as given, \
         keep the blank lines between cues, and translate only the dialogue. \
         Reply with the translated subtitles and nothing else.",
        source_language, target_language
    )
}

/// Drop a Markdown code fence the model may wrap its answer in.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn translate_block(
        &self,
        block: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslateError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt(source_language, target_language),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: block.to_string(),
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslateError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ChatError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(TranslateError::Api { status, message });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::InvalidResponse(e.to_string()))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| TranslateError::InvalidResponse("no choices".to_string()))?;

        debug!(model = %self.model, chars = text.len(), "Block translated");
        Ok(strip_code_fence(&text).to_string())
    }
}
