//! Mock translator for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::translator::{TranslateError, Translator};

/// Mock implementation of the Translator trait.
///
/// "Translates" by prefixing each dialogue line with `[<target>] `, leaving
/// cue numbers and timestamp lines untouched. With mangling enabled it
/// rewrites timestamps instead, which callers must detect.
#[derive(Debug, Default)]
pub struct MockTranslator {
    calls: Arc<RwLock<usize>>,
    mangle_timestamps: Arc<RwLock<bool>>,
    fail_with: Arc<RwLock<Option<String>>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks sent for translation.
    pub async fn calls(&self) -> usize {
        *self.calls.read().await
    }

    pub async fn set_mangle_timestamps(&self, mangle: bool) {
        *self.mangle_timestamps.write().await = mangle;
    }

    /// Make every call fail with an API error carrying this message.
    pub async fn set_failure(&self, message: impl Into<String>) {
        *self.fail_with.write().await = Some(message.into());
    }
}

fn is_cue_number(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty() && t.chars().all(|c| c.is_ascii_digit())
}

#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate_block(
        &self,
        block: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslateError> {
        *self.calls.write().await += 1;

        if let Some(message) = self.fail_with.read().await.as_ref() {
            return Err(TranslateError::Api {
                status: 500,
                message: message.clone(),
            });
        }
        let mangle = *self.mangle_timestamps.read().await;

        let lines: Vec<String> = block
            .lines()
            .map(|line| {
                if line.contains("-->") {
                    if mangle {
                        "00:00:00,000 --> 00:00:00,000".to_string()
                    } else {
                        line.to_string()
                    }
                } else if line.trim().is_empty() || is_cue_number(line) {
                    line.to_string()
                } else {
                    format!("[{}] {}", target_language, line)
                }
            })
            .collect();
        Ok(lines.join("\n"))
    }
}
