use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Block {block} came back with {actual} timestamp lines, expected {expected} unchanged")]
    TimestampMismatch {
        block: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Nothing to translate")]
    EmptyInput,

    #[error("Translator not configured")]
    NotConfigured,
}

/// A service that translates one block of SRT cues.
///
/// Implementations must return the cue numbers and timestamp lines
/// unchanged and translate only the dialogue lines.
#[async_trait]
pub trait Translator: Send + Sync {
    fn name(&self) -> &str;

    async fn translate_block(
        &self,
        block: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslateError>;
}
