//! Machine translation of subtitle files.
//!
//! A [`Translator`] handles one block of cues at a time;
//! [`translate_subtitles`] splits a whole file, checks every translated
//! block kept its timestamps and stitches the result back together.

mod openai;
mod types;

pub use openai::OpenAiTranslator;
pub use types::*;

use tracing::{debug, info};

use crate::subtitles::srt;

/// Translate an SRT document block by block.
pub async fn translate_subtitles(
    translator: &dyn Translator,
    text: &str,
    source_language: &str,
    target_language: &str,
    cues_per_block: usize,
) -> Result<String, TranslateError> {
    let blocks = srt::blocks(text, cues_per_block);
    if blocks.is_empty() {
        return Err(TranslateError::EmptyInput);
    }

    info!(
        translator = translator.name(),
        blocks = blocks.len(),
        from = source_language,
        to = target_language,
        "Translating subtitles"
    );

    let mut translated = Vec::with_capacity(blocks.len());
    for (index, block) in blocks.iter().enumerate() {
        let output = translator
            .translate_block(block, source_language, target_language)
            .await?;

        let expected = srt::timestamp_lines(block);
        let actual = srt::timestamp_lines(&output);
        if expected != actual {
            return Err(TranslateError::TimestampMismatch {
                block: index,
                expected: expected.len(),
                actual: actual.len(),
            });
        }

        debug!(block = index + 1, of = blocks.len(), "Block translated");
        translated.push(output);
    }

    Ok(srt::join_blocks(&translated))
}
