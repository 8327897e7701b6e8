use super::{types::Config, ConfigError, NotifierBackend};

/// Validate configuration
/// Currently validates:
/// - OpenSubtitles API key is set
/// - Poll intervals are not 0
/// - Progress step is within 1..=100
/// - The selected notifier backend has its section filled in
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.opensubtitles.api_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "opensubtitles.api_key is required".to_string(),
        ));
    }

    if config.pipeline.download_poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.download_poll_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.translator.cues_per_block == 0 {
        return Err(ConfigError::ValidationError(
            "translator.cues_per_block cannot be 0".to_string(),
        ));
    }

    if config.subtitles.tag.is_empty() || !config.subtitles.tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::ValidationError(
            "subtitles.tag must be a non-empty alphanumeric string".to_string(),
        ));
    }

    let step = config.notifier.progress_step_pct;
    if step == 0 || step > 100 {
        return Err(ConfigError::ValidationError(format!(
            "notifier.progress_step_pct must be between 1 and 100, got {}",
            step
        )));
    }

    match config.notifier.backend {
        NotifierBackend::None => {}
        NotifierBackend::Telegram => match &config.notifier.telegram {
            Some(t) if !t.bot_token.is_empty() && !t.chat_id.is_empty() => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "notifier.backend = \"telegram\" requires notifier.telegram.bot_token and chat_id"
                        .to_string(),
                ))
            }
        },
        NotifierBackend::Whatsapp => match &config.notifier.whatsapp {
            Some(w)
                if !w.access_token.is_empty()
                    && !w.phone_number_id.is_empty()
                    && !w.recipient.is_empty() => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "notifier.backend = \"whatsapp\" requires notifier.whatsapp.access_token, phone_number_id and recipient"
                        .to_string(),
                ))
            }
        },
    }

    Ok(())
}
