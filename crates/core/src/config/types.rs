use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::converter::ConverterConfig;
use crate::ranking::ScoringPolicy;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub searcher: SearcherConfig,
    #[serde(default)]
    pub torrent: LibrqbitConfig,
    #[serde(default)]
    pub opensubtitles: OpenSubtitlesConfig,
    #[serde(default)]
    pub translator: TranslatorConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub subtitles: SubtitleConfig,
    #[serde(default)]
    pub compress: CompressConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Available search backends
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearcherBackend {
    #[default]
    Apibay,
}

/// Torrent index configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearcherConfig {
    #[serde(default)]
    pub backend: SearcherBackend,
    /// Index base URL (e.g., "https://apibay.org")
    #[serde(default = "default_index_url")]
    pub url: String,
    /// Index categories to query; results are merged by info hash.
    /// An empty list searches every category.
    #[serde(default = "default_categories")]
    pub categories: Vec<u32>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for SearcherConfig {
    fn default() -> Self {
        Self {
            backend: SearcherBackend::default(),
            url: default_index_url(),
            categories: default_categories(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_index_url() -> String {
    "https://apibay.org".to_string()
}

fn default_categories() -> Vec<u32> {
    // 205 = TV shows, 208 = HD TV shows
    vec![205, 208]
}

fn default_timeout() -> u32 {
    30
}

/// Embedded librqbit client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibrqbitConfig {
    /// Session default download folder. Each episode overrides this with
    /// its own output folder.
    #[serde(default = "default_download_path")]
    pub download_path: String,
    #[serde(default = "default_true")]
    pub enable_dht: bool,
    #[serde(default)]
    pub listen_port: Option<u16>,
    #[serde(default)]
    pub persistence_path: Option<String>,
    /// Trackers appended to constructed magnet links.
    #[serde(default = "default_trackers")]
    pub trackers: Vec<String>,
    /// How long to wait for magnet metadata before giving up.
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,
}

impl Default for LibrqbitConfig {
    fn default() -> Self {
        Self {
            download_path: default_download_path(),
            enable_dht: true,
            listen_port: None,
            persistence_path: None,
            trackers: default_trackers(),
            metadata_timeout_secs: default_metadata_timeout(),
        }
    }
}

fn default_download_path() -> String {
    std::env::temp_dir()
        .join("subgrab-downloads")
        .display()
        .to_string()
}

fn default_trackers() -> Vec<String> {
    vec![
        "udp://tracker.opentrackr.org:1337/announce".to_string(),
        "udp://open.stealth.si:80/announce".to_string(),
        "udp://tracker.torrent.eu.org:451/announce".to_string(),
        "udp://exodus.desync.com:6969/announce".to_string(),
    ]
}

fn default_metadata_timeout() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

/// OpenSubtitles REST API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenSubtitlesConfig {
    #[serde(default = "default_opensubtitles_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for OpenSubtitlesConfig {
    fn default() -> Self {
        Self {
            url: default_opensubtitles_url(),
            api_key: String::new(),
            username: String::new(),
            password: String::new(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_opensubtitles_url() -> String {
    "https://api.opensubtitles.com/api/v1".to_string()
}

fn default_user_agent() -> String {
    format!("subgrab v{}", env!("CARGO_PKG_VERSION"))
}

/// Subtitle translation (OpenAI chat completions) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranslatorConfig {
    /// API key. Translation is disabled when empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_translator_model")]
    pub model: String,
    #[serde(default = "default_translator_url")]
    pub api_base: String,
    /// Number of subtitle cues sent per request.
    #[serde(default = "default_cues_per_block")]
    pub cues_per_block: usize,
    #[serde(default = "default_translator_timeout")]
    pub timeout_secs: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_translator_model(),
            api_base: default_translator_url(),
            cues_per_block: default_cues_per_block(),
            timeout_secs: default_translator_timeout(),
        }
    }
}

impl TranslatorConfig {
    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }
}

fn default_translator_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_translator_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_cues_per_block() -> usize {
    40
}

fn default_translator_timeout() -> u64 {
    120
}

/// Ranking configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RankingConfig {
    #[serde(default)]
    pub policy: ScoringPolicy,
    /// Candidates with fewer seeders are dropped before scoring.
    #[serde(default = "default_min_seeds")]
    pub min_seeds: u32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::default(),
            min_seeds: default_min_seeds(),
        }
    }
}

fn default_min_seeds() -> u32 {
    20
}

/// Subtitle language selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubtitleConfig {
    /// Target language code as understood by the subtitle provider.
    #[serde(default = "default_language")]
    pub language: String,
    /// Human-readable target language name, used in translation prompts.
    #[serde(default = "default_language_name")]
    pub language_name: String,
    /// Short tag embedded in output file names (`<stem>.<tag>.srt`,
    /// `<stem>.<tag>sub.mp4`).
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Languages searched when the target language has no subtitles.
    /// Results in these languages are translated.
    #[serde(default = "default_fallback_languages")]
    pub fallback_languages: Vec<String>,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            language_name: default_language_name(),
            tag: default_tag(),
            fallback_languages: default_fallback_languages(),
        }
    }
}

fn default_language() -> String {
    "he".to_string()
}

fn default_language_name() -> String {
    "Hebrew".to_string()
}

fn default_tag() -> String {
    "heb".to_string()
}

fn default_fallback_languages() -> Vec<String> {
    vec!["en".to_string()]
}

/// Chat-friendly re-encode settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompressConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_crf")]
    pub crf: u8,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            crf: default_crf(),
            max_height: default_max_height(),
            preset: default_preset(),
            audio_bitrate_kbps: default_audio_bitrate(),
        }
    }
}

fn default_crf() -> u8 {
    28
}

fn default_max_height() -> u32 {
    720
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_audio_bitrate() -> u32 {
    128
}

/// Available notification backends
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotifierBackend {
    #[default]
    None,
    Telegram,
    Whatsapp,
}

/// Notification channel configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub backend: NotifierBackend,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub whatsapp: Option<WhatsAppConfig>,
    /// Send attempts for a single message before degrading.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Fixed delay between send attempts.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
    /// A progress message is sent every time this many percent is crossed.
    #[serde(default = "default_progress_step")]
    pub progress_step_pct: u32,
    /// Time given to the failure notice before the process exits.
    #[serde(default = "default_failure_grace")]
    pub failure_grace_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            backend: NotifierBackend::None,
            telegram: None,
            whatsapp: None,
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff(),
            progress_step_pct: default_progress_step(),
            failure_grace_ms: default_failure_grace(),
        }
    }
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    2000
}

fn default_progress_step() -> u32 {
    20
}

fn default_failure_grace() -> u64 {
    2000
}

/// Telegram Bot API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    #[serde(default = "default_telegram_url")]
    pub api_base: String,
}

fn default_telegram_url() -> String {
    "https://api.telegram.org".to_string()
}

/// WhatsApp Cloud API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WhatsAppConfig {
    pub access_token: String,
    pub phone_number_id: String,
    /// Recipient phone number in international format, digits only.
    pub recipient: String,
    #[serde(default = "default_whatsapp_url")]
    pub api_base: String,
}

fn default_whatsapp_url() -> String {
    "https://graph.facebook.com/v19.0".to_string()
}

/// Pipeline runtime configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Root output directory; episodes go to `<output_dir>/<Show>/SxxEyy`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// How often to poll download progress (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub download_poll_interval_ms: u64,
    /// Fail the download when progress has not moved for this long.
    #[serde(default = "default_stall_timeout")]
    pub stall_timeout_secs: u64,
    /// Remove the torrent (keeping files) once the download completes.
    #[serde(default = "default_true")]
    pub remove_completed: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            download_poll_interval_ms: default_poll_interval(),
            stall_timeout_secs: default_stall_timeout(),
            remove_completed: true,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_stall_timeout() -> u64 {
    1800
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub searcher: SearcherConfig,
    pub ranking: RankingConfig,
    pub subtitles: SubtitleConfig,
    pub opensubtitles_configured: bool,
    pub translator_enabled: bool,
    pub translator_model: String,
    pub compress_enabled: bool,
    pub notifier: String,
    pub output_dir: PathBuf,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            searcher: config.searcher.clone(),
            ranking: config.ranking.clone(),
            subtitles: config.subtitles.clone(),
            opensubtitles_configured: !config.opensubtitles.api_key.is_empty(),
            translator_enabled: config.translator.is_enabled(),
            translator_model: config.translator.model.clone(),
            compress_enabled: config.compress.enabled,
            notifier: match config.notifier.backend {
                NotifierBackend::None => "none".to_string(),
                NotifierBackend::Telegram => "telegram".to_string(),
                NotifierBackend::Whatsapp => "whatsapp".to_string(),
            },
            output_dir: config.pipeline.output_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.searcher.backend, SearcherBackend::Apibay);
        assert_eq!(config.searcher.url, "https://apibay.org");
        assert_eq!(config.ranking.min_seeds, 20);
        assert_eq!(config.ranking.policy, ScoringPolicy::QualityTier);
        assert_eq!(config.subtitles.tag, "heb");
        assert_eq!(config.notifier.backend, NotifierBackend::None);
        assert_eq!(config.notifier.progress_step_pct, 20);
        assert_eq!(config.pipeline.download_poll_interval_ms, 1000);
        assert!(config.compress.enabled);
    }

    #[test]
    fn test_deserialize_ranking_policy() {
        let toml = r#"
[ranking]
policy = "similarity"
min_seeds = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.ranking.policy, ScoringPolicy::Similarity);
        assert_eq!(config.ranking.min_seeds, 5);
    }

    #[test]
    fn test_deserialize_telegram_notifier() {
        let toml = r#"
[notifier]
backend = "telegram"
retry_attempts = 5

[notifier.telegram]
bot_token = "123:abc"
chat_id = "-100200"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.notifier.backend, NotifierBackend::Telegram);
        assert_eq!(config.notifier.retry_attempts, 5);
        let telegram = config.notifier.telegram.unwrap();
        assert_eq!(telegram.chat_id, "-100200");
        assert_eq!(telegram.api_base, "https://api.telegram.org");
    }

    #[test]
    fn test_deserialize_unknown_policy_fails() {
        let toml = r#"
[ranking]
policy = "random"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let mut config = Config::default();
        config.opensubtitles.api_key = "secret".to_string();
        config.translator.api_key = "sk-secret".to_string();

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.opensubtitles_configured);
        assert!(sanitized.translator_enabled);
        assert_eq!(sanitized.notifier, "none");

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
    }
}
