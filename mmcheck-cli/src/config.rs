//! Configuration for the probe CLI.
//!
//! Settings come from, in increasing precedence: serde defaults, the
//! config file (`~/.mmcheck/config.toml`), environment variables, and
//! command-line flags. The file is optional; every field has a
//! default matching the documented probe payloads.

use mmcheck::check::CheckOptions;
use mmcheck::speech::{AudioSetting, VoiceSetting};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// API credentials and endpoint.
    #[serde(default)]
    pub api: ApiConfig,

    /// Chat check settings.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Speech-synthesis check settings.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Vision check settings.
    #[serde(default)]
    pub vision: VisionConfig,
}

impl ProbeConfig {
    /// Build the shared check options from this configuration.
    #[must_use]
    pub fn check_options(&self) -> CheckOptions {
        CheckOptions {
            chat_model: self.chat.model.clone(),
            speech_model: self.speech.model.clone(),
            voice: VoiceSetting {
                voice_id: self.speech.voice_id.clone(),
                speed: self.speech.speed,
                vol: self.speech.vol,
                pitch: self.speech.pitch,
            },
            audio: AudioSetting {
                sample_rate: self.speech.sample_rate,
                bitrate: self.speech.bitrate,
                format: self.speech.format.clone(),
            },
            image_url: self.vision.image_url.clone(),
            artifact_path: self.speech.output.clone(),
        }
    }
}

/// API credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API key. Usually left unset here and supplied through
    /// `MINIMAX_API_KEY` or `--api-key` instead.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    mmcheck::client::MINIMAX_API_BASE_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    mmcheck::client::DEFAULT_TIMEOUT_SECS
}

/// Chat check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Chat model, also used by the vision and role-play checks.
    #[serde(default = "default_chat_model")]
    pub model: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
        }
    }
}

fn default_chat_model() -> String {
    mmcheck::chat::DEFAULT_CHAT_MODEL.to_string()
}

/// Speech-synthesis check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Speech model.
    #[serde(default = "default_speech_model")]
    pub model: String,
    /// Voice identifier.
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    /// Speaking speed multiplier.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Volume multiplier.
    #[serde(default = "default_vol")]
    pub vol: f32,
    /// Pitch shift.
    #[serde(default)]
    pub pitch: i32,
    /// Sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Bitrate in bits per second.
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,
    /// Container format.
    #[serde(default = "default_format")]
    pub format: String,
    /// Artifact path, overwritten on each run.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model: default_speech_model(),
            voice_id: default_voice_id(),
            speed: default_speed(),
            vol: default_vol(),
            pitch: 0,
            sample_rate: default_sample_rate(),
            bitrate: default_bitrate(),
            format: default_format(),
            output: default_output(),
        }
    }
}

fn default_speech_model() -> String {
    mmcheck::speech::DEFAULT_SPEECH_MODEL.to_string()
}

fn default_voice_id() -> String {
    "male-qn-qingse".to_string()
}

const fn default_speed() -> f32 {
    1.0
}

const fn default_vol() -> f32 {
    1.0
}

const fn default_sample_rate() -> u32 {
    32_000
}

const fn default_bitrate() -> u32 {
    128_000
}

fn default_format() -> String {
    "mp3".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("test_output.mp3")
}

/// Vision check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Probe image used by both vision modes.
    #[serde(default = "default_image_url")]
    pub image_url: String,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            image_url: default_image_url(),
        }
    }
}

fn default_image_url() -> String {
    "https://picsum.photos/400/300".to_string()
}

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mmcheck")
}

/// Get the default config file path.
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from a specific path. A missing file yields the
/// defaults.
pub async fn load_config_from(path: &Path) -> ConfigResult<ProbeConfig> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(ProbeConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: ProbeConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Save configuration to a specific path, creating the directory if
/// needed.
pub async fn save_config_to(config: &ProbeConfig, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = toml::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), "saved config file");

    Ok(())
}
