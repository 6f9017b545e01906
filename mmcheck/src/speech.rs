//! Text-to-speech requests and audio payload decoding.
//!
//! The `t2a_v2` endpoint returns synthesized audio as a hexadecimal
//! string under `data.audio`, with opportunistic metadata in
//! `extra_info`.

use crate::error::{ApiError, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default speech-synthesis model.
pub const DEFAULT_SPEECH_MODEL: &str = "speech-01-turbo";

/// A text-to-speech request body.
#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest {
    /// Model identifier.
    pub model: String,
    /// Text to synthesize.
    pub text: String,
    /// Streaming flag; the probe always requests a single response.
    pub stream: bool,
    /// Voice parameters.
    pub voice_setting: VoiceSetting,
    /// Output audio parameters.
    pub audio_setting: AudioSetting,
}

impl SpeechRequest {
    /// Create a request for the given text with default model, voice
    /// and audio settings.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_SPEECH_MODEL.to_string(),
            text: text.into(),
            stream: false,
            voice_setting: VoiceSetting::default(),
            audio_setting: AudioSetting::default(),
        }
    }

    /// Set the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the voice parameters.
    #[must_use]
    pub fn with_voice(mut self, voice: VoiceSetting) -> Self {
        self.voice_setting = voice;
        self
    }

    /// Set the audio output parameters.
    #[must_use]
    pub fn with_audio(mut self, audio: AudioSetting) -> Self {
        self.audio_setting = audio;
        self
    }
}

/// Voice parameters for speech synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSetting {
    /// Voice identifier.
    pub voice_id: String,
    /// Speaking speed multiplier.
    pub speed: f32,
    /// Volume multiplier.
    pub vol: f32,
    /// Pitch shift.
    pub pitch: i32,
}

impl Default for VoiceSetting {
    fn default() -> Self {
        Self {
            voice_id: "male-qn-qingse".to_string(),
            speed: 1.0,
            vol: 1.0,
            pitch: 0,
        }
    }
}

/// Output audio parameters for speech synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSetting {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bitrate in bits per second.
    pub bitrate: u32,
    /// Container format, e.g. `mp3`.
    pub format: String,
}

impl Default for AudioSetting {
    fn default() -> Self {
        Self {
            sample_rate: 32_000,
            bitrate: 128_000,
            format: "mp3".to_string(),
        }
    }
}

/// Opportunistic metadata reported alongside the audio. None of these
/// fields is required for success classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ExtraInfo {
    /// Audio duration in milliseconds.
    pub audio_length: Option<u64>,
    /// Audio size in bytes, as reported by the provider.
    pub audio_size: Option<u64>,
    /// Characters billed for the synthesis.
    pub usage_characters: Option<u64>,
}

/// Decoded audio plus response metadata.
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    /// Raw audio bytes, decoded from the hexadecimal payload.
    pub bytes: Vec<u8>,
    /// Metadata fields, when present.
    pub extra: ExtraInfo,
}

/// Interpret a text-to-speech response envelope.
///
/// Success requires a non-empty `data.audio` hexadecimal string; its
/// absence surfaces the declared `base_resp` message ("unknown error"
/// when the envelope is silent). Malformed hex is a local decode
/// error, not a declared failure.
pub(crate) fn parse_audio(json: &Value) -> Result<SpeechAudio> {
    let audio_hex = json.pointer("/data/audio").and_then(Value::as_str);

    let Some(audio_hex) = audio_hex.filter(|h| !h.is_empty()) else {
        let err = ApiError::from_envelope(json)
            .unwrap_or_else(|| ApiError::message("unknown error"));
        return Err(err.into());
    };

    let bytes =
        hex::decode(audio_hex).map_err(|e| Error::audio(format!("invalid hex payload: {e}")))?;

    let extra = json
        .get("extra_info")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    Ok(SpeechAudio { bytes, extra })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_wire_shape_with_defaults() {
        let request = SpeechRequest::new("你好，我是 AI 采访助手。");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "speech-01-turbo");
        assert_eq!(value["stream"], false);
        assert_eq!(value["voice_setting"]["voice_id"], "male-qn-qingse");
        assert!((value["voice_setting"]["speed"].as_f64().unwrap() - 1.0).abs() < 1e-6);
        assert_eq!(value["voice_setting"]["pitch"], 0);
        assert_eq!(value["audio_setting"]["sample_rate"], 32_000);
        assert_eq!(value["audio_setting"]["bitrate"], 128_000);
        assert_eq!(value["audio_setting"]["format"], "mp3");
    }

    #[test]
    fn decodes_hex_audio() {
        let json = json!({
            "data": { "audio": "deadbeef" },
            "extra_info": { "audio_length": 1500, "audio_size": 4, "usage_characters": 30 },
            "base_resp": { "status_code": 0, "status_msg": "success" }
        });
        let audio = parse_audio(&json).unwrap();

        // Decoded length is exactly half the hex string length.
        assert_eq!(audio.bytes.len(), 4);
        assert_eq!(audio.bytes, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(audio.extra.audio_length, Some(1500));
        assert_eq!(audio.extra.audio_size, Some(4));
        assert_eq!(audio.extra.usage_characters, Some(30));
    }

    #[test]
    fn metadata_is_optional() {
        let json = json!({ "data": { "audio": "00" } });
        let audio = parse_audio(&json).unwrap();
        assert_eq!(audio.extra, ExtraInfo::default());
    }

    #[test]
    fn missing_audio_surfaces_declared_message() {
        let json = json!({
            "base_resp": { "status_code": 1004, "status_msg": "invalid api key" }
        });
        let err = parse_audio(&json).unwrap_err();
        assert!(err.is_declared());
        assert!(err.to_string().contains("invalid api key"));
    }

    #[test]
    fn missing_audio_without_envelope_is_unknown_error() {
        let err = parse_audio(&json!({})).unwrap_err();
        assert!(err.is_declared());
        assert!(err.to_string().contains("unknown error"));
    }

    #[test]
    fn empty_audio_string_is_declared() {
        let json = json!({ "data": { "audio": "" } });
        assert!(parse_audio(&json).unwrap_err().is_declared());
    }

    #[test]
    fn malformed_hex_is_a_decode_error() {
        let json = json!({ "data": { "audio": "zz-not-hex" } });
        let err = parse_audio(&json).unwrap_err();
        assert!(matches!(err, Error::Audio(_)));
        assert!(!err.is_declared());
    }
}
