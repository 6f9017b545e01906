//! Capability checks and outcome classification.
//!
//! Each check builds the documented request shape for one API
//! feature, issues exactly one bounded request, and folds every
//! possible error into a [`CheckOutcome`] — no error escapes a check.
//! Checks run strictly sequentially; nothing is retried.

use crate::chat::ChatRequest;
use crate::client::MiniMaxClient;
use crate::error::Error;
use crate::message::{ChatMessage, data_uri};
use crate::speech::{AudioSetting, SpeechRequest, VoiceSetting};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

const CHAT_SYSTEM_PROMPT: &str = "你是一个专业的传记采访者。";
const CHAT_USER_PROMPT: &str = "你好，我想为我父亲写一本传记，他今年70岁了。";

const SPEECH_SAMPLE_TEXT: &str = "你好，我是时光手记的 AI 采访助手。很高兴能陪你一起记录人生故事。";

const VISION_URL_PROMPT: &str = "描述这张图片，如果里面有人的话，告诉我他们在做什么。";
const VISION_INLINE_PROMPT: &str = "简单描述这张图片的内容。";

const ROLEPLAY_SYSTEM_PROMPT: &str = "你是一位经验丰富的传记采访者，擅长：
1. 用温和的语气引导受访者打开心扉
2. 从具体细节入手，逐步深入到情感和意义
3. 善于追问，但不让人感到被审问

你现在要采访一位老人，聊聊他的大学时光。请用自然、口语化的中文进行对话。";
const ROLEPLAY_USER_PROMPT: &str = "你好，我想聊聊我的大学时光。我是1975年上的大学。";
const ROLEPLAY_TEMPERATURE: f32 = 0.7;

/// One API feature exercised by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Plain chat completion.
    Chat,
    /// Text-to-speech synthesis.
    Speech,
    /// Image understanding with a remote image URL.
    VisionUrl,
    /// Image understanding with image bytes embedded as a data URI.
    VisionInline,
    /// Chat completion under a role-play system prompt.
    RolePlay,
}

impl Capability {
    /// All capabilities, in execution order.
    pub const ALL: [Self; 5] = [
        Self::Chat,
        Self::Speech,
        Self::VisionUrl,
        Self::VisionInline,
        Self::RolePlay,
    ];

    /// Short machine-friendly name, accepted by [`Capability::from_str`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Speech => "speech",
            Self::VisionUrl => "vision-url",
            Self::VisionInline => "vision-inline",
            Self::RolePlay => "roleplay",
        }
    }

    /// Human-readable title for reports.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Chat => "text chat",
            Self::Speech => "speech synthesis",
            Self::VisionUrl => "image understanding (URL)",
            Self::VisionInline => "image understanding (inline)",
            Self::RolePlay => "role-play persona",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown capability '{s}' (expected one of: chat, speech, vision-url, vision-inline, roleplay)"))
    }
}

/// How a single capability check concluded. Exactly one of these is
/// produced per check — never silence, never a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The expected success field was present and well-formed.
    Passed {
        /// Short human-readable detail (reply preview, artifact info).
        detail: String,
    },
    /// The service itself declared a failure.
    Declined {
        /// The declared status message.
        message: String,
    },
    /// The service declined in a way that reads as a missing feature
    /// rather than a broken one.
    Unsupported {
        /// The declared status message.
        message: String,
    },
    /// Transport failure, timeout, or malformed response.
    Failed {
        /// Description of what went wrong.
        error: String,
    },
}

impl CheckOutcome {
    /// True only for [`CheckOutcome::Passed`].
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    /// Short status label for summaries.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed { .. } => "PASS",
            Self::Declined { .. } => "FAIL",
            Self::Unsupported { .. } => "INCONCLUSIVE",
            Self::Failed { .. } => "ERROR",
        }
    }
}

/// Report for one executed check.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Which capability was exercised.
    pub capability: Capability,
    /// How it concluded.
    pub outcome: CheckOutcome,
}

/// Options shared by the capability checks.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Chat model for the text, vision and role-play checks.
    pub chat_model: String,
    /// Speech-synthesis model.
    pub speech_model: String,
    /// Voice parameters for the speech check.
    pub voice: VoiceSetting,
    /// Audio output parameters for the speech check.
    pub audio: AudioSetting,
    /// Probe image used by both vision modes.
    pub image_url: String,
    /// Where the synthesized audio artifact is written. Overwritten
    /// on each run.
    pub artifact_path: PathBuf,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            chat_model: crate::chat::DEFAULT_CHAT_MODEL.to_string(),
            speech_model: crate::speech::DEFAULT_SPEECH_MODEL.to_string(),
            voice: VoiceSetting::default(),
            audio: AudioSetting::default(),
            image_url: "https://picsum.photos/400/300".to_string(),
            artifact_path: PathBuf::from("test_output.mp3"),
        }
    }
}

/// Fold an operation error into an outcome. Declared failures map to
/// [`CheckOutcome::Declined`], or to [`CheckOutcome::Unsupported`]
/// for the vision checks where a refusal usually means the model
/// lacks the capability.
fn classify_error(error: Error, soft_decline: bool) -> CheckOutcome {
    match error {
        Error::Api(api) if soft_decline => CheckOutcome::Unsupported {
            message: api.to_string(),
        },
        Error::Api(api) => CheckOutcome::Declined {
            message: api.to_string(),
        },
        other => CheckOutcome::Failed {
            error: other.to_string(),
        },
    }
}

/// Truncate a reply for display without splitting a character.
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}...")
}

/// Exercise plain chat completion with a system + user prompt.
pub async fn check_chat(client: &MiniMaxClient, options: &CheckOptions) -> CheckReport {
    let request = ChatRequest::new(
        &options.chat_model,
        vec![
            ChatMessage::system(CHAT_SYSTEM_PROMPT),
            ChatMessage::user(CHAT_USER_PROMPT),
        ],
    );

    let outcome = match client.chat(&request).await {
        Ok(reply) => CheckOutcome::Passed {
            detail: format!("reply: {}", preview(&reply.content, 100)),
        },
        Err(e) => classify_error(e, false),
    };

    CheckReport {
        capability: Capability::Chat,
        outcome,
    }
}

/// Exercise speech synthesis and persist the decoded audio artifact.
pub async fn check_speech(client: &MiniMaxClient, options: &CheckOptions) -> CheckReport {
    let request = SpeechRequest::new(SPEECH_SAMPLE_TEXT)
        .with_model(&options.speech_model)
        .with_voice(options.voice.clone())
        .with_audio(options.audio.clone());

    let outcome = match synthesize_and_persist(client, options, &request).await {
        Ok(detail) => CheckOutcome::Passed { detail },
        Err(e) => classify_error(e, false),
    };

    CheckReport {
        capability: Capability::Speech,
        outcome,
    }
}

async fn synthesize_and_persist(
    client: &MiniMaxClient,
    options: &CheckOptions,
    request: &SpeechRequest,
) -> crate::Result<String> {
    let audio = client.synthesize(request).await?;

    // Nothing is written on a declared failure; the write only
    // happens once the payload decoded.
    tokio::fs::write(&options.artifact_path, &audio.bytes).await?;
    debug!(path = %options.artifact_path.display(), bytes = audio.bytes.len(), "artifact written");

    let mut detail = format!(
        "{} bytes written to {}",
        audio.bytes.len(),
        options.artifact_path.display()
    );
    if let Some(ms) = audio.extra.audio_length {
        detail.push_str(&format!(", duration {ms}ms"));
    }
    if let Some(chars) = audio.extra.usage_characters {
        detail.push_str(&format!(", {chars} characters"));
    }

    Ok(detail)
}

/// Exercise image understanding with a remotely hosted image URL.
pub async fn check_vision_url(client: &MiniMaxClient, options: &CheckOptions) -> CheckReport {
    let request = ChatRequest::new(
        &options.chat_model,
        vec![ChatMessage::user_with_image(
            VISION_URL_PROMPT,
            options.image_url.clone(),
        )],
    );

    let outcome = match client.chat(&request).await {
        Ok(reply) => CheckOutcome::Passed {
            detail: format!("description: {}", preview(&reply.content, 150)),
        },
        Err(e) => classify_error(e, true),
    };

    CheckReport {
        capability: Capability::VisionUrl,
        outcome,
    }
}

/// Exercise image understanding with image bytes embedded as a data
/// URI. The probe image is downloaded first; a failed download is an
/// exceptional outcome, not a declared one.
pub async fn check_vision_inline(client: &MiniMaxClient, options: &CheckOptions) -> CheckReport {
    let outcome = match client.fetch_image(&options.image_url).await {
        Ok(bytes) => {
            let request = ChatRequest::new(
                &options.chat_model,
                vec![ChatMessage::user_with_image(
                    VISION_INLINE_PROMPT,
                    data_uri("image/jpeg", &bytes),
                )],
            );

            match client.chat(&request).await {
                Ok(reply) => CheckOutcome::Passed {
                    detail: format!("description: {}", preview(&reply.content, 150)),
                },
                Err(e) => classify_error(e, true),
            }
        }
        Err(e) => {
            warn!(error = %e, "could not download probe image");
            CheckOutcome::Failed {
                error: format!("could not download probe image: {e}"),
            }
        }
    };

    CheckReport {
        capability: Capability::VisionInline,
        outcome,
    }
}

/// Exercise chat completion under a role-play persona prompt.
pub async fn check_roleplay(client: &MiniMaxClient, options: &CheckOptions) -> CheckReport {
    let request = ChatRequest::new(
        &options.chat_model,
        vec![
            ChatMessage::system(ROLEPLAY_SYSTEM_PROMPT),
            ChatMessage::user(ROLEPLAY_USER_PROMPT),
        ],
    )
    .with_temperature(ROLEPLAY_TEMPERATURE);

    let outcome = match client.chat(&request).await {
        Ok(reply) => CheckOutcome::Passed {
            detail: format!("reply: {}", preview(&reply.content, 150)),
        },
        Err(e) => classify_error(e, false),
    };

    CheckReport {
        capability: Capability::RolePlay,
        outcome,
    }
}

/// Run a single capability check.
pub async fn run_one(
    client: &MiniMaxClient,
    options: &CheckOptions,
    capability: Capability,
) -> CheckReport {
    match capability {
        Capability::Chat => check_chat(client, options).await,
        Capability::Speech => check_speech(client, options).await,
        Capability::VisionUrl => check_vision_url(client, options).await,
        Capability::VisionInline => check_vision_inline(client, options).await,
        Capability::RolePlay => check_roleplay(client, options).await,
    }
}

/// Run the given checks strictly in order, one request at a time.
pub async fn run_all(
    client: &MiniMaxClient,
    options: &CheckOptions,
    capabilities: &[Capability],
) -> Summary {
    let mut summary = Summary::default();
    for &capability in capabilities {
        summary.push(run_one(client, options, capability).await);
    }
    summary
}

/// Aggregated results of a probe run.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    reports: Vec<CheckReport>,
}

impl Summary {
    /// Build a summary from collected reports.
    #[must_use]
    pub fn new(reports: Vec<CheckReport>) -> Self {
        Self { reports }
    }

    /// Append one report.
    pub fn push(&mut self, report: CheckReport) {
        self.reports.push(report);
    }

    /// All reports, in execution order.
    #[must_use]
    pub fn reports(&self) -> &[CheckReport] {
        &self.reports
    }

    /// Number of checks executed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    /// Number of checks that passed.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome.is_passed())
            .count()
    }

    /// Number of checks whose capability looked unsupported.
    #[must_use]
    pub fn unsupported(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, CheckOutcome::Unsupported { .. }))
            .count()
    }

    /// Number of checks that failed outright (declared failure or
    /// exceptional error).
    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.passed() - self.unsupported()
    }

    /// True when every executed check passed. An unsupported
    /// capability still keeps this false.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.passed() == self.total()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::transport::ScriptedTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn client_with(transport: ScriptedTransport) -> MiniMaxClient {
        MiniMaxClient::with_transport(Arc::new(transport))
    }

    fn chat_success_envelope(content: &str) -> serde_json::Value {
        json!({
            "choices": [ { "message": { "role": "assistant", "content": content } } ],
            "base_resp": { "status_code": 0, "status_msg": "success" }
        })
    }

    fn declined_envelope(msg: &str) -> serde_json::Value {
        json!({ "base_resp": { "status_code": 1004, "status_msg": msg } })
    }

    #[tokio::test]
    async fn chat_success_is_passed() {
        let client = client_with(
            ScriptedTransport::new().with_response(chat_success_envelope("好的，我们开始吧。")),
        );
        let report = check_chat(&client, &CheckOptions::default()).await;

        assert_eq!(report.capability, Capability::Chat);
        assert!(report.outcome.is_passed());
    }

    #[tokio::test]
    async fn chat_declared_failure_is_declined() {
        let client = client_with(
            ScriptedTransport::new().with_response(declined_envelope("invalid api key")),
        );
        let report = check_chat(&client, &CheckOptions::default()).await;

        match report.outcome {
            CheckOutcome::Declined { ref message } => {
                assert!(message.contains("invalid api key"));
            }
            ref other => panic!("expected Declined, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn chat_transport_error_is_failed() {
        let client = client_with(
            ScriptedTransport::new().with_error(Error::audio("boom")),
        );
        let report = check_chat(&client, &CheckOptions::default()).await;
        assert!(matches!(report.outcome, CheckOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn vision_declared_failure_reads_as_unsupported() {
        // HTTP 200 but no choices: inconclusive, not broken.
        let client = client_with(ScriptedTransport::new().with_response(json!({
            "base_resp": { "status_code": 0, "status_msg": "" }
        })));
        let report = check_vision_url(&client, &CheckOptions::default()).await;

        assert!(matches!(
            report.outcome,
            CheckOutcome::Unsupported { .. }
        ));
    }

    #[tokio::test]
    async fn vision_inline_embeds_downloaded_image() {
        let client = client_with(
            ScriptedTransport::new()
                .with_image(vec![0xff, 0xd8, 0xff, 0xe0])
                .with_response(chat_success_envelope("一张测试图片。")),
        );
        let report = check_vision_inline(&client, &CheckOptions::default()).await;
        assert!(report.outcome.is_passed());
    }

    #[tokio::test]
    async fn vision_inline_download_failure_is_exceptional() {
        let client = client_with(
            ScriptedTransport::new().with_response(chat_success_envelope("unreachable")),
        );
        let report = check_vision_inline(&client, &CheckOptions::default()).await;

        match report.outcome {
            CheckOutcome::Failed { ref error } => {
                assert!(error.contains("probe image"));
            }
            ref other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn speech_success_writes_artifact_of_decoded_length() {
        let temp = assert_fs::TempDir::new().unwrap();
        let artifact = temp.path().join("out.mp3");

        let hex_payload = "49443304deadbeef";
        let client = client_with(ScriptedTransport::new().with_response(json!({
            "data": { "audio": hex_payload },
            "extra_info": { "audio_length": 1200, "usage_characters": 30 },
            "base_resp": { "status_code": 0, "status_msg": "success" }
        })));

        let options = CheckOptions {
            artifact_path: artifact.clone(),
            ..CheckOptions::default()
        };
        let report = check_speech(&client, &options).await;

        assert!(report.outcome.is_passed());
        let written = std::fs::metadata(&artifact).unwrap().len();
        assert_eq!(written, (hex_payload.len() / 2) as u64);
    }

    #[tokio::test]
    async fn speech_declared_failure_writes_nothing() {
        let temp = assert_fs::TempDir::new().unwrap();
        let artifact = temp.path().join("out.mp3");

        let client = client_with(
            ScriptedTransport::new().with_response(declined_envelope("invalid api key")),
        );

        let options = CheckOptions {
            artifact_path: artifact.clone(),
            ..CheckOptions::default()
        };
        let report = check_speech(&client, &options).await;

        assert!(matches!(report.outcome, CheckOutcome::Declined { .. }));
        assert!(!artifact.exists());
    }

    #[tokio::test]
    async fn run_all_reports_in_execution_order() {
        // chat passes, speech declines, vision-url unsupported,
        // vision-inline fails on download, roleplay passes.
        let transport = ScriptedTransport::new()
            .with_response(chat_success_envelope("one"))
            .with_response(declined_envelope("invalid api key"))
            .with_response(json!({ "base_resp": { "status_code": 0, "status_msg": "" } }))
            .with_response(chat_success_envelope("five"));
        let client = client_with(transport);

        let temp = assert_fs::TempDir::new().unwrap();
        let options = CheckOptions {
            artifact_path: temp.path().join("out.mp3"),
            ..CheckOptions::default()
        };

        let summary = run_all(&client, &options, &Capability::ALL).await;

        let caps: Vec<Capability> = summary.reports().iter().map(|r| r.capability).collect();
        assert_eq!(caps, Capability::ALL.to_vec());

        assert_eq!(summary.total(), 5);
        assert_eq!(summary.passed(), 2);
        assert_eq!(summary.unsupported(), 1);
        assert_eq!(summary.failed(), 2);
        assert!(!summary.all_passed());
    }

    #[tokio::test]
    async fn every_check_yields_exactly_one_outcome() {
        // A transport with nothing scripted errors on every call;
        // all five checks must still produce a report each.
        let client = client_with(ScriptedTransport::new());
        let options = CheckOptions::default();

        let summary = run_all(&client, &options, &Capability::ALL).await;
        assert_eq!(summary.total(), Capability::ALL.len());
        assert_eq!(summary.passed(), 0);
    }

    #[test]
    fn aggregate_pass_count_matches_passed_reports() {
        let summary = Summary::new(vec![
            CheckReport {
                capability: Capability::Chat,
                outcome: CheckOutcome::Passed { detail: "ok".into() },
            },
            CheckReport {
                capability: Capability::Speech,
                outcome: CheckOutcome::Declined { message: "no".into() },
            },
            CheckReport {
                capability: Capability::VisionUrl,
                outcome: CheckOutcome::Passed { detail: "ok".into() },
            },
        ]);
        assert_eq!(summary.passed(), 2);
        assert_eq!(summary.failed(), 1);
    }

    #[test]
    fn capability_from_str_round_trips() {
        for capability in Capability::ALL {
            assert_eq!(capability.name().parse::<Capability>().unwrap(), capability);
        }
        assert!("nonsense".parse::<Capability>().is_err());
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let text = "你好世界你好世界";
        assert_eq!(preview(text, 4), "你好世界...");
        assert_eq!(preview("short", 100), "short");
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(
            CheckOutcome::Passed { detail: String::new() }.label(),
            "PASS"
        );
        assert_eq!(
            CheckOutcome::Unsupported { message: String::new() }.label(),
            "INCONCLUSIVE"
        );
    }

    #[test]
    fn declared_error_display_feeds_outcome_message() {
        let outcome = classify_error(ApiError::new(2049, "invalid api key").into(), false);
        match outcome {
            CheckOutcome::Declined { message } => {
                assert!(message.contains("invalid api key"));
                assert!(message.contains("2049"));
            }
            other => panic!("expected Declined, got {other:?}"),
        }
    }
}
