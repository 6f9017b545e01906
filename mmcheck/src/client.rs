//! MiniMax API client.

use crate::chat::{ChatReply, ChatRequest};
use crate::error::{Error, Result};
use crate::speech::{SpeechAudio, SpeechRequest};
use crate::transport::{HttpTransport, Transport};
use crate::{chat, speech};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Default MiniMax API base URL.
pub const MINIMAX_API_BASE_URL: &str = "https://api.minimaxi.com/v1";

/// Chat-completion endpoint path. Also serves image understanding,
/// with the image supplied inline in the message content.
pub const CHAT_COMPLETION_PATH: &str = "/text/chatcompletion_v2";

/// Text-to-speech endpoint path.
pub const TEXT_TO_AUDIO_PATH: &str = "/t2a_v2";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// MiniMax API client.
///
/// # Example
///
/// ```rust,ignore
/// use mmcheck::MiniMaxClient;
///
/// // From environment variable MINIMAX_API_KEY
/// let client = MiniMaxClient::from_env()?;
///
/// // With explicit API key
/// let client = MiniMaxClient::new("sk-api-...")?;
///
/// // With custom base URL and timeout
/// let client = MiniMaxClient::builder()
///     .api_key("sk-api-...")
///     .base_url("https://my-proxy.example.com/v1")
///     .timeout_secs(10)
///     .build()?;
/// ```
#[derive(Clone)]
pub struct MiniMaxClient {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for MiniMaxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniMaxClient").finish_non_exhaustive()
    }
}

impl MiniMaxClient {
    /// Create a client with the given API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> MiniMaxClientBuilder {
        MiniMaxClientBuilder::default()
    }

    /// Create a client from environment variables.
    ///
    /// Uses `MINIMAX_API_KEY` for the API key and optionally
    /// `MINIMAX_BASE_URL` for a custom base URL.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("MINIMAX_API_KEY")
            .map_err(|_| Error::config("MINIMAX_API_KEY environment variable not set"))?;

        let mut builder = Self::builder().api_key(api_key);

        if let Ok(base_url) = std::env::var("MINIMAX_BASE_URL") {
            builder = builder.base_url(base_url);
        }

        builder.build()
    }

    /// Create a client over a caller-supplied transport. Used by
    /// tests to run checks against a scripted fake.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send a chat-completion request and extract the assistant
    /// reply.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let body = serde_json::to_value(request)?;
        let json = self.transport.post_json(CHAT_COMPLETION_PATH, &body).await?;
        chat::parse_reply(&json)
    }

    /// Send a text-to-speech request and decode the audio payload.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechAudio> {
        let body = serde_json::to_value(request)?;
        let json = self.transport.post_json(TEXT_TO_AUDIO_PATH, &body).await?;
        speech::parse_audio(&json)
    }

    /// Download raw bytes from an absolute URL (the probe image for
    /// the inline vision check).
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        self.transport.fetch_bytes(url).await
    }
}

/// Builder for [`MiniMaxClient`].
#[derive(Debug, Default)]
pub struct MiniMaxClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl MiniMaxClientBuilder {
    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set a custom base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the per-request timeout in seconds.
    #[must_use]
    pub const fn timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<MiniMaxClient> {
        let api_key = self
            .api_key
            .ok_or_else(|| Error::config("API key is required"))?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| MINIMAX_API_BASE_URL.to_string());
        let timeout = Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let transport = HttpTransport::new(&api_key, base_url, timeout)?;

        Ok(MiniMaxClient {
            transport: Arc::new(transport),
        })
    }
}
