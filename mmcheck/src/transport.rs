//! HTTP transport seam.
//!
//! The client talks to the API through the [`Transport`] trait so
//! tests can substitute a scripted fake and exercise the capability
//! checks without a live network call. [`HttpTransport`] is the real
//! implementation over a shared `reqwest` client.

use crate::error::{ApiError, Error, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Transport used to reach the MiniMax API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body to `path` (joined onto the base URL) and
    /// return the parsed JSON response envelope.
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value>;

    /// Fetch raw bytes from an absolute URL. Used to download the
    /// probe image for the inline vision check.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// Timeout for auxiliary downloads (the probe image).
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport backed by `reqwest` with bearer authentication.
pub struct HttpTransport {
    http: reqwest::Client,
    headers: HeaderMap,
    base_url: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport with the given credentials and per-request
    /// timeout.
    pub fn new(api_key: &str, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| Error::config("API key contains invalid header characters"))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            headers,
            base_url: base_url.into(),
        })
    }

    /// Base URL this transport targets.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "issuing POST request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // The service usually still sends its status envelope in
            // the error body; surface its message when it parses.
            let text = response.text().await.unwrap_or_default();
            let msg = serde_json::from_str::<Value>(&text)
                .ok()
                .as_ref()
                .and_then(ApiError::from_envelope)
                .map_or(text, |e| e.status_msg);
            return Err(ApiError::http_status(status.as_u16(), msg).into());
        }

        Ok(response.json().await?)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!(%url, "fetching bytes");

        let response = self.http.get(url).timeout(FETCH_TIMEOUT).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::http_status(status.as_u16(), "download failed").into());
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Transport that replays scripted responses, for tests.
///
/// Responses are consumed in push order; an exhausted script yields an
/// error. Follows the same pattern as a scripted mock model: no
/// network, deterministic sequence.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value>>>,
    image: Option<Vec<u8>>,
}

impl ScriptedTransport {
    /// Create an empty scripted transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful JSON response.
    #[must_use]
    pub fn with_response(self, value: Value) -> Self {
        self.responses
            .lock()
            .expect("scripted transport poisoned")
            .push_back(Ok(value));
        self
    }

    /// Queue an error.
    #[must_use]
    pub fn with_error(self, error: Error) -> Self {
        self.responses
            .lock()
            .expect("scripted transport poisoned")
            .push_back(Err(error));
        self
    }

    /// Set the bytes returned by [`Transport::fetch_bytes`].
    #[must_use]
    pub fn with_image(mut self, bytes: Vec<u8>) -> Self {
        self.image = Some(bytes);
        self
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, _path: &str, _body: &Value) -> Result<Value> {
        self.responses
            .lock()
            .expect("scripted transport poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(Error::config("scripted transport exhausted")))
    }

    async fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>> {
        self.image
            .clone()
            .ok_or_else(|| Error::config("no scripted image"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn scripted_responses_in_order() {
        let transport = ScriptedTransport::new()
            .with_response(json!({ "first": 1 }))
            .with_response(json!({ "second": 2 }));

        let r1 = transport.post_json("/a", &json!({})).await.unwrap();
        assert_eq!(r1["first"], 1);

        let r2 = transport.post_json("/a", &json!({})).await.unwrap();
        assert_eq!(r2["second"], 2);
    }

    #[tokio::test]
    async fn scripted_exhaustion_is_an_error() {
        let transport = ScriptedTransport::new();
        let err = transport.post_json("/a", &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn scripted_error_passes_through() {
        let transport =
            ScriptedTransport::new().with_error(crate::error::ApiError::message("nope").into());
        let err = transport.post_json("/a", &json!({})).await.unwrap_err();
        assert!(err.is_declared());
    }

    #[tokio::test]
    async fn scripted_image_bytes() {
        let transport = ScriptedTransport::new().with_image(vec![1, 2, 3]);
        assert_eq!(
            transport.fetch_bytes("https://x").await.unwrap(),
            vec![1, 2, 3]
        );

        let bare = ScriptedTransport::new();
        assert!(bare.fetch_bytes("https://x").await.is_err());
    }

    #[test]
    fn http_transport_rejects_bad_key() {
        let result = HttpTransport::new("bad\nkey", "https://api", Duration::from_secs(1));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn http_transport_debug_redacts_key() {
        let transport =
            HttpTransport::new("secret", "https://api.example.com", Duration::from_secs(1))
                .unwrap();
        let debug = format!("{transport:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret"));
    }
}
