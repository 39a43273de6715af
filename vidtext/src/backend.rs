//! HTTP adapters for the summarization and translation capabilities.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::summarize::Summarizer;
use crate::translate::Translator;

pub const DEFAULT_SUMMARIZER_URL: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-cnn";

pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Abstractive summarization through a Hugging Face inference endpoint.
#[derive(Debug, Clone)]
pub struct HuggingFaceSummarizer {
    client: Client,
    api_url: String,
    token: Option<String>,
    timeout: Duration,
}

#[derive(Serialize)]
struct SummaryRequest<'a> {
    inputs: &'a str,
    parameters: SummaryParameters,
}

#[derive(Serialize)]
struct SummaryParameters {
    min_length: usize,
    max_length: usize,
    do_sample: bool,
    truncation: &'static str,
}

#[derive(Deserialize)]
struct SummaryResponse {
    summary_text: String,
}

impl HuggingFaceSummarizer {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bearer token sent with every request.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HuggingFaceSummarizer {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARIZER_URL)
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    async fn summarize_chunk(&self, text: &str, min_len: usize, max_len: usize) -> Result<String> {
        let body = SummaryRequest {
            inputs: text,
            parameters: SummaryParameters {
                min_length: min_len,
                max_length: max_len,
                do_sample: false,
                truncation: "only_first",
            },
        };

        let mut request = self.client.post(&self.api_url).timeout(self.timeout).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(summarizer_status_error(status, &detail));
        }

        let payload = response.text().await?;
        debug!(status = status.as_u16(), bytes = payload.len(), "summarizer responded");
        parse_summary(&payload)
    }
}

fn summarizer_status_error(status: StatusCode, detail: &str) -> Error {
    let message = format!("{status}: {}", detail.chars().take(200).collect::<String>());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::BackendUnavailable(message),
        _ => Error::Summarization(message),
    }
}

fn parse_summary(payload: &str) -> Result<String> {
    let items: Vec<SummaryResponse> = serde_json::from_str(payload)
        .map_err(|e| Error::Summarization(format!("unexpected response body: {e}")))?;
    items
        .into_iter()
        .next()
        .map(|item| item.summary_text)
        .ok_or_else(|| Error::Summarization("response contained no summary".into()))
}

/// Machine translation through the public Google Translate endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
    source: String,
    timeout: Duration,
}

impl GoogleTranslator {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            endpoint: DEFAULT_TRANSLATE_ENDPOINT.into(),
            source: "auto".into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Source language code, `auto` to let the backend detect it.
    pub fn source(mut self, lang: impl Into<String>) -> Self {
        self.source = lang.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }
}

impl Default for GoogleTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate_chunk(&self, text: &str, target_lang: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source.as_str()),
                ("tl", target_lang),
                ("dt", "t"),
            ])
            .form(&[("q", text)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(translator_status_error(status, &detail));
        }

        let payload = response.text().await?;
        debug!(status = status.as_u16(), bytes = payload.len(), "translator responded");
        parse_translation(&payload)
    }
}

fn translator_status_error(status: StatusCode, detail: &str) -> Error {
    let message = format!("{status}: {}", detail.chars().take(200).collect::<String>());
    if matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    ) || status.is_server_error()
    {
        Error::BackendUnavailable(message)
    } else {
        Error::Translation(message)
    }
}

/// The body is `[[["translated", "source", ...], ...], ...]`; segments are concatenated.
fn parse_translation(payload: &str) -> Result<String> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| Error::Translation(format!("unexpected response body: {e}")))?;

    let segments = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Translation("response contained no segments".into()))?;

    Ok(segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect())
}
