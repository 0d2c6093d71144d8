use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::Collector;
use crate::kernel::error::IvrError;
use crate::kernel::menu::Prompt;
use crate::kernel::options::CollectOptions;
use crate::kernel::result::CollectResult;

// Playback plus recognition. The recognizer's own timeout lives in the options.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const KNOWN_STATUSES: [&str; 5] = ["match", "no-input", "no-match", "stop", "hangup"];

/// Collector backed by a media server speaking JSON over HTTP.
///
/// POST `{base_url}/collect` with `{ "prompt": .., "options": .. }`,
/// answered by a `CollectResult` tagged on `status`.
#[derive(Clone)]
pub struct HttpCollector {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct CollectRequest<'a> {
    prompt: &'a Prompt,
    options: &'a CollectOptions,
}

impl HttpCollector {
    pub fn new(base_url: impl Into<String>) -> Result<Self, IvrError> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, IvrError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Uses a caller-configured client (proxies, TLS, pooling).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/collect", self.base_url)
    }
}

/// Decodes a collector reply. Unknown `status` values are a contract
/// violation, not a retryable outcome.
pub fn decode_result(body: &str) -> Result<CollectResult, IvrError> {
    let value: Value = serde_json::from_str(body)?;
    match value.get("status").and_then(Value::as_str) {
        Some(status) if KNOWN_STATUSES.contains(&status) => Ok(serde_json::from_value(value)?),
        Some(status) => Err(IvrError::ContractViolation(format!("unknown outcome kind '{}'", status))),
        None => Err(IvrError::ContractViolation("reply carries no status".to_string())),
    }
}

#[async_trait]
impl Collector for HttpCollector {
    async fn collect(&self, prompt: &Prompt, options: &CollectOptions) -> Result<CollectResult, IvrError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&CollectRequest { prompt, options })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IvrError::Collector(format!("media server returned {}", response.status())));
        }

        let body = response.text().await?;
        debug!("Collector replied with {} bytes", body.len());
        decode_result(&body)
    }
}
