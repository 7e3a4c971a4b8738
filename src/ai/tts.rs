//! Piper-compatible speech synthesis client.
//!
//! `POST {base}/synthesize` with `{text, format: "wav"}`; the response body
//! is the raw WAV, no JSON wrapping. The response Content-Type is not
//! relied upon.

use crate::error::{ServerError, ServerResult};
use serde::Serialize;
use std::time::Duration;

const SYNTHESIZE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    format: &'a str,
}

#[derive(Debug, Clone)]
pub struct TtsClient {
    base_url: String,
    client: reqwest::Client,
}

impl TtsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SYNTHESIZE_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Synthesize `text` to WAV bytes (44-byte header + 16 kHz 16-bit mono
    /// PCM, the format the device plays back).
    pub async fn synthesize(&self, text: &str) -> ServerResult<Vec<u8>> {
        let url = format!("{}/synthesize", self.base_url.trim_end_matches('/'));
        let res = self
            .client
            .post(&url)
            .json(&SynthesizeRequest {
                text,
                format: "wav",
            })
            .send()
            .await
            .map_err(|e| ServerError::UpstreamSynthesis(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ServerError::UpstreamSynthesis(format!(
                "TTS service returned {status}: {body}"
            )));
        }

        let bytes = res
            .bytes()
            .await
            .map_err(|e| ServerError::UpstreamSynthesis(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
