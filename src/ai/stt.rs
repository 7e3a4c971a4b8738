//! Whisper-compatible transcription client.
//!
//! `POST {base}/transcribe` with the raw captured bytes as octet-stream.
//! The device may append 0xFF padding; bytes are forwarded untouched and
//! the service is expected to tolerate them.

use crate::error::{ServerError, ServerResult};
use serde::Deserialize;
use std::time::Duration;

const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct TranscribeResponse {
    text: String,
}

#[derive(Debug, Clone)]
pub struct SttClient {
    base_url: String,
    client: reqwest::Client,
}

impl SttClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(TRANSCRIBE_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Transcribe one captured audio blob. An empty transcript is valid and
    /// flows through the rest of the pipeline.
    pub async fn transcribe(&self, audio: &[u8]) -> ServerResult<String> {
        let url = format!("{}/transcribe", self.base_url.trim_end_matches('/'));
        let res = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| ServerError::UpstreamTranscription(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ServerError::UpstreamTranscription(format!(
                "transcription service returned {status}: {body}"
            )));
        }

        let parsed: TranscribeResponse = res
            .json()
            .await
            .map_err(|e| ServerError::UpstreamTranscription(e.to_string()))?;
        Ok(parsed.text)
    }
}
