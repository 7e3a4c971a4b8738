//! Ollama generate client for the text model and the vision model.
//!
//! `POST {base}/api/generate` with `{model, prompt, stream: false}`, plus a
//! single-image `images` array for vision requests. Only the `response`
//! field of the reply is consumed.

use crate::error::{ServerError, ServerResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GENERATE_TIMEOUT: Duration = Duration::from_secs(30);
const VISION_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<[&'a str; 1]>,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    base_url: String,
    text_model: String,
    vision_model: String,
    client: reqwest::Client,
}

impl LlmClient {
    pub fn new(
        base_url: impl Into<String>,
        text_model: impl Into<String>,
        vision_model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            text_model: text_model.into(),
            vision_model: vision_model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// One text completion against the configured text model.
    pub async fn generate(&self, prompt: &str) -> ServerResult<String> {
        self.request(&self.text_model, prompt, None, GENERATE_TIMEOUT)
            .await
            .map_err(ServerError::UpstreamLlm)
    }

    /// One vision completion: the prompt plus a single base64 JPEG.
    pub async fn generate_vision(&self, prompt: &str, image_base64: &str) -> ServerResult<String> {
        self.request(&self.vision_model, prompt, Some(image_base64), VISION_TIMEOUT)
            .await
            .map_err(ServerError::UpstreamVision)
    }

    async fn request(
        &self,
        model: &str,
        prompt: &str,
        image: Option<&str>,
        timeout: Duration,
    ) -> Result<String, String> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let body = GenerateRequest {
            model,
            prompt,
            images: image.map(|img| [img]),
            stream: false,
        };

        let res = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("Ollama returned {status}: {body}"));
        }

        let parsed: GenerateResponse = res.json().await.map_err(|e| e.to_string())?;
        Ok(parsed.response)
    }
}
