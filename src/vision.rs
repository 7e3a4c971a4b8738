//! Vision Orchestrator: image → VLM analysis → monitoring verdict →
//! optional spoken alert.
//!
//! VLM failure fails the request; TTS failure here is non-fatal and the
//! response just carries no audio.

use crate::ai::{LlmClient, TtsClient};
use crate::error::{ServerError, ServerResult};
use crate::models::{ImageAnalyzerRequest, ImageAnalyzerResponse, ImageAnalyzerResponseData};
use crate::prompts;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_PROMPT: &str = "what's in the picture?";

/// Analysis kinds the device requests.
pub const KIND_RECOGNIZE: i64 = 0;
pub const KIND_MONITORING: i64 = 1;

pub struct VisionOrchestrator {
    llm: Arc<LlmClient>,
    tts: Arc<TtsClient>,
}

impl VisionOrchestrator {
    pub fn new(llm: Arc<LlmClient>, tts: Arc<TtsClient>) -> Self {
        Self { llm, tts }
    }

    pub async fn analyze(&self, req: ImageAnalyzerRequest) -> ServerResult<ImageAnalyzerResponse> {
        if req.img.is_empty() {
            return Err(ServerError::BadRequest("no image provided".to_string()));
        }

        let prompt = if req.prompt.is_empty() {
            DEFAULT_PROMPT
        } else {
            req.prompt.as_str()
        };
        info!(
            target: "sensecap::vision",
            "type={} prompt='{}' image={} base64 bytes",
            req.kind,
            prompt,
            req.img.len()
        );

        let analysis = self.llm.generate_vision(prompt, &req.img).await?;
        info!(target: "sensecap::vision", "analysis: '{analysis}'");

        let state = if req.kind == KIND_MONITORING {
            prompts::monitoring_state(&analysis)
        } else {
            0
        };

        let audio = if req.audio_txt.is_empty() {
            None
        } else {
            match self.tts.synthesize(&req.audio_txt).await {
                Ok(wav) => Some(BASE64.encode(wav)),
                Err(e) => {
                    warn!(
                        target: "sensecap::vision",
                        "speech synthesis failed, continuing without audio: {e}"
                    );
                    None
                }
            }
        };

        info!(target: "sensecap::vision", "analysis complete, state={state}");
        Ok(ImageAnalyzerResponse {
            code: 200,
            data: ImageAnalyzerResponseData {
                state,
                kind: req.kind,
                audio,
                img: None,
            },
        })
    }
}
