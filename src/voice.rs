//! Voice Interaction Orchestrator: one captured audio blob in, one framed
//! binary reply out.
//!
//! Pipeline per request: STT → mode classification → chat reply or task
//! compilation → TTS → duration → multipart framing. STT and TTS failures
//! abort the request; classification and task sub-prompts fall back to
//! documented defaults instead.

use crate::ai::{LlmClient, SttClient, TtsClient};
use crate::error::ServerResult;
use crate::models::{VoiceEnvelope, VoiceEnvelopeData};
use crate::prompts;
use crate::taskflow::TaskFlowCompiler;
use std::sync::Arc;
use tracing::{info, warn};

/// Fixed framing delimiter between the JSON header and the WAV payload.
/// Not a MIME boundary; the firmware scans for these exact bytes followed
/// by a single 0x0A.
pub const AUDIO_BOUNDARY: &str = "---sensecraftboundary---";

/// Synthesized WAV layout: 44-byte header, then 16 kHz / 16-bit / mono PCM.
const WAV_HEADER_LEN: usize = 44;
const PCM_BYTES_PER_SEC: i64 = 32_000;

/// Dispatch discriminant within the voice pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Chat = 0,
    Task = 1,
    TaskAuto = 2,
}

impl InteractionMode {
    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

/// Per-request session state; dropped once the response is framed.
#[derive(Debug)]
pub struct VoiceSession {
    pub device_eui: String,
    pub session_id: String,
    pub audio: Vec<u8>,
}

/// Outcome of one voice interaction, ready for framing.
#[derive(Debug)]
pub struct VoiceReply {
    pub mode: InteractionMode,
    pub transcript: String,
    pub screen_text: String,
    pub duration_ms: i64,
    pub wav: Vec<u8>,
}

pub struct VoiceOrchestrator {
    stt: Arc<SttClient>,
    tts: Arc<TtsClient>,
    llm: Arc<LlmClient>,
    compiler: TaskFlowCompiler,
}

impl VoiceOrchestrator {
    pub fn new(
        stt: Arc<SttClient>,
        tts: Arc<TtsClient>,
        llm: Arc<LlmClient>,
        compiler: TaskFlowCompiler,
    ) -> Self {
        Self {
            stt,
            tts,
            llm,
            compiler,
        }
    }

    /// Run the full pipeline for one session.
    pub async fn run(&self, session: VoiceSession) -> ServerResult<VoiceReply> {
        info!(
            target: "sensecap::voice",
            "session '{}': {} bytes of {} audio (~{:.2}s at 16 kHz 16-bit mono)",
            session.session_id,
            session.audio.len(),
            describe_audio_format(&session.audio),
            session.audio.len() as f64 / PCM_BYTES_PER_SEC as f64
        );

        let transcript = self.stt.transcribe(&session.audio).await?;
        info!(target: "sensecap::voice", "transcript: '{transcript}'");

        let mode = self.classify_mode(&transcript).await;
        info!(target: "sensecap::voice", "mode: {mode:?}");

        let screen_text = match mode {
            InteractionMode::Chat => self.chat_reply(&transcript).await?,
            InteractionMode::Task | InteractionMode::TaskAuto => {
                self.compiler.compile(&transcript, &session.device_eui).await
            }
        };

        let wav = self.tts.synthesize(&screen_text).await?;
        let duration_ms = wav_duration_ms(wav.len());
        info!(
            target: "sensecap::voice",
            "reply: '{}' ({} bytes WAV, {} ms)",
            screen_text,
            wav.len(),
            duration_ms
        );

        Ok(VoiceReply {
            mode,
            transcript,
            screen_text,
            duration_ms,
            wav,
        })
    }

    /// Classify Chat/Task/TaskAuto. Never fails the request: any LLM or
    /// parse problem falls back to Chat.
    async fn classify_mode(&self, transcript: &str) -> InteractionMode {
        match self
            .llm
            .generate(&prompts::mode_classifier_prompt(transcript))
            .await
        {
            Ok(raw) => prompts::parse_mode(&prompts::normalize_reply(&raw)),
            Err(e) => {
                warn!(target: "sensecap::voice", "mode classification failed, defaulting to chat: {e}");
                InteractionMode::Chat
            }
        }
    }

    async fn chat_reply(&self, transcript: &str) -> ServerResult<String> {
        self.llm.generate(&prompts::chat_prompt(transcript)).await
    }
}

/// Duration of a synthesized WAV in milliseconds: payload past the 44-byte
/// header at 32,000 PCM bytes per second, truncated.
pub fn wav_duration_ms(wav_len: usize) -> i64 {
    let pcm = wav_len.saturating_sub(WAV_HEADER_LEN) as i64;
    pcm * 1000 / PCM_BYTES_PER_SEC
}

/// Frame a reply: compact JSON header, boundary literal, one 0x0A byte,
/// raw WAV. Content-Length of the HTTP response must equal this buffer's
/// length or the device stops reading the audio early.
pub fn frame_reply(reply: &VoiceReply) -> ServerResult<Vec<u8>> {
    let envelope = VoiceEnvelope {
        code: 200,
        data: VoiceEnvelopeData {
            mode: reply.mode.as_i64(),
            duration: reply.duration_ms,
            stt_result: reply.transcript.clone(),
            screen_text: reply.screen_text.clone(),
        },
    };
    let mut body = serde_json::to_vec(&envelope)?;
    body.extend_from_slice(AUDIO_BOUNDARY.as_bytes());
    body.push(b'\n');
    body.extend_from_slice(&reply.wav);
    Ok(body)
}

/// Best-effort container sniff for the captured audio (log-only).
pub fn describe_audio_format(audio: &[u8]) -> &'static str {
    if audio.len() >= 4 {
        if &audio[0..4] == b"RIFF" {
            return "WAV";
        }
        if audio[0] == 0xFF && (audio[1] & 0xE0) == 0xE0 {
            return "MP3";
        }
        if &audio[0..4] == b"OggS" {
            return "OGG";
        }
    }
    "raw"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_reply(wav_len: usize) -> VoiceReply {
        let wav = vec![0u8; wav_len];
        VoiceReply {
            mode: InteractionMode::Chat,
            transcript: "hello".to_string(),
            screen_text: "Hi there.".to_string(),
            duration_ms: wav_duration_ms(wav.len()),
            wav,
        }
    }

    #[test]
    fn duration_truncates_pcm_bytes() {
        assert_eq!(wav_duration_ms(32_044), 1000);
        assert_eq!(wav_duration_ms(44), 0);
        assert_eq!(wav_duration_ms(45), 0);
        assert_eq!(wav_duration_ms(76), 1);
        assert_eq!(wav_duration_ms(16_044), 500);
    }

    #[test]
    fn duration_is_zero_below_header_size() {
        assert_eq!(wav_duration_ms(0), 0);
        assert_eq!(wav_duration_ms(43), 0);
    }

    #[test]
    fn framed_reply_has_exact_header_and_length() {
        let reply = stub_reply(32_044);
        let framed = frame_reply(&reply).unwrap();

        let expected_json = r#"{"code":200,"data":{"mode":0,"duration":1000,"stt_result":"hello","screen_text":"Hi there."}}"#;
        assert!(framed.starts_with(expected_json.as_bytes()));
        assert_eq!(
            framed.len(),
            expected_json.len() + AUDIO_BOUNDARY.len() + 1 + 32_044
        );

        let boundary_start = expected_json.len();
        let boundary_end = boundary_start + AUDIO_BOUNDARY.len();
        assert_eq!(&framed[boundary_start..boundary_end], AUDIO_BOUNDARY.as_bytes());
        assert_eq!(framed[boundary_end], b'\n');
    }

    #[test]
    fn framed_header_is_valid_json_prefix() {
        let reply = stub_reply(100);
        let framed = frame_reply(&reply).unwrap();
        let json_end = framed
            .windows(AUDIO_BOUNDARY.len())
            .position(|w| w == AUDIO_BOUNDARY.as_bytes())
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&framed[..json_end]).unwrap();
        assert_eq!(parsed["code"], 200);
        assert_eq!(parsed["data"]["stt_result"], "hello");
    }

    #[test]
    fn boundary_is_the_fixed_literal() {
        assert_eq!(AUDIO_BOUNDARY, "---sensecraftboundary---");
        assert_eq!(AUDIO_BOUNDARY.len(), 24);
    }

    #[test]
    fn audio_format_sniffing() {
        assert_eq!(describe_audio_format(b"RIFF\x00\x00\x00\x00WAVE"), "WAV");
        assert_eq!(describe_audio_format(&[0xFF, 0xFB, 0x90, 0x00]), "MP3");
        assert_eq!(describe_audio_format(b"OggS\x00\x02"), "OGG");
        assert_eq!(describe_audio_format(&[0x01, 0x02, 0x03, 0x04]), "raw");
        assert_eq!(describe_audio_format(&[]), "raw");
        // 0xFF padding without an MP3 sync second byte is raw capture data.
        assert_eq!(describe_audio_format(&[0xFF, 0x00, 0xFF, 0x00]), "raw");
    }

    #[test]
    fn mode_discriminants_match_wire_values() {
        assert_eq!(InteractionMode::Chat.as_i64(), 0);
        assert_eq!(InteractionMode::Task.as_i64(), 1);
        assert_eq!(InteractionMode::TaskAuto.as_i64(), 2);
    }
}
