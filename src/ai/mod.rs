//! Typed HTTP clients for the external AI services: Whisper STT, Piper TTS,
//! and Ollama text/vision generation. Each client owns its own
//! `reqwest::Client` and consumes only the documented response fields.

mod llm;
mod stt;
mod tts;

pub use llm::LlmClient;
pub use stt::SttClient;
pub use tts::TtsClient;
