//! Local, offline replacement for the SenseCAP Watcher cloud AI service.
//!
//! A device configured with this server's base URL gets four endpoints:
//! notification ingest, still-image analysis, streaming voice interaction,
//! and task-flow fetch. The voice pipeline runs STT → intent classification
//! → LLM chain → TTS, framed as the length-prefixed multipart body the
//! firmware parses byte-for-byte. Spoken monitoring requests are compiled
//! into a persisted task flow and reified on fetch as the four-node graph
//! the device executes.

pub mod ai;
pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod prompts;
pub mod store;
pub mod taskflow;
pub mod vision;
pub mod voice;

pub use app::{build_app, AppState};
pub use config::{Cli, ServerConfig};
pub use error::{ServerError, ServerResult};
