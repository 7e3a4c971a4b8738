//! POST /v2/watcher/talk/audio_stream: voice interaction.
//!
//! The whole body is read before the pipeline starts; the STT service
//! expects a single blob. The response is the framed multipart body with an
//! explicit Content-Length covering all three parts.

use crate::app::AppState;
use crate::error::ServerResult;
use crate::voice::{frame_reply, VoiceSession};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::info;

pub async fn audio_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Response> {
    let session = VoiceSession {
        device_eui: super::device_eui(&headers),
        session_id: headers
            .get("Session-Id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        audio: body.to_vec(),
    };
    info!(
        target: "sensecap::voice",
        "audio stream from device '{}' session '{}'",
        session.device_eui,
        session.session_id
    );

    let reply = state.voice.run(session).await?;
    let framed = frame_reply(&reply)?;
    info!(
        target: "sensecap::voice",
        "multipart response: {} bytes total",
        framed.len()
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, framed.len().to_string()),
        ],
        framed,
    )
        .into_response())
}
