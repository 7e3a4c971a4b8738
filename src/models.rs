//! Device-facing wire types. Field names and declaration order match what
//! the firmware sends and parses; the voice envelope in particular is
//! serialized in declaration order as the prefix of a framed binary body.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Notification ingest (POST /v1/notification/event)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEventRequest {
    #[serde(rename = "requestId", default)]
    pub request_id: String,
    #[serde(rename = "deviceEui", default)]
    pub device_eui: String,
    #[serde(default)]
    pub events: Events,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Events {
    /// Unix timestamp in milliseconds; absent means 0.
    pub timestamp: Option<i64>,
    pub text: Option<String>,
    /// Base64-encoded small JPEG.
    pub img: Option<String>,
    pub data: Option<EventData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub inference: Option<InferenceData>,
    pub sensor: Option<SensorData>,
}

/// Inference payload from the on-device model: detection boxes or
/// classification scores, with a class-name table indexed by class id.
/// Exactly one of `boxes`/`classes` is populated per event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceData {
    /// [x, y, width, height, score 0..100, class index]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boxes: Vec<[i64; 6]>,
    /// [score 0..100, class index]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<[i64; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes_name: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorData {
    /// Degrees Celsius.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<i64>,
    /// Parts per million.
    #[serde(rename = "CO2", skip_serializing_if = "Option::is_none")]
    pub co2: Option<i64>,
}

// ---------------------------------------------------------------------------
// Image analyzer (POST /v1/watcher/vision)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ImageAnalyzerRequest {
    /// Base64-encoded JPEG; required and non-empty.
    #[serde(default)]
    pub img: String,
    #[serde(default)]
    pub prompt: String,
    /// When non-empty, synthesized to speech and returned as base64 WAV.
    #[serde(default)]
    pub audio_txt: String,
    /// 0 = recognize, 1 = monitoring.
    #[serde(default, rename = "type")]
    pub kind: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageAnalyzerResponse {
    pub code: i64,
    pub data: ImageAnalyzerResponseData,
}

/// `audio` and `img` serialize as explicit nulls when absent; the firmware
/// probes both keys.
#[derive(Debug, Clone, Serialize)]
pub struct ImageAnalyzerResponseData {
    /// 0 = no event, 1 = event detected.
    pub state: i64,
    #[serde(rename = "type")]
    pub kind: i64,
    pub audio: Option<String>,
    pub img: Option<String>,
}

// ---------------------------------------------------------------------------
// Voice interaction (POST /v2/watcher/talk/audio_stream)
// ---------------------------------------------------------------------------

/// JSON header of the framed voice response. Declaration order is the wire
/// order.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceEnvelope {
    pub code: i64,
    pub data: VoiceEnvelopeData,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceEnvelopeData {
    pub mode: i64,
    pub duration: i64,
    pub stt_result: String,
    pub screen_text: String,
}
