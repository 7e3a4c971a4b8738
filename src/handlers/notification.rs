//! POST /v1/notification/event: alarm/notification ingest.
//!
//! Always answers `{code: 200}` once the body parses; the device must not
//! retry, so insert failures are logged and swallowed.

use crate::app::AppState;
use crate::error::{ServerError, ServerResult};
use crate::models::NotificationEventRequest;
use crate::store::NewNotificationEvent;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::{info, warn};

pub async fn notification_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Json<serde_json::Value>> {
    let req: NotificationEventRequest = serde_json::from_slice(&body)
        .map_err(|e| ServerError::BadRequest(format!("invalid notification JSON: {e}")))?;

    let device_eui = super::device_eui(&headers);
    log_event(&device_eui, &req);

    let inference_data = req
        .events
        .data
        .as_ref()
        .and_then(|d| d.inference.as_ref())
        .map(|i| serde_json::to_string(i).unwrap_or_default())
        .unwrap_or_default();
    let sensor_data = req
        .events
        .data
        .as_ref()
        .and_then(|d| d.sensor.as_ref())
        .map(|s| serde_json::to_string(s).unwrap_or_default())
        .unwrap_or_default();

    let event = NewNotificationEvent {
        request_id: &req.request_id,
        device_eui: &device_eui,
        timestamp_ms: req.events.timestamp.unwrap_or(0),
        text: req.events.text.clone().unwrap_or_default(),
        img: req.events.img.clone().unwrap_or_default(),
        inference_data,
        sensor_data,
    };
    match state.store.save_notification_event(event) {
        Ok(saved) => info!(target: "sensecap::store", "notification event saved: id={}", saved.id),
        Err(e) => warn!(target: "sensecap::store", "failed to save notification event: {e}"),
    }

    Ok(Json(serde_json::json!({ "code": 200 })))
}

fn log_event(device_eui: &str, req: &NotificationEventRequest) {
    let (boxes, classes) = req
        .events
        .data
        .as_ref()
        .and_then(|d| d.inference.as_ref())
        .map(|i| (i.boxes.len(), i.classes.len()))
        .unwrap_or((0, 0));
    info!(
        target: "sensecap::store",
        "notification from device '{}' request '{}': {} box(es), {} class(es), text='{}'",
        device_eui,
        req.request_id,
        boxes,
        classes,
        req.events.text.as_deref().unwrap_or("")
    );
    if let Some(sensor) = req.events.data.as_ref().and_then(|d| d.sensor.as_ref()) {
        if let Some(t) = sensor.temperature {
            info!(target: "sensecap::store", "sensor: temperature {t:.1}°C");
        }
        if let Some(h) = sensor.humidity {
            info!(target: "sensecap::store", "sensor: humidity {h}%");
        }
        if let Some(ppm) = sensor.co2 {
            info!(target: "sensecap::store", "sensor: CO2 {ppm} ppm");
        }
    }
}
