//! HTTP handlers for the device-facing endpoints.

mod audio_stream;
mod not_found;
mod notification;
mod task_detail;
mod vision;

pub use audio_stream::audio_stream;
pub use not_found::not_found;
pub use notification::notification_event;
pub use task_detail::task_detail;
pub use vision::vision;

use axum::http::HeaderMap;

/// Device identifier from the request headers; empty when absent.
pub(crate) fn device_eui(headers: &HeaderMap) -> String {
    headers
        .get(crate::middleware::DEVICE_EUI_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
