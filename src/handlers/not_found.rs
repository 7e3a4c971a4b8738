//! Fallback for unmatched routes: log everything the device sent so a
//! firmware endpoint we don't know about yet can be diagnosed, then answer
//! 404 with a JSON body.

use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::{info, warn};

const BODY_LOG_LIMIT: usize = 1024;
const BODY_READ_LIMIT: usize = 64 * 1024;

pub async fn not_found(req: Request) -> impl IntoResponse {
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, BODY_READ_LIMIT).await.unwrap_or_default();

    warn!(target: "sensecap::http", "404 {} {}", parts.method, parts.uri);
    for (name, value) in &parts.headers {
        info!(
            target: "sensecap::http",
            "  {}: {}",
            name,
            value.to_str().unwrap_or("<binary>")
        );
    }
    if !bytes.is_empty() {
        let shown = &bytes[..bytes.len().min(BODY_LOG_LIMIT)];
        info!(
            target: "sensecap::http",
            "  body ({} bytes): {}",
            bytes.len(),
            String::from_utf8_lossy(shown)
        );
    }

    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Not Found",
            "path": parts.uri.path(),
            "method": parts.method.as_str(),
        })),
    )
}
