//! Request middleware: logging, device-identifier validation, and the
//! bearer-token equality check.
//!
//! Ordering (outermost first): CORS → request logger → device-EUI validator
//! → token validator. The token gate wraps /v1 and /v2 only; /health and
//! the 404 fallback stay open.

use crate::app::AppState;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Instant;
use tracing::{info, warn};

/// Device identifier header, a 16-hex-character EUI.
pub const DEVICE_EUI_HEADER: &str = "API-OBITER-DEVICE-EUI";

pub async fn request_logger(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let res = next.run(req).await;
    info!(
        target: "sensecap::http",
        "{} {} -> {} in {:?}",
        method,
        path,
        res.status().as_u16(),
        start.elapsed()
    );
    res
}

/// Warn (but never reject) on a missing or malformed device identifier.
pub async fn device_eui_validator(req: Request, next: Next) -> Response {
    match req
        .headers()
        .get(DEVICE_EUI_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        None => warn!(target: "sensecap::http", "missing {DEVICE_EUI_HEADER} header"),
        Some(eui) if eui.len() != 16 => warn!(
            target: "sensecap::http",
            "invalid {DEVICE_EUI_HEADER} header (expected 16 chars, got {}): {eui}",
            eui.len()
        ),
        Some(_) => {}
    }
    next.run(req).await
}

/// Exact-equality token check. The device sends the configured token as the
/// raw Authorization value, no "Bearer " prefix. Pass-through when no token
/// is configured.
pub async fn token_validator(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Some(expected) = state.config.auth_token.as_deref() {
        let presented = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != expected {
            warn!(
                target: "sensecap::http",
                "invalid or missing Authorization header on {}",
                req.uri().path()
            );
            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "code": 401 })))
                .into_response();
        }
    }
    next.run(req).await
}
