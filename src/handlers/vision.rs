//! POST /v1/watcher/vision: still-image analysis.

use crate::app::AppState;
use crate::error::{ServerError, ServerResult};
use crate::models::{ImageAnalyzerRequest, ImageAnalyzerResponse};
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;

pub async fn vision(
    State(state): State<AppState>,
    body: Bytes,
) -> ServerResult<Json<ImageAnalyzerResponse>> {
    let req: ImageAnalyzerRequest = serde_json::from_slice(&body)
        .map_err(|e| ServerError::BadRequest(format!("invalid vision JSON: {e}")))?;
    let response = state.vision.analyze(req).await?;
    Ok(Json(response))
}
