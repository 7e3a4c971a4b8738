//! GET|POST /v2/watcher/talk/view_task_detail: reified task graph fetch.

use crate::app::AppState;
use crate::error::ServerResult;
use crate::taskflow;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::info;

pub async fn task_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServerResult<Json<serde_json::Value>> {
    let device_eui = super::device_eui(&headers);
    let flows = state.store.task_flows_by_device(&device_eui)?;
    info!(
        target: "sensecap::taskflow",
        "task detail for device '{}': {} flow(s)",
        device_eui,
        flows.len()
    );

    // An empty `tl` object (not null, not absent) tells the device to halt
    // its current flow.
    let tl = match flows.first() {
        Some(newest) => serde_json::to_value(taskflow::reify(newest))?,
        None => serde_json::json!({}),
    };

    Ok(Json(serde_json::json!({ "code": 200, "data": { "tl": tl } })))
}
