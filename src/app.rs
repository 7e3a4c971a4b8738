//! Router assembly: shared state, sub-routers, and middleware ordering.

use crate::ai::{LlmClient, SttClient, TtsClient};
use crate::config::ServerConfig;
use crate::handlers;
use crate::middleware as mw;
use crate::store::WatcherStore;
use crate::taskflow::TaskFlowCompiler;
use crate::vision::VisionOrchestrator;
use crate::voice::VoiceOrchestrator;
use axum::http::{header, HeaderName, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Dependency bundle shared by all handlers. Configuration is carried here
/// rather than in module-level state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: Arc<WatcherStore>,
    pub voice: Arc<VoiceOrchestrator>,
    pub vision: Arc<VisionOrchestrator>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: WatcherStore) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(store);
        let stt = Arc::new(SttClient::new(config.whisper_url.clone()));
        let tts = Arc::new(TtsClient::new(config.piper_url.clone()));
        let llm = Arc::new(LlmClient::new(
            config.ollama_url.clone(),
            config.ollama_model.clone(),
            config.llava_model.clone(),
        ));
        let compiler = TaskFlowCompiler::new(Arc::clone(&llm), Arc::clone(&store));
        let voice = Arc::new(VoiceOrchestrator::new(
            Arc::clone(&stt),
            Arc::clone(&tts),
            Arc::clone(&llm),
            compiler,
        ));
        let vision = Arc::new(VisionOrchestrator::new(llm, tts));
        Self {
            config,
            store,
            voice,
            vision,
        }
    }
}

/// Build the full router. Layer order (outermost first): CORS → request
/// logger → device-EUI validator; the token gate wraps /v1 and /v2 only.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("api-obiter-device-eui"),
        ]);

    let v1 = Router::new()
        .route("/notification/event", post(handlers::notification_event))
        .route("/watcher/vision", post(handlers::vision))
        .layer(from_fn_with_state(state.clone(), mw::token_validator));

    let v2 = Router::new()
        .route("/watcher/talk/audio_stream", post(handlers::audio_stream))
        .route(
            "/watcher/talk/view_task_detail",
            get(handlers::task_detail).post(handlers::task_detail),
        )
        .layer(from_fn_with_state(state.clone(), mw::token_validator));

    Router::new()
        .nest("/v1", v1)
        .nest("/v2", v2)
        .route("/health", get(health))
        .fallback(handlers::not_found)
        .layer(from_fn(mw::device_eui_validator))
        .layer(from_fn(mw::request_logger))
        .layer(cors)
        .with_state(state)
}

/// GET /health: liveness, no auth gate.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "sensecap-local-server" }))
}
