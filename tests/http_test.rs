//! Endpoint integration: routes, auth, task-detail shapes, and the 404
//! fallback, against a server bound to an ephemeral port. None of these
//! paths call the external AI services.

use sensecap_server::app::{build_app, AppState};
use sensecap_server::config::ServerConfig;
use sensecap_server::store::{NewTaskFlow, WatcherStore};
use sensecap_server::taskflow::ModelKind;
use std::path::PathBuf;

const DEVICE: &str = "2CF7F1C04430000C";
const EUI_HEADER: &str = "API-OBITER-DEVICE-EUI";

fn test_config(db_path: PathBuf, token: Option<&str>) -> ServerConfig {
    ServerConfig {
        port: 0,
        host: "127.0.0.1".to_string(),
        auth_token: token.map(String::from),
        db_path,
        // Unreachable on purpose; these tests never call the AI services.
        whisper_url: "http://127.0.0.1:1".to_string(),
        ollama_url: "http://127.0.0.1:1".to_string(),
        ollama_model: "llama3.1:8b-instruct-q4_1".to_string(),
        llava_model: "llava:7b".to_string(),
        piper_url: "http://127.0.0.1:1".to_string(),
        api_schema: "http".to_string(),
        api_base_url: "http://127.0.0.1:0".to_string(),
    }
}

/// Bind the app on an ephemeral port and return its base URL plus a handle
/// to the same store the handlers use.
async fn spawn_server(token: Option<&str>) -> (String, WatcherStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let store = WatcherStore::new(db_path.clone()).unwrap();
    let state = AppState::new(test_config(db_path, token), store.clone());
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), store, dir)
}

fn sample_flow<'a>(headline: &'a str, trigger: &'a str) -> NewTaskFlow<'a> {
    NewTaskFlow {
        device_eui: DEVICE,
        name: "notify me when a person arrives",
        headline,
        trigger_condition: trigger,
        target_objects: vec!["person".to_string()],
        actions: vec!["notify".to_string()],
        model_type: ModelKind::Person,
    }
}

#[tokio::test]
async fn health_is_open_and_identifies_the_service() {
    let (base, _store, _dir) = spawn_server(Some("secret")).await;

    let res = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "sensecap-local-server");
}

#[tokio::test]
async fn task_detail_is_empty_object_for_unknown_device() {
    let (base, _store, _dir) = spawn_server(None).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{base}/v2/watcher/talk/view_task_detail"))
        .header(EUI_HEADER, "AAAAAAAAAAAAAAAA")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["tl"], serde_json::json!({}));
}

#[tokio::test]
async fn task_detail_returns_graph_of_newest_flow() {
    let (base, store, _dir) = spawn_server(None).await;

    store.save_task_flow(sample_flow("First task", "a")).unwrap();
    store
        .save_task_flow(sample_flow("Watch for person", "person arrives"))
        .unwrap();

    let client = reqwest::Client::new();
    // The endpoint accepts GET and POST.
    for send in [
        client
            .get(format!("{base}/v2/watcher/talk/view_task_detail"))
            .header(EUI_HEADER, DEVICE),
        client
            .post(format!("{base}/v2/watcher/talk/view_task_detail"))
            .header(EUI_HEADER, DEVICE),
    ] {
        let res = send.send().await.unwrap();
        assert_eq!(res.status(), 200);
        let body: serde_json::Value = res.json().await.unwrap();
        let tl = &body["data"]["tl"];
        assert_eq!(tl["tn"], "Watch for person");
        let nodes = tl["task_flow"].as_array().unwrap();
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0]["wires"], serde_json::json!([[2]]));
        assert_eq!(nodes[1]["wires"], serde_json::json!([[3, 4]]));
    }
}

#[tokio::test]
async fn notification_ingest_always_reports_success() {
    let (base, store, _dir) = spawn_server(None).await;

    let payload = serde_json::json!({
        "requestId": "req-1",
        "deviceEui": DEVICE,
        "events": {
            "timestamp": 1_700_000_000_000i64,
            "text": "person detected",
            "data": {
                "inference": {
                    "boxes": [[10, 20, 30, 40, 95, 0], [50, 60, 70, 80, 88, 16]],
                    "classes_name": ["person", "dog"]
                },
                "sensor": { "temperature": 21.5, "humidity": 40, "CO2": 600 }
            }
        }
    });

    let res = reqwest::Client::new()
        .post(format!("{base}/v1/notification/event"))
        .header(EUI_HEADER, DEVICE)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "code": 200 }));

    let events = store.notification_events_by_device(DEVICE, 10).unwrap();
    assert_eq!(events.len(), 1);
    let inference: serde_json::Value = serde_json::from_str(&events[0].inference_data).unwrap();
    assert_eq!(inference["boxes"][0], serde_json::json!([10, 20, 30, 40, 95, 0]));
}

#[tokio::test]
async fn malformed_notification_is_a_bad_request() {
    let (base, _store, _dir) = spawn_server(None).await;

    let res = reqwest::Client::new()
        .post(format!("{base}/v1/notification/event"))
        .header(EUI_HEADER, DEVICE)
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn vision_without_image_is_a_bad_request() {
    let (base, _store, _dir) = spawn_server(None).await;

    let res = reqwest::Client::new()
        .post(format!("{base}/v1/watcher/vision"))
        .header(EUI_HEADER, DEVICE)
        .json(&serde_json::json!({ "img": "", "type": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn configured_token_is_compared_exactly() {
    let (base, _store, _dir) = spawn_server(Some("secret")).await;
    let client = reqwest::Client::new();
    let url = format!("{base}/v2/watcher/talk/view_task_detail");

    // Missing and wrong tokens are rejected with the bare code body.
    for req in [
        client.get(&url).header(EUI_HEADER, DEVICE),
        client
            .get(&url)
            .header(EUI_HEADER, DEVICE)
            .header("Authorization", "Bearer secret"),
    ] {
        let res = req.send().await.unwrap();
        assert_eq!(res.status(), 401);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body, serde_json::json!({ "code": 401 }));
    }

    // The exact configured value passes.
    let res = client
        .get(&url)
        .header(EUI_HEADER, DEVICE)
        .header("Authorization", "secret")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn unconfigured_token_passes_everything() {
    let (base, _store, _dir) = spawn_server(None).await;

    let res = reqwest::Client::new()
        .get(format!("{base}/v2/watcher/talk/view_task_detail"))
        .header(EUI_HEADER, DEVICE)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn unknown_route_gets_a_descriptive_404() {
    let (base, _store, _dir) = spawn_server(None).await;

    let res = reqwest::Client::new()
        .post(format!("{base}/v3/unknown/endpoint"))
        .body("probe")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["path"], "/v3/unknown/endpoint");
    assert_eq!(body["method"], "POST");
}

#[tokio::test]
async fn missing_device_header_is_tolerated() {
    let (base, _store, _dir) = spawn_server(None).await;

    // The validator warns but never rejects.
    let res = reqwest::Client::new()
        .get(format!("{base}/v2/watcher/talk/view_task_detail"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}
