//! sensecap-server entry point: config, tracing, store, router, serve.

use clap::Parser;
use sensecap_server::app::{build_app, AppState};
use sensecap_server::config::{Cli, ServerConfig};
use sensecap_server::store::WatcherStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_cli(Cli::parse())?;

    let store = WatcherStore::new(config.db_path.clone())?;
    info!(target: "sensecap::store", "database initialized: {}", store.path().display());

    if config.auth_enabled() {
        info!(target: "sensecap::http", "authentication enabled");
    } else {
        info!(target: "sensecap::http", "authentication disabled (no token configured)");
    }

    let addr = format!("{}:{}", config.host, config.port);
    print_banner(&config);

    let state = AppState::new(config, store);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(target: "sensecap::http", "server listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Startup banner: endpoints, required headers, and the AT commands that
/// point a device at this server.
fn print_banner(config: &ServerConfig) {
    let base = &config.api_base_url;
    let token = config.auth_token.as_deref().unwrap_or("");
    println!();
    println!("  SenseCAP Watcher Local Server");
    println!();
    println!("  Listen:          {}:{}", config.host, config.port);
    if config.auth_enabled() {
        println!("  Authentication:  ENABLED");
    } else {
        println!("  Authentication:  DISABLED (no token configured)");
    }
    println!();
    println!("  Endpoints:");
    println!("    POST {base}/v1/notification/event");
    println!("    POST {base}/v1/watcher/vision");
    println!("    POST {base}/v2/watcher/talk/audio_stream");
    println!("    GET  {base}/v2/watcher/talk/view_task_detail");
    println!("    GET  {base}/health");
    println!();
    println!("  Required headers:");
    println!("    API-OBITER-DEVICE-EUI: <16-char hex EUI>");
    if config.auth_enabled() {
        println!("    Authorization:         <token>");
    }
    println!();
    println!("  Device configuration:");
    println!(
        "    AT+localservice={{\"data\":{{\"notification_proxy\":{{\"switch\":1,\"url\":\"{base}\",\"token\":\"{token}\"}}}}}}"
    );
    println!(
        "    AT+localservice={{\"data\":{{\"image_analyzer\":{{\"switch\":1,\"url\":\"{base}\",\"token\":\"{token}\"}}}}}}"
    );
    println!();
}
