use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use huddle::compactor;
use huddle::engine::{Engine, NoOverlap};
use huddle::http::{AppState, RequestLog, TokenStore, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("HUDDLE_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    huddle::observability::init(metrics_port);

    let port = std::env::var("HUDDLE_PORT").unwrap_or_else(|_| "5000".into());
    let bind = std::env::var("HUDDLE_BIND").unwrap_or_else(|_| "0.0.0.0".into());
    let data_dir = std::env::var("HUDDLE_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let admin_tokens = std::env::var("HUDDLE_ADMIN_TOKENS").unwrap_or_default();
    let compact_threshold: u64 = std::env::var("HUDDLE_COMPACT_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    std::fs::create_dir_all(&data_dir)?;
    let journal_path = std::path::Path::new(&data_dir).join("bookings.journal");

    let engine = Arc::new(Engine::new(journal_path, Box::new(NoOverlap))?);
    tokio::spawn(compactor::run_compactor(engine.clone(), compact_threshold));

    let tokens = Arc::new(TokenStore::from_env_value(&admin_tokens));
    if tokens.is_empty() {
        tracing::warn!("no admin tokens configured, admin endpoints will reject all requests");
    }

    let state = AppState {
        engine,
        requests: Arc::new(RequestLog::new(1000)),
        tokens,
    };
    let app = router(state);

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("huddle listening on {addr}");
    info!("  data_dir: {data_dir}");
    info!(
        "  metrics: {}",
        metrics_port.map_or("disabled".to_string(), |p| format!(
            "http://0.0.0.0:{p}/metrics"
        ))
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("huddle stopped");
    Ok(())
}

/// Resolve on SIGTERM or ctrl-c, letting in-flight requests drain.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
    info!("shutdown signal received");
}
