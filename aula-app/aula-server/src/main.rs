use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use aula_api::{build_router, AppState};
use aula_core::{AuthService, SystemClock};
use aula_shared::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize telemetry; the guard flushes the file writer on exit
    let _log_guard = aula_shared::telemetry::init_telemetry(&config.log)?;

    info!("{} starting ({})...", config.app.name, config.app.env);

    let sweep_interval = config.sessions.sweep_interval_seconds;
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));

    // Create App State
    let state = AppState::build(config, Arc::new(SystemClock))?;
    info!("Collections: {:?}", state.store.collection_names());

    if sweep_interval > 0 {
        spawn_session_sweeper(state.auth.clone(), Duration::from_secs(sweep_interval));
    } else {
        info!("Periodic session sweep disabled");
    }

    let app = build_router(state);

    // Start server
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn spawn_session_sweeper(auth: Arc<AuthService>, period: Duration) {
    info!("Sweeping expired sessions every {}s", period.as_secs());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // first tick fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            auth.sweep_expired();
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
