//! Dual Light - A state-managed HTTP controller for a two-channel relay light
//!
//! This is the main entry point for the dual-light application.

use std::sync::Arc;
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use dual_light::{
    api::create_router,
    config::Config,
    notify::NotificationGateway,
    services::{JsonFileStore, MemoryRelay, RelayDriver, SysfsRelay, SystemClock},
    state::{AppState, DeviceController},
    tasks::{daily_reset_task, poll_loop_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("dual_light={},tower_http=info", config.log_level()))
        .init();

    info!("Starting dual-light server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, relays=gpio{}/gpio{}, state_file={}",
        config.host,
        config.port,
        config.relay_a_gpio,
        config.relay_b_gpio,
        config.state_file.display()
    );

    let relay: Arc<dyn RelayDriver> = if config.simulate {
        info!("Simulation mode, relays are in memory");
        Arc::new(MemoryRelay::new())
    } else {
        Arc::new(
            SysfsRelay::open(&config.gpio_root, config.relay_a_gpio, config.relay_b_gpio)
                .context("failed to set up relay GPIOs")?,
        )
    };

    let controller = DeviceController::new(
        relay,
        Arc::new(JsonFileStore::new(&config.state_file)),
        Arc::new(SystemClock),
        config.settle(),
    );
    let state = Arc::new(AppState::new(
        controller,
        NotificationGateway::default(),
        config.port,
        config.host.clone(),
    ));

    // Start background tasks
    tokio::spawn(poll_loop_task(Arc::clone(&state), config.poll_interval()));
    tokio::spawn(daily_reset_task(Arc::clone(&state)));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /                 - Thing description");
    info!("  GET  /properties       - All property values");
    info!("  PUT  /properties/:name - Set on or channel");
    info!("  POST /actions/timer    - Turn on for a number of minutes");
    info!("  GET  /events           - Subscribe to changes (SSE)");
    info!("  GET  /status           - Current status and timer");
    info!("  GET  /health           - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}
