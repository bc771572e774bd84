use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use chime_scheduler::Controller;

mod app;
mod demo;
mod http;
mod response;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load config: CHIME_CONFIG env > ./chime.toml > built-in defaults
    let config_path = std::env::var("CHIME_CONFIG").ok();
    let load_result = chime_core::config::ChimeConfig::load(config_path.as_deref());
    let config = match &load_result {
        Ok(config) => config.clone(),
        Err(_) => chime_core::config::ChimeConfig::default(),
    };

    chime_core::logging::init(&config.log.filter);
    if let Err(e) = load_result {
        warn!("config load failed ({}), using defaults", e);
    }

    let controller = Controller::new(&config.scheduler)?;
    info!(
        pool_size = controller.pool_capacity(),
        location = config.scheduler.location.as_deref().unwrap_or("Local"),
        "scheduler started"
    );

    demo::register(&controller);

    if !config.gateway.enabled() {
        info!("gateway address is empty, running headless until Ctrl-C");
        tokio::signal::ctrl_c().await?;
        controller.stop();
        return Ok(());
    }

    let addr: SocketAddr = config.gateway.socket_addr().parse()?;
    let state = Arc::new(app::AppState::new(config, Arc::clone(&controller)));
    let router = app::build_router(state);

    info!("chime gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    controller.stop();
    Ok(())
}
