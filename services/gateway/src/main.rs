//! HTTP/WebSocket gateway for the trading simulator
//!
//! Bind address and port come from the environment:
//!
//! - `GATEWAY_BIND_ADDR` (default: "0.0.0.0")
//! - `GATEWAY_PORT`      (default: "8001")
//!
//! Exits 0 on a clean ctrl-c shutdown, non-zero if the port cannot be
//! bound. No state survives a restart.

mod error;
mod handlers;
mod models;
mod router;
mod session;
mod state;

use exchange::{Exchange, ExchangeConfig};
use router::create_router;
use state::AppState;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting trading simulator");

    let exchange = Arc::new(Exchange::new(ExchangeConfig::default()));

    // Market data feed runs until shutdown flips the watch channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let simulator = tokio::spawn(exchange::simulator::run(exchange.clone(), shutdown_rx));

    let app = create_router(AppState::new(exchange));

    let addr = bind_addr_from_env()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = simulator.await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}

fn bind_addr_from_env() -> Result<SocketAddr, anyhow::Error> {
    let host = env::var("GATEWAY_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = match env::var("GATEWAY_PORT") {
        Ok(raw) => raw.parse()?,
        Err(_) => 8001,
    };
    Ok(format!("{host}:{port}").parse()?)
}
