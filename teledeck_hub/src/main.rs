//! Entry point for the hub: starts the sampler, the telemetry WebSocket
//! listener and the ingestion listener, all sharing one Hub.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use teledeck_hub::config;
use teledeck_hub::hub::Hub;
use teledeck_hub::provider::SysinfoProvider;
use teledeck_hub::sampler::spawn_sampler;
use teledeck_hub::{ingest, ws};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = match config::parse_args(std::env::args()) {
        Ok(cfg) => cfg,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    let hub = Arc::new(Hub::new());

    let ws_addr = SocketAddr::from(([0, 0, 0, 0], cfg.ws_port));
    let ws_listener = tokio::net::TcpListener::bind(ws_addr)
        .await
        .with_context(|| format!("bind telemetry endpoint {ws_addr}"))?;
    info!(event = "telemetry_listening", addr = %ws_addr);

    let ingest_addr = SocketAddr::from(([0, 0, 0, 0], cfg.ingest_port));
    let ingest_listener = tokio::net::TcpListener::bind(ingest_addr)
        .await
        .with_context(|| format!("bind ingestion endpoint {ingest_addr}"))?;
    info!(event = "ingestion_listening", addr = %ingest_addr);

    let sampler = spawn_sampler(SysinfoProvider::new(), hub.clone(), cfg.tick);

    let ws_server = axum::serve(
        ws_listener,
        ws::router(hub.clone()).into_make_service_with_connect_info::<SocketAddr>(),
    );
    let ingest_server = axum::serve(ingest_listener, ingest::router(hub.clone()));

    tokio::select! {
        res = async { ws_server.await } => res.context("telemetry endpoint")?,
        res = async { ingest_server.await } => res.context("ingestion endpoint")?,
        _ = tokio::signal::ctrl_c() => {
            info!(event = "shutdown");
        }
    }

    sampler.abort();
    Ok(())
}
