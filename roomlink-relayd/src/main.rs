use anyhow::Result;
use axum::{Router, routing::get};
use clap::Parser;
use roomlink_server::{RelayService, ws_handler};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roomlink-relayd")]
#[command(about = "Room signaling relay for roomlink meshes")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:5055")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let relay = RelayService::new();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(relay);

    info!("Relay listening on http://{}", args.listen);

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
