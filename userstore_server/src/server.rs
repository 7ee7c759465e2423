use std::net::SocketAddr;

use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

pub(crate) fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if cfg!(debug_assertions) {
                    format!(
                        "{}=debug,userstore=debug,userstore_axum=debug",
                        env!("CARGO_CRATE_NAME")
                    )
                    .into()
                } else {
                    "info".into()
                }
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Address to listen on, from `LISTEN_ADDR`
pub(crate) fn listen_addr() -> Result<SocketAddr, String> {
    let raw = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
    raw.parse()
        .map_err(|e| format!("Invalid LISTEN_ADDR '{raw}': {e}"))
}

pub(crate) async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    tracing::info!("HTTP server listening on {addr}");
    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
}
