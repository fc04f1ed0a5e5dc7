#![forbid(unsafe_code)]

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    config::Config,
    server::{AppState, build_router},
};

pub mod auth;
pub mod config;
pub mod server;
pub mod store;

#[must_use]
pub fn build_app(config: Config) -> axum::Router {
    build_router(AppState::new(config))
}

pub async fn serve(config: Config) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        service = %config.service_name,
        bind_addr = %config.bind_addr,
        "taskdeck api listening"
    );
    axum::serve(listener, build_app(config)).await?;
    Ok(())
}
