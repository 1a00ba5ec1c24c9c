use clap::Parser;
use tokio::net::TcpListener;

use route_engine::config::ServiceConfig;
use route_engine::error::Result;
use route_engine::logging::init_tracing;
use route_engine::service::{Service, shutdown_signal};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::parse();
    init_tracing(&config.log_filter)?;

    let service = Service::start(&config)?;
    let listener = TcpListener::bind(config.bind).await?;
    service
        .run(listener, shutdown_signal(tokio::signal::ctrl_c()))
        .await
}
