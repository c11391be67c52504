//! Travel reservation server
//!
//! Usage:
//!   travel-server --role flights
//!   travel-server --role middleware --flights 10.0.0.2:5001
//!   travel-server --role all --port 5000

use clap::Parser;
use tracing_subscriber::EnvFilter;
use travel::ServerConfig;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    tracing::info!("Starting {:?} on {}", config.role, config.listen_addr());

    if let Err(e) = travel::server::run(&config) {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
