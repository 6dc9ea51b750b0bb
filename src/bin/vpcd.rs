//! VPC topology daemon entry point.

use hive_vpcd::config::Config;
use hive_vpcd::service;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();

    let filter = if config.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = service::run(config).await {
        tracing::error!(error = %e, "vpcd exiting on startup failure");
        std::process::exit(1);
    }

    Ok(())
}
