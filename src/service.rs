//! Daemon lifecycle wiring.
//!
//! Preflight checks, then NB DB connect, then bus subscribe, then wait for
//! a termination signal, then ordered shutdown. Builder-assembled ports,
//! `Arc`-shared client, ordered teardown.

use crate::bus::BusAdapter;
use crate::config::Config;
use crate::ovn::live::OvsdbClient;
use crate::ovn::OvnClient;
use crate::preflight;
use crate::topology::Translator;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("preflight check failed: {0}")]
    Preflight(#[from] preflight::PreflightError),

    #[error("failed to connect to OVN Northbound DB: {0}")]
    NbDbConnect(crate::ovn::OvnError),

    #[error("failed to start event bus adapter: {0}")]
    Bus(#[from] crate::bus::BusError),

    #[error("failed to write PID file at {0}: {1}")]
    PidFile(std::path::PathBuf, std::io::Error),

    #[error("failed to install signal handler: {0}")]
    Signal(std::io::Error),
}

/// Runs the daemon end to end: preflight, connect, subscribe, wait, shut
/// down. Returns `Ok(())` on a clean shutdown; any other outcome is a
/// startup failure and should exit non-zero.
pub async fn run(config: Config) -> Result<(), ServiceError> {
    preflight::run().await?;

    let ovn_client: Arc<dyn OvnClient> = Arc::new(OvsdbClient::new(config.nb_db_addr(), "OVN_Northbound"));
    ovn_client.connect().await.map_err(ServiceError::NbDbConnect)?;

    let translator = Arc::new(Translator::new(ovn_client.clone()));
    let mut bus = BusAdapter::connect(&config.nats_url, translator).await?;
    bus.subscribe_all().await?;

    write_pid_file(&config.pid_file_path())?;

    wait_for_shutdown_signal().await?;

    tracing::info!("shutdown signal received, unsubscribing from event bus");
    bus.unsubscribe_all();

    if let Err(e) = ovn_client.close().await {
        tracing::warn!(error = %e, "failed to close OVN Northbound DB connection cleanly");
    }

    remove_pid_file(&config.pid_file_path());

    Ok(())
}

fn write_pid_file(path: &std::path::Path) -> Result<(), ServiceError> {
    std::fs::write(path, std::process::id().to_string())
        .map_err(|e| ServiceError::PidFile(path.to_path_buf(), e))
}

fn remove_pid_file(path: &std::path::Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove PID file");
    }
}

async fn wait_for_shutdown_signal() -> Result<(), ServiceError> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(ServiceError::Signal)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(ServiceError::Signal)?;

    tokio::select! {
        _ = sigint.recv() => tracing::info!("received SIGINT"),
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
    }
    Ok(())
}
