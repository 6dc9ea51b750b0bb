//! Preflight host checks.
//!
//! Run once at startup, before any bus subscription or NB DB connection is
//! opened. Both checks shell out to a local command; absence or a non-zero
//! exit code aborts startup.

use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum PreflightError {
    #[error("OVS integration bridge 'br-int' not found: {0}")]
    BridgeMissing(String),

    #[error("OVN controller did not respond to version query: {0}")]
    ControllerUnresponsive(String),

    #[error("failed to invoke host command {0:?}: {1}")]
    CommandFailed(String, std::io::Error),
}

/// Verifies the OVS integration bridge `br-int` exists on the host.
pub async fn check_bridge_exists() -> Result<(), PreflightError> {
    tracing::info!("preflight: checking for OVS integration bridge br-int");
    let output = Command::new("ovs-vsctl")
        .args(["br-exists", "br-int"])
        .output()
        .await
        .map_err(|e| PreflightError::CommandFailed("ovs-vsctl br-exists br-int".to_string(), e))?;

    if !output.status.success() {
        return Err(PreflightError::BridgeMissing(format!(
            "exit status {}",
            output.status
        )));
    }
    Ok(())
}

/// Verifies the local OVN controller process responds to a version query.
pub async fn check_controller_version() -> Result<(), PreflightError> {
    tracing::info!("preflight: querying local OVN controller version");
    let output = Command::new("ovn-appctl")
        .args(["-t", "ovn-controller", "version"])
        .output()
        .await
        .map_err(|e| PreflightError::CommandFailed("ovn-appctl -t ovn-controller version".to_string(), e))?;

    if !output.status.success() {
        return Err(PreflightError::ControllerUnresponsive(format!(
            "exit status {}",
            output.status
        )));
    }
    Ok(())
}

/// Run both checks in order; a single-shot init step, not a repeated health
/// probe.
pub async fn run() -> Result<(), PreflightError> {
    check_bridge_exists().await?;
    check_controller_version().await?;
    Ok(())
}
