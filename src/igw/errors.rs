//! IGW handler error taxonomy.
//!
//! Every variant renders the literal AWS error code the external HTTP/XML
//! gateway is expected to surface verbatim; this daemon does not further
//! translate them.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IgwError {
    #[error("MissingParameter: {0}")]
    MissingParameter(&'static str),

    #[error("InvalidInternetGatewayID.Malformed: {0}")]
    InvalidInternetGatewayIdMalformed(String),

    #[error("InvalidVpcID.Malformed: {0}")]
    InvalidVpcIdMalformed(String),

    #[error("InvalidInternetGatewayID.NotFound: {0}")]
    InvalidInternetGatewayIdNotFound(String),

    #[error("Resource.AlreadyAssociated: {0} is already attached to a VPC")]
    ResourceAlreadyAssociated(String),

    #[error("Gateway.NotAttached: {0} is not attached to {1}")]
    GatewayNotAttached(String, String),

    #[error("DependencyViolation: {0} is still attached to a VPC")]
    DependencyViolation(String),

    /// The `vpc.igw-attach`/`vpc.igw-detach` publish, or the remote
    /// handler's reply, failed; the registry mutation has already been
    /// rolled back by the time this is returned.
    #[error("downstream error applying OVN topology: {0}")]
    Downstream(String),
}
