//! Shared domain error taxonomy
//!
//! Each boundary (OVN client, translator, bus adapter, IGW handler) defines
//! its own `thiserror` enum: `ovn::OvnError`, `topology::TranslatorError`,
//! `bus::BusError`, `igw::IgwError`. This module holds the one error shape
//! that cuts across more than one of those boundaries.

use thiserror::Error;

/// Errors raised while parsing CIDR blocks or deriving gateway addresses from
/// them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CidrError {
    #[error("malformed CIDR block: {0}")]
    Malformed(String),

    #[error("CIDR block {0} is not IPv4")]
    NotIpv4(String),
}
