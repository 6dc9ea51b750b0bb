//! # Internet Gateway Handler (C4)
//!
//! AWS-shaped attach/detach state machine for internet gateways, backed by
//! an in-memory registry ([`registry::IgwRegistry`]) and driving C2's
//! `vpc.igw-attach`/`vpc.igw-detach` handlers through an
//! [`crate::bus::EventPublisher`].

pub mod errors;
pub mod handler;
pub mod registry;

pub use errors::IgwError;
pub use handler::{Filter, IgwHandler, TagSpecification};
pub use registry::{IgwRecord, IgwRegistry, IgwState};
