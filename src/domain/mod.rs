//! # VPC Topology Domain Layer
//!
//! Value objects and shared error types for the VPC topology daemon. The
//! daemon has no domain aggregates in the event-sourced sense — OVN NB DB
//! is the single source of topology truth and the daemon rebuilds from
//! events rather than persisting its own projection.
//! What lives here instead is the small set of pure, deterministic
//! building blocks (identifiers, CIDR/gateway arithmetic, MAC derivation)
//! that every other module depends on.

pub mod errors;
pub mod value_objects;

pub use errors::CidrError;
pub use value_objects::{generate_mac, EniId, IgwId, Ipv4Cidr, SubnetId, VpcId};
