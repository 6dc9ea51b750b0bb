//! # Event Bus Adapter (C3)
//!
//! Wire payloads for the eight lifecycle topics ([`messages`]) and the
//! subscribe/dispatch/reply loop that serves them ([`adapter`]).

pub mod adapter;
pub mod messages;
pub mod publisher;

pub use adapter::{BusAdapter, BusError};
pub use publisher::{EventPublisher, NatsPublisher, PublishError};
