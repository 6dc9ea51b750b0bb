//! # Topology Translator (C2)
//!
//! Converts AWS-shaped VPC lifecycle events into OVN Northbound CRUD
//! sequences. See [`translator::Translator`] for the handler implementations
//! and [`naming`] for the deterministic name derivations they share.

pub mod naming;
pub mod translator;

pub use translator::{Translator, TranslatorError};
