//! Row types for the `OVN_Northbound` tables the daemon reads and writes.
//!
//! Every row carries an `external_ids` map for `hive:`-prefixed metadata —
//! OVN's own mechanism for attaching owner metadata to a row. Typed as
//! `HashMap<String, String>` since every `hive:` value the daemon writes is
//! itself a string.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The `hive:` metadata key prefix used on every OVN row the daemon owns.
pub const METADATA_PREFIX: &str = "hive:";

/// Build a fully-qualified metadata key, e.g. `hive_key("vpc_id")` ->
/// `"hive:vpc_id"`.
pub fn hive_key(suffix: &str) -> String {
    format!("{METADATA_PREFIX}{suffix}")
}

/// `Logical_Switch` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalSwitch {
    pub uuid: String,
    pub name: String,
    pub ports: Vec<String>,
    pub external_ids: HashMap<String, String>,
}

/// `Logical_Switch_Port` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalSwitchPort {
    pub uuid: String,
    pub name: String,
    /// `router`, `localnet`, or empty for a plain VIF port.
    pub port_type: String,
    pub addresses: Vec<String>,
    pub port_security: Vec<String>,
    pub options: HashMap<String, String>,
    pub dhcpv4_options: Option<String>,
}

impl LogicalSwitchPort {
    /// A blank port of the given name and type, ready for the caller to fill
    /// in addresses/options before handing it to [`crate::ovn::OvnClient::create_switch_port`].
    pub fn new(name: impl Into<String>, port_type: impl Into<String>) -> Self {
        Self {
            uuid: String::new(),
            name: name.into(),
            port_type: port_type.into(),
            addresses: Vec::new(),
            port_security: Vec::new(),
            options: HashMap::new(),
            dhcpv4_options: None,
        }
    }
}

/// `Logical_Router` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalRouter {
    pub uuid: String,
    pub name: String,
    pub ports: Vec<String>,
    pub nat: Vec<String>,
    pub static_routes: Vec<String>,
    pub external_ids: HashMap<String, String>,
}

/// `Logical_Router_Port` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalRouterPort {
    pub uuid: String,
    pub name: String,
    /// `<ip>/<prefix>`.
    pub network: String,
    pub mac: String,
}

impl LogicalRouterPort {
    pub fn new(name: impl Into<String>, network: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            uuid: String::new(),
            name: name.into(),
            network: network.into(),
            mac: mac.into(),
        }
    }
}

/// `DHCP_Options` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DhcpOptions {
    pub uuid: String,
    pub cidr: String,
    pub options: HashMap<String, String>,
    pub external_ids: HashMap<String, String>,
}

/// `NAT` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nat {
    pub uuid: String,
    #[serde(rename = "type")]
    pub nat_type: String,
    pub external_ip: String,
    pub logical_ip: String,
    pub external_ids: HashMap<String, String>,
}

/// `Logical_Router_Static_Route` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticRoute {
    pub uuid: String,
    pub ip_prefix: String,
    pub nexthop: String,
    pub external_ids: HashMap<String, String>,
}

/// `Gateway_Chassis` row — named in the NB DB schema but the daemon never
/// needs to create one itself: chassis binding for the
/// external switch's localnet port is handled by the OVN controller once the
/// logical topology exists, not by the topology translator. Modeled here
/// only so `OvnClient` implementations have a row type to report against if
/// ever asked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayChassis {
    pub uuid: String,
    pub name: String,
    pub chassis_name: String,
    pub priority: i32,
}
