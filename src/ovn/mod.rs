//! # OVN Client Interface (C1)
//!
//! Abstract CRUD over the `OVN_Northbound` database, plus the few indexed
//! lookups the topology translator needs. This is a driven
//! port in the hexagonal sense: the translator depends only on the
//! [`OvnClient`] trait, and two adapters implement it —
//! [`mock::MockOvnClient`] for tests and [`live::OvsdbClient`] for a real
//! OVN deployment.

pub mod live;
pub mod mock;
pub mod model;

use async_trait::async_trait;
use model::{DhcpOptions, LogicalRouter, LogicalRouterPort, LogicalSwitch, LogicalSwitchPort, Nat, StaticRoute};
use thiserror::Error;

/// Errors an [`OvnClient`] implementation can return.
///
/// Callers rely on [`OvnError::AlreadyExists`] and [`OvnError::NotFound`] for
/// idempotence detection — they are not just diagnostic strings, they are
/// part of the protocol between the client and the translator.
#[derive(Error, Debug)]
pub enum OvnError {
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("OVN client not connected")]
    NotConnected,

    #[error("OVSDB transaction failed: {0}")]
    Transaction(String),

    #[error("OVSDB connection error: {0}")]
    Connection(String),
}

/// Result alias for OVN client operations.
pub type OvnResult<T> = Result<T, OvnError>;

/// Abstract CRUD interface over the OVN Northbound database.
///
/// Every method that mutates two tables at once (creating a port while
/// pushing its UUID onto the owning switch/router's `ports` set) must be
/// submitted as a single atomic transaction — implementations, not callers,
/// are responsible for that atomicity.
#[async_trait]
pub trait OvnClient: Send + Sync {
    // -- Connection lifecycle -------------------------------------------

    /// Connect to the NB DB and request a full-table monitor so subsequent
    /// lookups can be served from a local cache.
    async fn connect(&self) -> OvnResult<()>;

    /// Close the connection.
    async fn close(&self) -> OvnResult<()>;

    /// Whether the client currently holds a live connection.
    async fn connected(&self) -> bool;

    // -- Logical switch ----------------------------------------------------

    async fn create_switch(&self, switch: LogicalSwitch) -> OvnResult<LogicalSwitch>;
    async fn delete_switch(&self, name: &str) -> OvnResult<()>;
    async fn get_switch(&self, name: &str) -> OvnResult<Option<LogicalSwitch>>;
    async fn list_switches(&self) -> OvnResult<Vec<LogicalSwitch>>;

    // -- Logical switch port ------------------------------------------------

    /// Create a port under `switch_name`, atomically inserting the new
    /// port's UUID into that switch's `ports` set.
    async fn create_switch_port(
        &self,
        switch_name: &str,
        port: LogicalSwitchPort,
    ) -> OvnResult<LogicalSwitchPort>;

    /// Delete `port_name` from `switch_name`, atomically removing it from
    /// that switch's `ports` set.
    async fn delete_switch_port(&self, switch_name: &str, port_name: &str) -> OvnResult<()>;
    async fn get_switch_port(&self, name: &str) -> OvnResult<Option<LogicalSwitchPort>>;
    async fn update_switch_port(&self, port: LogicalSwitchPort) -> OvnResult<()>;

    // -- Logical router ----------------------------------------------------

    async fn create_router(&self, router: LogicalRouter) -> OvnResult<LogicalRouter>;
    async fn delete_router(&self, name: &str) -> OvnResult<()>;
    async fn get_router(&self, name: &str) -> OvnResult<Option<LogicalRouter>>;
    async fn list_routers(&self) -> OvnResult<Vec<LogicalRouter>>;

    // -- Logical router port -------------------------------------------------

    /// Create a port under `router_name`, atomically inserting the new
    /// port's UUID into that router's `ports` set.
    async fn create_router_port(
        &self,
        router_name: &str,
        port: LogicalRouterPort,
    ) -> OvnResult<LogicalRouterPort>;

    /// Delete `port_name` from `router_name`, atomically removing it from
    /// that router's `ports` set.
    async fn delete_router_port(&self, router_name: &str, port_name: &str) -> OvnResult<()>;
    async fn get_router_port(&self, name: &str) -> OvnResult<Option<LogicalRouterPort>>;

    // -- DHCP options --------------------------------------------------------

    async fn create_dhcp_options(&self, options: DhcpOptions) -> OvnResult<String>;
    async fn delete_dhcp_options(&self, uuid: &str) -> OvnResult<()>;
    async fn find_dhcp_options_by_cidr(&self, cidr: &str) -> OvnResult<Option<DhcpOptions>>;
    async fn find_dhcp_options_by_metadata(&self, key: &str, value: &str) -> OvnResult<Option<DhcpOptions>>;
    async fn list_dhcp_options(&self) -> OvnResult<Vec<DhcpOptions>>;

    // -- NAT ------------------------------------------------------------------

    async fn add_nat(&self, router_name: &str, nat: Nat) -> OvnResult<Nat>;
    /// Delete the NAT rule on `router_name` matched on `(type, logical_ip)`.
    async fn delete_nat(&self, router_name: &str, nat_type: &str, logical_ip: &str) -> OvnResult<()>;

    // -- Static route ------------------------------------------------------------

    async fn add_static_route(&self, router_name: &str, route: StaticRoute) -> OvnResult<StaticRoute>;
    /// Delete the static route on `router_name` matched on `ip_prefix`.
    async fn delete_static_route(&self, router_name: &str, ip_prefix: &str) -> OvnResult<()>;
}
