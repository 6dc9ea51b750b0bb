//! In-memory [`OvnClient`] used by the translator's test suite and by any
//! binary run without a real OVN deployment reachable.
//!
//! A single `tokio::sync::Mutex`-guarded set of tables backs every method;
//! reads return defensive clones so callers can never mutate daemon state by
//! holding onto a returned row.

use super::model::{
    DhcpOptions, LogicalRouter, LogicalRouterPort, LogicalSwitch, LogicalSwitchPort, Nat, StaticRoute,
};
use super::{OvnClient, OvnError, OvnResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    switches: HashMap<String, LogicalSwitch>,
    switch_ports: HashMap<String, LogicalSwitchPort>,
    routers: HashMap<String, LogicalRouter>,
    router_ports: HashMap<String, LogicalRouterPort>,
    dhcp_options: HashMap<String, DhcpOptions>,
    nats: HashMap<String, Vec<Nat>>,
    static_routes: HashMap<String, Vec<StaticRoute>>,
}

/// In-memory stand-in for a real OVN Northbound connection.
pub struct MockOvnClient {
    tables: Mutex<Tables>,
    connected: Mutex<bool>,
}

impl Default for MockOvnClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOvnClient {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            connected: Mutex::new(false),
        }
    }
}

#[async_trait]
impl OvnClient for MockOvnClient {
    async fn connect(&self) -> OvnResult<()> {
        *self.connected.lock().await = true;
        Ok(())
    }

    async fn close(&self) -> OvnResult<()> {
        *self.connected.lock().await = false;
        Ok(())
    }

    async fn connected(&self) -> bool {
        *self.connected.lock().await
    }

    async fn create_switch(&self, mut switch: LogicalSwitch) -> OvnResult<LogicalSwitch> {
        let mut tables = self.tables.lock().await;
        if tables.switches.contains_key(&switch.name) {
            return Err(OvnError::AlreadyExists {
                kind: "Logical_Switch",
                name: switch.name,
            });
        }
        switch.uuid = Uuid::new_v4().to_string();
        tables.switches.insert(switch.name.clone(), switch.clone());
        Ok(switch)
    }

    async fn delete_switch(&self, name: &str) -> OvnResult<()> {
        let mut tables = self.tables.lock().await;
        tables
            .switches
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| OvnError::NotFound {
                kind: "Logical_Switch",
                name: name.to_string(),
            })
    }

    async fn get_switch(&self, name: &str) -> OvnResult<Option<LogicalSwitch>> {
        Ok(self.tables.lock().await.switches.get(name).cloned())
    }

    async fn list_switches(&self) -> OvnResult<Vec<LogicalSwitch>> {
        Ok(self.tables.lock().await.switches.values().cloned().collect())
    }

    async fn create_switch_port(
        &self,
        switch_name: &str,
        mut port: LogicalSwitchPort,
    ) -> OvnResult<LogicalSwitchPort> {
        let mut tables = self.tables.lock().await;
        if !tables.switches.contains_key(switch_name) {
            return Err(OvnError::NotFound {
                kind: "Logical_Switch",
                name: switch_name.to_string(),
            });
        }
        if tables.switch_ports.contains_key(&port.name) {
            return Err(OvnError::AlreadyExists {
                kind: "Logical_Switch_Port",
                name: port.name,
            });
        }
        port.uuid = Uuid::new_v4().to_string();
        tables.switch_ports.insert(port.name.clone(), port.clone());
        let switch = tables.switches.get_mut(switch_name).expect("checked above");
        switch.ports.push(port.uuid.clone());
        Ok(port)
    }

    async fn delete_switch_port(&self, switch_name: &str, port_name: &str) -> OvnResult<()> {
        let mut tables = self.tables.lock().await;
        let port = tables
            .switch_ports
            .remove(port_name)
            .ok_or_else(|| OvnError::NotFound {
                kind: "Logical_Switch_Port",
                name: port_name.to_string(),
            })?;
        if let Some(switch) = tables.switches.get_mut(switch_name) {
            switch.ports.retain(|uuid| uuid != &port.uuid);
        }
        Ok(())
    }

    async fn get_switch_port(&self, name: &str) -> OvnResult<Option<LogicalSwitchPort>> {
        Ok(self.tables.lock().await.switch_ports.get(name).cloned())
    }

    async fn update_switch_port(&self, port: LogicalSwitchPort) -> OvnResult<()> {
        let mut tables = self.tables.lock().await;
        if !tables.switch_ports.contains_key(&port.name) {
            return Err(OvnError::NotFound {
                kind: "Logical_Switch_Port",
                name: port.name,
            });
        }
        tables.switch_ports.insert(port.name.clone(), port);
        Ok(())
    }

    async fn create_router(&self, mut router: LogicalRouter) -> OvnResult<LogicalRouter> {
        let mut tables = self.tables.lock().await;
        if tables.routers.contains_key(&router.name) {
            return Err(OvnError::AlreadyExists {
                kind: "Logical_Router",
                name: router.name,
            });
        }
        router.uuid = Uuid::new_v4().to_string();
        tables.routers.insert(router.name.clone(), router.clone());
        Ok(router)
    }

    async fn delete_router(&self, name: &str) -> OvnResult<()> {
        let mut tables = self.tables.lock().await;
        tables
            .routers
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| OvnError::NotFound {
                kind: "Logical_Router",
                name: name.to_string(),
            })
    }

    async fn get_router(&self, name: &str) -> OvnResult<Option<LogicalRouter>> {
        Ok(self.tables.lock().await.routers.get(name).cloned())
    }

    async fn list_routers(&self) -> OvnResult<Vec<LogicalRouter>> {
        Ok(self.tables.lock().await.routers.values().cloned().collect())
    }

    async fn create_router_port(
        &self,
        router_name: &str,
        mut port: LogicalRouterPort,
    ) -> OvnResult<LogicalRouterPort> {
        let mut tables = self.tables.lock().await;
        if !tables.routers.contains_key(router_name) {
            return Err(OvnError::NotFound {
                kind: "Logical_Router",
                name: router_name.to_string(),
            });
        }
        if tables.router_ports.contains_key(&port.name) {
            return Err(OvnError::AlreadyExists {
                kind: "Logical_Router_Port",
                name: port.name,
            });
        }
        port.uuid = Uuid::new_v4().to_string();
        tables.router_ports.insert(port.name.clone(), port.clone());
        let router = tables.routers.get_mut(router_name).expect("checked above");
        router.ports.push(port.uuid.clone());
        Ok(port)
    }

    async fn delete_router_port(&self, router_name: &str, port_name: &str) -> OvnResult<()> {
        let mut tables = self.tables.lock().await;
        let port = tables
            .router_ports
            .remove(port_name)
            .ok_or_else(|| OvnError::NotFound {
                kind: "Logical_Router_Port",
                name: port_name.to_string(),
            })?;
        if let Some(router) = tables.routers.get_mut(router_name) {
            router.ports.retain(|uuid| uuid != &port.uuid);
        }
        Ok(())
    }

    async fn get_router_port(&self, name: &str) -> OvnResult<Option<LogicalRouterPort>> {
        Ok(self.tables.lock().await.router_ports.get(name).cloned())
    }

    async fn create_dhcp_options(&self, mut options: DhcpOptions) -> OvnResult<String> {
        let mut tables = self.tables.lock().await;
        options.uuid = Uuid::new_v4().to_string();
        let uuid = options.uuid.clone();
        tables.dhcp_options.insert(uuid.clone(), options);
        Ok(uuid)
    }

    async fn delete_dhcp_options(&self, uuid: &str) -> OvnResult<()> {
        let mut tables = self.tables.lock().await;
        tables
            .dhcp_options
            .remove(uuid)
            .map(|_| ())
            .ok_or_else(|| OvnError::NotFound {
                kind: "DHCP_Options",
                name: uuid.to_string(),
            })
    }

    async fn find_dhcp_options_by_cidr(&self, cidr: &str) -> OvnResult<Option<DhcpOptions>> {
        let tables = self.tables.lock().await;
        Ok(tables.dhcp_options.values().find(|o| o.cidr == cidr).cloned())
    }

    async fn find_dhcp_options_by_metadata(&self, key: &str, value: &str) -> OvnResult<Option<DhcpOptions>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .dhcp_options
            .values()
            .find(|o| o.external_ids.get(key).map(String::as_str) == Some(value))
            .cloned())
    }

    async fn list_dhcp_options(&self) -> OvnResult<Vec<DhcpOptions>> {
        Ok(self.tables.lock().await.dhcp_options.values().cloned().collect())
    }

    async fn add_nat(&self, router_name: &str, mut nat: Nat) -> OvnResult<Nat> {
        let mut tables = self.tables.lock().await;
        if !tables.routers.contains_key(router_name) {
            return Err(OvnError::NotFound {
                kind: "Logical_Router",
                name: router_name.to_string(),
            });
        }
        nat.uuid = Uuid::new_v4().to_string();
        let entry = tables.nats.entry(router_name.to_string()).or_default();
        entry.push(nat.clone());
        let router = tables.routers.get_mut(router_name).expect("checked above");
        router.nat.push(nat.uuid.clone());
        Ok(nat)
    }

    async fn delete_nat(&self, router_name: &str, nat_type: &str, logical_ip: &str) -> OvnResult<()> {
        let mut tables = self.tables.lock().await;
        let entry = tables.nats.entry(router_name.to_string()).or_default();
        let position = entry
            .iter()
            .position(|n| n.nat_type == nat_type && n.logical_ip == logical_ip)
            .ok_or_else(|| OvnError::NotFound {
                kind: "NAT",
                name: format!("{nat_type}:{logical_ip}"),
            })?;
        let removed = entry.remove(position);
        if let Some(router) = tables.routers.get_mut(router_name) {
            router.nat.retain(|uuid| uuid != &removed.uuid);
        }
        Ok(())
    }

    async fn add_static_route(&self, router_name: &str, mut route: StaticRoute) -> OvnResult<StaticRoute> {
        let mut tables = self.tables.lock().await;
        if !tables.routers.contains_key(router_name) {
            return Err(OvnError::NotFound {
                kind: "Logical_Router",
                name: router_name.to_string(),
            });
        }
        route.uuid = Uuid::new_v4().to_string();
        let entry = tables.static_routes.entry(router_name.to_string()).or_default();
        entry.push(route.clone());
        let router = tables.routers.get_mut(router_name).expect("checked above");
        router.static_routes.push(route.uuid.clone());
        Ok(route)
    }

    async fn delete_static_route(&self, router_name: &str, ip_prefix: &str) -> OvnResult<()> {
        let mut tables = self.tables.lock().await;
        let entry = tables.static_routes.entry(router_name.to_string()).or_default();
        let position = entry
            .iter()
            .position(|r| r.ip_prefix == ip_prefix)
            .ok_or_else(|| OvnError::NotFound {
                kind: "Logical_Router_Static_Route",
                name: ip_prefix.to_string(),
            })?;
        let removed = entry.remove(position);
        if let Some(router) = tables.routers.get_mut(router_name) {
            router.static_routes.retain(|uuid| uuid != &removed.uuid);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn switch(name: &str) -> LogicalSwitch {
        LogicalSwitch {
            uuid: String::new(),
            name: name.to_string(),
            ports: Vec::new(),
            external_ids: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn create_switch_rejects_duplicate_name() {
        let client = MockOvnClient::new();
        client.create_switch(switch("ls-vpc-integ1")).await.unwrap();
        let err = client.create_switch(switch("ls-vpc-integ1")).await.unwrap_err();
        assert!(matches!(err, OvnError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn switch_port_create_registers_uuid_on_parent_switch() {
        let client = MockOvnClient::new();
        client.create_switch(switch("ls-vpc-integ1")).await.unwrap();
        let port = client
            .create_switch_port("ls-vpc-integ1", LogicalSwitchPort::new("lsp-integ1", ""))
            .await
            .unwrap();

        let parent = client.get_switch("ls-vpc-integ1").await.unwrap().unwrap();
        assert_eq!(parent.ports, vec![port.uuid.clone()]);

        client.delete_switch_port("ls-vpc-integ1", "lsp-integ1").await.unwrap();
        let parent = client.get_switch("ls-vpc-integ1").await.unwrap().unwrap();
        assert!(parent.ports.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_router_reports_not_found() {
        let client = MockOvnClient::new();
        let err = client.delete_router("lr-vpc-missing").await.unwrap_err();
        assert!(matches!(err, OvnError::NotFound { .. }));
    }
}
