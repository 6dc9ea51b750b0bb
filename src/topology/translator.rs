//! Topology translator: turns one VPC lifecycle event into a sequence
//! of OVN CRUD operations, with compensating deletes on partial failure.
//!
//! The translator is stateless — every handler derives names from its
//! input IDs, checks the primary object for idempotence, then runs a fixed
//! sequence of [`OvnClient`] calls. On failure partway through a sequence it
//! deletes, best-effort and in reverse order, whatever it had already
//! created in *this* invocation, then returns the original error.

use crate::domain::value_objects::{EniId, IgwId, SubnetId, VpcId};
use crate::domain::{generate_mac, CidrError, Ipv4Cidr};
use crate::ovn::model::{DhcpOptions, LogicalRouterPort, LogicalSwitch, LogicalSwitchPort, Nat, StaticRoute};
use crate::ovn::model::hive_key;
use crate::ovn::{OvnClient, OvnError};
use crate::topology::naming as name;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors the translator's handlers can return to the bus adapter.
#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error(transparent)]
    Ovn(#[from] OvnError),

    #[error(transparent)]
    Cidr(#[from] CidrError),
}

fn metadata(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (hive_key(k), v.to_string())).collect()
}

/// Translates AWS-shaped VPC lifecycle events into OVN Northbound state.
pub struct Translator {
    client: Arc<dyn OvnClient>,
}

impl Translator {
    pub fn new(client: Arc<dyn OvnClient>) -> Self {
        Self { client }
    }

    /// Whether the backing OVN client currently holds a live connection;
    /// every handler short-circuits when it does not.
    pub async fn ovn_connected(&self) -> bool {
        self.client.connected().await
    }

    /// `vpc.create`: create the VPC's router if absent (idempotent).
    pub async fn vpc_create(
        &self,
        vpc_id: &VpcId,
        cidr_block: Option<&str>,
        vni: u32,
    ) -> Result<(), TranslatorError> {
        let router_name = name::router_name(vpc_id.as_str());

        if self.client.get_router(&router_name).await?.is_some() {
            tracing::info!(vpc_id = %vpc_id, "vpc.create: router already exists, treating as success");
            return Ok(());
        }

        let mut external_ids = metadata(&[("vpc_id", vpc_id.as_str()), ("vni", &vni.to_string())]);
        if let Some(cidr) = cidr_block {
            external_ids.insert(hive_key("cidr"), cidr.to_string());
        }

        self.client
            .create_router(crate::ovn::model::LogicalRouter {
                uuid: String::new(),
                name: router_name,
                ports: Vec::new(),
                nat: Vec::new(),
                static_routes: Vec::new(),
                external_ids,
            })
            .await?;
        Ok(())
    }

    /// `vpc.delete`: cascade-delete every switch and DHCP row tagged with
    /// this VPC (best-effort), then delete the router itself (surfaced).
    pub async fn vpc_delete(&self, vpc_id: &VpcId) -> Result<(), TranslatorError> {
        let router_name = name::router_name(vpc_id.as_str());
        let vpc_key = hive_key("vpc_id");

        for switch in self.client.list_switches().await? {
            if switch.external_ids.get(&vpc_key).map(String::as_str) == Some(vpc_id.as_str()) {
                if let Err(e) = self.client.delete_switch(&switch.name).await {
                    tracing::warn!(switch = %switch.name, error = %e, "vpc.delete: failed to delete switch");
                }
            }
        }

        for dhcp in self.client.list_dhcp_options().await? {
            if dhcp.external_ids.get(&vpc_key).map(String::as_str) == Some(vpc_id.as_str()) {
                if let Err(e) = self.client.delete_dhcp_options(&dhcp.uuid).await {
                    tracing::warn!(uuid = %dhcp.uuid, error = %e, "vpc.delete: failed to delete DHCP options");
                }
            }
        }

        self.client.delete_router(&router_name).await?;
        Ok(())
    }

    /// `vpc.create-subnet`: create a subnet switch, its router port, the
    /// linking switch port, and its DHCP options row.
    pub async fn subnet_create(
        &self,
        subnet_id: &SubnetId,
        vpc_id: &VpcId,
        cidr_block: &str,
    ) -> Result<(), TranslatorError> {
        let switch_name = name::subnet_switch_name(subnet_id.as_str());
        let router_name = name::router_name(vpc_id.as_str());
        let router_port_name = name::subnet_router_port_name(subnet_id.as_str());
        let switch_router_port_name = name::subnet_switch_router_port_name(subnet_id.as_str());

        if self.client.get_switch(&switch_name).await?.is_some() {
            tracing::info!(subnet_id = %subnet_id, "vpc.create-subnet: switch already exists, treating as success");
            return Ok(());
        }

        let cidr = Ipv4Cidr::parse(cidr_block)?;
        let gateway_network = cidr.gateway_network();
        let mac = generate_mac(subnet_id.as_str());

        self.client
            .create_switch(LogicalSwitch {
                uuid: String::new(),
                name: switch_name.clone(),
                ports: Vec::new(),
                external_ids: metadata(&[("subnet_id", subnet_id.as_str()), ("vpc_id", vpc_id.as_str())]),
            })
            .await?;

        if let Err(e) = self
            .client
            .create_router_port(
                &router_name,
                LogicalRouterPort::new(router_port_name.clone(), gateway_network, mac),
            )
            .await
        {
            self.best_effort_delete_switch(&switch_name).await;
            return Err(e.into());
        }

        let mut switch_port = LogicalSwitchPort::new(switch_router_port_name.clone(), "router");
        switch_port.addresses = vec!["router".to_string()];
        switch_port
            .options
            .insert("router-port".to_string(), router_port_name.clone());

        if let Err(e) = self.client.create_switch_port(&switch_name, switch_port).await {
            self.best_effort_delete_router_port(&router_name, &router_port_name).await;
            self.best_effort_delete_switch(&switch_name).await;
            return Err(e.into());
        }

        let dhcp = DhcpOptions {
            uuid: String::new(),
            cidr: cidr_block.to_string(),
            options: [
                ("server_id".to_string(), cidr.gateway_ip().to_string()),
                ("server_mac".to_string(), mac.to_string()),
                ("lease_time".to_string(), "3600".to_string()),
                ("router".to_string(), cidr.gateway_ip().to_string()),
                ("dns_server".to_string(), cidr.gateway_ip().to_string()),
                ("mtu".to_string(), "1442".to_string()),
            ]
            .into_iter()
            .collect(),
            external_ids: metadata(&[("subnet_id", subnet_id.as_str()), ("vpc_id", vpc_id.as_str())]),
        };

        // DHCP options are best-effort: an ENI can still attach without one.
        if let Err(e) = self.client.create_dhcp_options(dhcp).await {
            tracing::warn!(subnet_id = %subnet_id, error = %e, "vpc.create-subnet: failed to create DHCP options");
        }

        Ok(())
    }

    /// `vpc.delete-subnet`: inverse of `subnet_create`, warning on every
    /// step except the final switch delete.
    pub async fn subnet_delete(
        &self,
        subnet_id: &SubnetId,
        vpc_id: &VpcId,
        cidr_block: &str,
    ) -> Result<(), TranslatorError> {
        let switch_name = name::subnet_switch_name(subnet_id.as_str());
        let router_name = name::router_name(vpc_id.as_str());
        let router_port_name = name::subnet_router_port_name(subnet_id.as_str());
        let switch_router_port_name = name::subnet_switch_router_port_name(subnet_id.as_str());

        if let Err(e) = self
            .client
            .delete_switch_port(&switch_name, &switch_router_port_name)
            .await
        {
            tracing::warn!(port = %switch_router_port_name, error = %e, "vpc.delete-subnet: failed to delete switch port");
        }

        if let Err(e) = self.client.delete_router_port(&router_name, &router_port_name).await {
            tracing::warn!(port = %router_port_name, error = %e, "vpc.delete-subnet: failed to delete router port");
        }

        match self.client.find_dhcp_options_by_cidr(cidr_block).await {
            Ok(Some(dhcp)) => {
                if let Err(e) = self.client.delete_dhcp_options(&dhcp.uuid).await {
                    tracing::warn!(uuid = %dhcp.uuid, error = %e, "vpc.delete-subnet: failed to delete DHCP options");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "vpc.delete-subnet: failed to look up DHCP options"),
        }

        self.client.delete_switch(&switch_name).await?;
        Ok(())
    }

    /// `vpc.create-port`: attach an ENI as a switch port on its subnet.
    pub async fn port_create(
        &self,
        eni_id: &EniId,
        subnet_id: &SubnetId,
        private_ip: &str,
        mac_address: &str,
    ) -> Result<(), TranslatorError> {
        let port_name = name::eni_port_name(eni_id.as_str());
        let switch_name = name::subnet_switch_name(subnet_id.as_str());

        if self.client.get_switch_port(&port_name).await?.is_some() {
            tracing::info!(eni_id = %eni_id, "vpc.create-port: port already exists, treating as success");
            return Ok(());
        }

        let addr = format!("{mac_address} {private_ip}");
        let mut port = LogicalSwitchPort::new(port_name, "");
        port.addresses = vec![addr.clone()];
        port.port_security = vec![addr];

        match self
            .client
            .find_dhcp_options_by_metadata(&hive_key("subnet_id"), subnet_id.as_str())
            .await
        {
            Ok(Some(dhcp)) => port.dhcpv4_options = Some(dhcp.uuid),
            Ok(None) => tracing::warn!(subnet_id = %subnet_id, "vpc.create-port: no DHCP options for subnet"),
            Err(e) => tracing::warn!(error = %e, "vpc.create-port: failed to look up DHCP options"),
        }

        self.client.create_switch_port(&switch_name, port).await?;
        Ok(())
    }

    /// `vpc.delete-port`: remove an ENI's switch port.
    pub async fn port_delete(&self, eni_id: &EniId, subnet_id: &SubnetId) -> Result<(), TranslatorError> {
        let port_name = name::eni_port_name(eni_id.as_str());
        let switch_name = name::subnet_switch_name(subnet_id.as_str());
        self.client.delete_switch_port(&switch_name, &port_name).await?;
        Ok(())
    }

    /// `vpc.igw-attach`: build the external switch, gateway router port,
    /// linking switch port, SNAT rule and default route for an IGW
    /// attachment.
    pub async fn igw_attach(&self, igw_id: &IgwId, vpc_id: &VpcId) -> Result<(), TranslatorError> {
        let ext_switch_name = name::external_switch_name(vpc_id.as_str());
        let ext_port_name = name::external_localnet_port_name(vpc_id.as_str());
        let gw_port_name = name::gateway_router_port_name(vpc_id.as_str());
        let switch_gw_port_name = name::external_gateway_port_name(vpc_id.as_str());
        let router_name = name::router_name(vpc_id.as_str());

        if self.client.get_switch(&ext_switch_name).await?.is_some() {
            tracing::info!(vpc_id = %vpc_id, "vpc.igw-attach: external switch already exists, treating as success");
            return Ok(());
        }

        self.client
            .create_switch(LogicalSwitch {
                uuid: String::new(),
                name: ext_switch_name.clone(),
                ports: Vec::new(),
                external_ids: metadata(&[
                    ("role", "external"),
                    ("igw_id", igw_id.as_str()),
                    ("vpc_id", vpc_id.as_str()),
                ]),
            })
            .await?;

        let mut localnet_port = LogicalSwitchPort::new(ext_port_name, "localnet");
        localnet_port.addresses = vec!["unknown".to_string()];
        localnet_port
            .options
            .insert("network_name".to_string(), "external".to_string());

        if let Err(e) = self.client.create_switch_port(&ext_switch_name, localnet_port).await {
            self.best_effort_delete_switch(&ext_switch_name).await;
            return Err(e.into());
        }

        let gw_mac = generate_mac(&gw_port_name);
        if let Err(e) = self
            .client
            .create_router_port(
                &router_name,
                LogicalRouterPort::new(gw_port_name.clone(), name::GATEWAY_LINK_NETWORK, gw_mac),
            )
            .await
        {
            self.best_effort_delete_switch(&ext_switch_name).await;
            return Err(e.into());
        }

        let mut switch_gw_port = LogicalSwitchPort::new(switch_gw_port_name.clone(), "router");
        switch_gw_port.addresses = vec!["router".to_string()];
        switch_gw_port
            .options
            .insert("router-port".to_string(), gw_port_name.clone());

        if let Err(e) = self.client.create_switch_port(&ext_switch_name, switch_gw_port).await {
            self.best_effort_delete_router_port(&router_name, &gw_port_name).await;
            self.best_effort_delete_switch(&ext_switch_name).await;
            return Err(e.into());
        }

        let vpc_cidr = self
            .client
            .get_router(&router_name)
            .await?
            .and_then(|r| r.external_ids.get(&hive_key("cidr")).cloned())
            .unwrap_or_else(|| name::FALLBACK_VPC_CIDR.to_string());

        if let Err(e) = self
            .client
            .add_nat(
                &router_name,
                Nat {
                    uuid: String::new(),
                    nat_type: "snat".to_string(),
                    external_ip: name::GATEWAY_EXTERNAL_IP.to_string(),
                    logical_ip: vpc_cidr,
                    external_ids: metadata(&[("vpc_id", vpc_id.as_str()), ("igw_id", igw_id.as_str())]),
                },
            )
            .await
        {
            tracing::warn!(vpc_id = %vpc_id, error = %e, "vpc.igw-attach: failed to add SNAT rule");
        }

        if let Err(e) = self
            .client
            .add_static_route(
                &router_name,
                StaticRoute {
                    uuid: String::new(),
                    ip_prefix: name::DEFAULT_ROUTE_PREFIX.to_string(),
                    nexthop: name::GATEWAY_NEXTHOP.to_string(),
                    external_ids: metadata(&[("vpc_id", vpc_id.as_str()), ("igw_id", igw_id.as_str())]),
                },
            )
            .await
        {
            tracing::warn!(vpc_id = %vpc_id, error = %e, "vpc.igw-attach: failed to add default route");
        }

        Ok(())
    }

    /// `vpc.igw-detach`: inverse of `igw_attach`.
    pub async fn igw_detach(&self, _igw_id: &IgwId, vpc_id: &VpcId) -> Result<(), TranslatorError> {
        let ext_switch_name = name::external_switch_name(vpc_id.as_str());
        let switch_gw_port_name = name::external_gateway_port_name(vpc_id.as_str());
        let ext_port_name = name::external_localnet_port_name(vpc_id.as_str());
        let gw_port_name = name::gateway_router_port_name(vpc_id.as_str());
        let router_name = name::router_name(vpc_id.as_str());

        let vpc_cidr = self
            .client
            .get_router(&router_name)
            .await?
            .and_then(|r| r.external_ids.get(&hive_key("cidr")).cloned())
            .unwrap_or_else(|| name::FALLBACK_VPC_CIDR.to_string());

        if let Err(e) = self
            .client
            .delete_static_route(&router_name, name::DEFAULT_ROUTE_PREFIX)
            .await
        {
            tracing::warn!(vpc_id = %vpc_id, error = %e, "vpc.igw-detach: failed to delete default route");
        }

        if let Err(e) = self.client.delete_nat(&router_name, "snat", &vpc_cidr).await {
            tracing::warn!(vpc_id = %vpc_id, error = %e, "vpc.igw-detach: failed to delete SNAT rule");
        }

        if let Err(e) = self
            .client
            .delete_switch_port(&ext_switch_name, &switch_gw_port_name)
            .await
        {
            tracing::warn!(port = %switch_gw_port_name, error = %e, "vpc.igw-detach: failed to delete gateway switch port");
        }

        if let Err(e) = self.client.delete_router_port(&router_name, &gw_port_name).await {
            tracing::warn!(port = %gw_port_name, error = %e, "vpc.igw-detach: failed to delete gateway router port");
        }

        if let Err(e) = self.client.delete_switch_port(&ext_switch_name, &ext_port_name).await {
            tracing::warn!(port = %ext_port_name, error = %e, "vpc.igw-detach: failed to delete localnet port");
        }

        self.client.delete_switch(&ext_switch_name).await?;
        Ok(())
    }

    async fn best_effort_delete_switch(&self, name: &str) {
        if let Err(e) = self.client.delete_switch(name).await {
            tracing::warn!(switch = %name, error = %e, "compensation: failed to delete switch");
        }
    }

    async fn best_effort_delete_router_port(&self, router_name: &str, port_name: &str) {
        if let Err(e) = self.client.delete_router_port(router_name, port_name).await {
            tracing::warn!(port = %port_name, error = %e, "compensation: failed to delete router port");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ovn::mock::MockOvnClient;

    fn translator() -> Translator {
        Translator::new(Arc::new(MockOvnClient::new()))
    }

    #[tokio::test]
    async fn vpc_create_is_idempotent() {
        let t = translator();
        let vpc_id = VpcId::from("vpc-integ1");
        t.vpc_create(&vpc_id, Some("10.0.0.0/16"), 1000).await.unwrap();
        t.vpc_create(&vpc_id, Some("10.0.0.0/16"), 1000).await.unwrap();
        let routers = t.client.list_routers().await.unwrap();
        assert_eq!(routers.len(), 1);
    }

    #[tokio::test]
    async fn subnet_create_rejects_invalid_cidr_without_side_effects() {
        let t = translator();
        let vpc_id = VpcId::from("vpc-integ1");
        let subnet_id = SubnetId::from("subnet-integ1");
        t.vpc_create(&vpc_id, None, 1000).await.unwrap();

        let err = t.subnet_create(&subnet_id, &vpc_id, "not-a-cidr").await;
        assert!(err.is_err());
        assert!(t.client.list_switches().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn subnet_create_rolls_back_switch_when_router_port_creation_fails() {
        let t = translator();
        let vpc_id = VpcId::from("vpc-integ1");
        let subnet_id = SubnetId::from("subnet-integ1");
        // No vpc_create: the VPC router does not exist, so create_router_port fails.
        let err = t.subnet_create(&subnet_id, &vpc_id, "10.0.1.0/24").await;
        assert!(err.is_err());
        assert!(t.client.list_switches().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_to_end_vpc_subnet_eni() {
        let t = translator();
        let vpc_id = VpcId::from("vpc-integ1");
        let subnet_id = SubnetId::from("subnet-integ1");
        let eni_id = EniId::from("eni-integ1");

        t.vpc_create(&vpc_id, Some("10.0.0.0/16"), 1000).await.unwrap();
        t.subnet_create(&subnet_id, &vpc_id, "10.0.1.0/24").await.unwrap();
        t.port_create(&eni_id, &subnet_id, "10.0.1.10", "02:00:00:aa:bb:01")
            .await
            .unwrap();

        let router = t.client.get_router("vpc-vpc-integ1").await.unwrap().unwrap();
        assert_eq!(router.ports.len(), 1);

        let switch = t.client.get_switch("subnet-subnet-integ1").await.unwrap().unwrap();
        assert_eq!(switch.ports.len(), 2);

        let dhcp = t
            .client
            .find_dhcp_options_by_cidr("10.0.1.0/24")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dhcp.options.get("router").unwrap(), "10.0.1.1");
        assert_eq!(dhcp.options.get("mtu").unwrap(), "1442");

        let eni_port = t.client.get_switch_port("port-eni-integ1").await.unwrap().unwrap();
        assert_eq!(eni_port.addresses, vec!["02:00:00:aa:bb:01 10.0.1.10".to_string()]);
        assert_eq!(eni_port.dhcpv4_options.as_deref(), Some(dhcp.uuid.as_str()));
    }

    #[tokio::test]
    async fn igw_attach_then_detach_restores_router_to_single_port() {
        let t = translator();
        let vpc_id = VpcId::from("vpc-integ1");
        let subnet_id = SubnetId::from("subnet-integ1");
        let igw_id = IgwId::from("igw-0123456789abcdef01");

        t.vpc_create(&vpc_id, Some("10.0.0.0/16"), 1000).await.unwrap();
        t.subnet_create(&subnet_id, &vpc_id, "10.0.1.0/24").await.unwrap();
        t.igw_attach(&igw_id, &vpc_id).await.unwrap();

        let router = t.client.get_router("vpc-vpc-integ1").await.unwrap().unwrap();
        assert_eq!(router.ports.len(), 2);
        assert_eq!(router.nat.len(), 1);
        assert_eq!(router.static_routes.len(), 1);
        assert!(t.client.get_switch("ext-vpc-integ1").await.unwrap().is_some());

        t.igw_detach(&igw_id, &vpc_id).await.unwrap();

        let router = t.client.get_router("vpc-vpc-integ1").await.unwrap().unwrap();
        assert_eq!(router.ports.len(), 1);
        assert_eq!(router.nat.len(), 0);
        assert_eq!(router.static_routes.len(), 0);
        assert!(t.client.get_switch("ext-vpc-integ1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn vpc_delete_cascades_switches_and_dhcp_rows() {
        let t = translator();
        let vpc_id = VpcId::from("vpc-integ1");
        let subnet_id = SubnetId::from("subnet-integ1");

        t.vpc_create(&vpc_id, Some("10.0.0.0/16"), 1000).await.unwrap();
        t.subnet_create(&subnet_id, &vpc_id, "10.0.1.0/24").await.unwrap();
        t.vpc_delete(&vpc_id).await.unwrap();

        assert!(t.client.list_switches().await.unwrap().is_empty());
        assert!(t.client.list_dhcp_options().await.unwrap().is_empty());
        assert!(t.client.get_router("vpc-vpc-integ1").await.unwrap().is_none());
    }
}
