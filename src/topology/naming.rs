//! Deterministic OVN object names: name resolution is pure string
//! concatenation, never a database scan.
//!
//! Every function here is a pure function of its input IDs. Keeping them in
//! one place means the translator never builds a name ad hoc at a call
//! site — a rename here is the only place a naming convention can drift.

/// Router name for a VPC: `vpc-<vpc_id>`.
pub fn router_name(vpc_id: &str) -> String {
    format!("vpc-{vpc_id}")
}

/// Subnet switch name: `subnet-<subnet_id>`.
pub fn subnet_switch_name(subnet_id: &str) -> String {
    format!("subnet-{subnet_id}")
}

/// External switch name for a VPC's IGW attachment: `ext-<vpc_id>`.
pub fn external_switch_name(vpc_id: &str) -> String {
    format!("ext-{vpc_id}")
}

/// Router port name for a subnet: `rtr-<subnet_id>`.
pub fn subnet_router_port_name(subnet_id: &str) -> String {
    format!("rtr-{subnet_id}")
}

/// Gateway router port name for a VPC's IGW attachment: `gw-<vpc_id>`.
pub fn gateway_router_port_name(vpc_id: &str) -> String {
    format!("gw-{vpc_id}")
}

/// Router-type switch port linking a subnet switch to its router port:
/// `rtr-port-<subnet_id>`.
pub fn subnet_switch_router_port_name(subnet_id: &str) -> String {
    format!("rtr-port-{subnet_id}")
}

/// ENI switch port name: `port-<eni_id>`.
pub fn eni_port_name(eni_id: &str) -> String {
    format!("port-{eni_id}")
}

/// Localnet switch port name on the external switch: `ext-port-<vpc_id>`.
pub fn external_localnet_port_name(vpc_id: &str) -> String {
    format!("ext-port-{vpc_id}")
}

/// Router-type switch port linking the external switch to the gateway
/// router port: `gw-port-<vpc_id>`.
pub fn external_gateway_port_name(vpc_id: &str) -> String {
    format!("gw-port-{vpc_id}")
}

/// Link-local network for the IGW gateway router port.
pub const GATEWAY_LINK_NETWORK: &str = "169.254.0.1/30";

/// External IP used on the SNAT rule and as the gateway port's address.
pub const GATEWAY_EXTERNAL_IP: &str = "169.254.0.1";

/// Next-hop used on the default static route installed for an attached IGW.
pub const GATEWAY_NEXTHOP: &str = "169.254.0.2";

/// Default route prefix installed for an attached IGW.
pub const DEFAULT_ROUTE_PREFIX: &str = "0.0.0.0/0";

/// Fallback VPC CIDR used for the SNAT rule's `logical_ip` when the router
/// carries no `hive:cidr` metadata.
pub const FALLBACK_VPC_CIDR: &str = "10.0.0.0/8";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_pure_functions_of_their_id() {
        assert_eq!(router_name("vpc-integ1"), router_name("vpc-integ1"));
        assert_eq!(router_name("vpc-integ1"), "vpc-vpc-integ1");
    }

    #[test]
    fn distinct_ids_in_the_same_role_yield_distinct_names() {
        assert_ne!(subnet_switch_name("subnet-a"), subnet_switch_name("subnet-b"));
        assert_ne!(eni_port_name("eni-a"), eni_port_name("eni-b"));
    }

    #[test]
    fn distinct_roles_do_not_collide_for_the_same_id() {
        let id = "vpc-integ1";
        assert_ne!(router_name(id), external_switch_name(id));
        assert_ne!(gateway_router_port_name(id), external_gateway_port_name(id));
    }
}
