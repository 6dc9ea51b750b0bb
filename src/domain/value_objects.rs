//! Value objects for the VPC topology domain
//!
//! AWS-shaped identifiers arrive on the wire as plain strings
//! (`vpc-integ1`, `subnet-integ1`, ...); we wrap them in newtypes so the
//! translator can never confuse a `VpcId` with a `SubnetId` at a call site,
//! while still deriving OVN object names by pure string concatenation —
//! name resolution must never require a database scan.

use crate::domain::errors::CidrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

macro_rules! aws_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Borrow the inner identifier string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

aws_id!(VpcId, "Identifier of a VPC, e.g. `vpc-integ1`.");
aws_id!(SubnetId, "Identifier of a subnet, e.g. `subnet-integ1`.");
aws_id!(EniId, "Identifier of an elastic network interface.");
aws_id!(IgwId, "Identifier of an internet gateway, e.g. `igw-<18 hex chars>`.");

/// A parsed IPv4 CIDR block (`<address>/<prefix>`).
///
/// Only IPv4 is supported — subnet creation explicitly fails for
/// non-IPv4 or malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    /// Parse a CIDR string such as `"10.0.1.0/24"`.
    ///
    /// Fails with [`CidrError::Malformed`] for anything that doesn't parse as
    /// `ipnetwork::IpNetwork`, and with [`CidrError::NotIpv4`] for a
    /// syntactically valid IPv6 network.
    pub fn parse(cidr: &str) -> Result<Self, CidrError> {
        let network: ipnetwork::IpNetwork = cidr
            .parse()
            .map_err(|_| CidrError::Malformed(cidr.to_string()))?;

        match network {
            ipnetwork::IpNetwork::V4(v4) => Ok(Self {
                network: v4.network(),
                prefix: v4.prefix(),
            }),
            ipnetwork::IpNetwork::V6(_) => Err(CidrError::NotIpv4(cidr.to_string())),
        }
    }

    /// The network address (host bits zeroed).
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// The prefix length.
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// The gateway IP for this subnet: the network address with its last
    /// octet incremented by one.
    pub fn gateway_ip(&self) -> Ipv4Addr {
        let mut octets = self.network.octets();
        octets[3] = octets[3].wrapping_add(1);
        Ipv4Addr::from(octets)
    }

    /// Render as `<gateway>/<prefix>`, the network string stored on router
    /// ports.
    pub fn gateway_network(&self) -> String {
        format!("{}/{}", self.gateway_ip(), self.prefix)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

/// Deterministically derive a locally-administered MAC address from an
/// arbitrary identifier string.
///
/// The first three octets are fixed to the locally-administered unicast
/// prefix `02:00:00`; the remaining three are a stable hash of `id`, so the
/// same `id` always yields the same MAC and distinct ids yield distinct MACs
/// (within the test set — this is not a cryptographic guarantee).
pub fn generate_mac(id: &str) -> String {
    let digest = fnv1a(id.as_bytes());
    let bytes = digest.to_be_bytes();
    format!(
        "02:00:00:{:02x}:{:02x}:{:02x}",
        bytes[5], bytes[6], bytes[7]
    )
}

/// FNV-1a, 64-bit: a small, dependency-free, stable hash. We only need
/// determinism and a low collision rate over a handful of bytes, not
/// cryptographic strength, so there is no reason to pull in a hashing crate
/// for this.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_ip_increments_last_octet() {
        let cidr = Ipv4Cidr::parse("10.0.1.0/24").unwrap();
        assert_eq!(cidr.gateway_ip(), Ipv4Addr::new(10, 0, 1, 1));
        assert_eq!(cidr.gateway_network(), "10.0.1.1/24");
    }

    #[test]
    fn gateway_ip_preserves_prefix_for_any_valid_cidr() {
        for cidr_str in ["192.168.0.0/16", "172.16.5.0/28", "10.10.10.0/30"] {
            let cidr = Ipv4Cidr::parse(cidr_str).unwrap();
            let original: ipnetwork::Ipv4Network = cidr_str.parse().unwrap();
            assert_eq!(cidr.prefix(), original.prefix());
            let mut expected = original.network().octets();
            expected[3] = expected[3].wrapping_add(1);
            assert_eq!(cidr.gateway_ip(), Ipv4Addr::from(expected));
        }
    }

    #[test]
    fn rejects_non_ipv4() {
        assert!(matches!(
            Ipv4Cidr::parse("2001:db8::/32"),
            Err(CidrError::NotIpv4(_))
        ));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            Ipv4Cidr::parse("not-a-cidr"),
            Err(CidrError::Malformed(_))
        ));
    }

    #[test]
    fn mac_is_deterministic_and_locally_administered() {
        let a = generate_mac("subnet-integ1");
        let b = generate_mac("subnet-integ1");
        assert_eq!(a, b);
        assert!(a.starts_with("02:00:00:"));
    }

    #[test]
    fn mac_differs_across_distinct_ids() {
        let ids = ["subnet-a", "subnet-b", "vpc-x", "gw-vpc-x", "subnet-c"];
        let macs: Vec<String> = ids.iter().map(|id| generate_mac(id)).collect();
        for i in 0..macs.len() {
            for j in (i + 1)..macs.len() {
                assert_ne!(macs[i], macs[j], "{} and {} collided", ids[i], ids[j]);
            }
        }
    }
}
