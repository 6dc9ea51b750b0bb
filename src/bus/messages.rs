//! Wire payloads for the eight VPC lifecycle topics.
//!
//! Every payload is a plain JSON object; unknown fields are ignored
//! (`serde(deny_unknown_fields)` is deliberately absent). Optional fields use
//! `Option<T>` and default to `None` when missing, keeping "unset" distinct
//! from "empty".

use serde::{Deserialize, Serialize};

/// `vpc.create`
#[derive(Debug, Clone, Deserialize)]
pub struct VpcCreate {
    pub vpc_id: String,
    pub cidr_block: Option<String>,
    pub vni: u32,
}

/// `vpc.delete`
#[derive(Debug, Clone, Deserialize)]
pub struct VpcDelete {
    pub vpc_id: String,
}

/// `vpc.create-subnet`
#[derive(Debug, Clone, Deserialize)]
pub struct VpcCreateSubnet {
    pub subnet_id: String,
    pub vpc_id: String,
    pub cidr_block: String,
}

/// `vpc.delete-subnet`
#[derive(Debug, Clone, Deserialize)]
pub struct VpcDeleteSubnet {
    pub subnet_id: String,
    pub vpc_id: String,
    pub cidr_block: String,
}

/// `vpc.create-port`
#[derive(Debug, Clone, Deserialize)]
pub struct VpcCreatePort {
    pub network_interface_id: String,
    pub subnet_id: String,
    pub vpc_id: String,
    pub private_ip_address: String,
    pub mac_address: String,
}

/// `vpc.delete-port`: same shape as [`VpcCreatePort`].
#[derive(Debug, Clone, Deserialize)]
pub struct VpcDeletePort {
    pub network_interface_id: String,
    pub subnet_id: String,
    pub vpc_id: String,
    pub private_ip_address: String,
    pub mac_address: String,
}

/// `vpc.igw-attach`
#[derive(Debug, Clone, Deserialize)]
pub struct VpcIgwAttach {
    pub internet_gateway_id: String,
    pub vpc_id: String,
}

/// `vpc.igw-detach`
#[derive(Debug, Clone, Deserialize)]
pub struct VpcIgwDetach {
    pub internet_gateway_id: String,
    pub vpc_id: String,
}

/// Reply envelope published back on a request's reply subject, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplyEnvelope {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// One subject name per lifecycle topic.
pub mod subjects {
    pub const VPC_CREATE: &str = "vpc.create";
    pub const VPC_DELETE: &str = "vpc.delete";
    pub const VPC_CREATE_SUBNET: &str = "vpc.create-subnet";
    pub const VPC_DELETE_SUBNET: &str = "vpc.delete-subnet";
    pub const VPC_CREATE_PORT: &str = "vpc.create-port";
    pub const VPC_DELETE_PORT: &str = "vpc.delete-port";
    pub const VPC_IGW_ATTACH: &str = "vpc.igw-attach";
    pub const VPC_IGW_DETACH: &str = "vpc.igw-detach";

    /// All eight subjects, in the order the daemon subscribes to them.
    pub const ALL: [&str; 8] = [
        VPC_CREATE,
        VPC_DELETE,
        VPC_CREATE_SUBNET,
        VPC_DELETE_SUBNET,
        VPC_CREATE_PORT,
        VPC_DELETE_PORT,
        VPC_IGW_ATTACH,
        VPC_IGW_DETACH,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_envelope_omits_error_field_on_success() {
        let json = serde_json::to_string(&ReplyEnvelope::ok()).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }

    #[test]
    fn reply_envelope_includes_error_on_failure() {
        let json = serde_json::to_string(&ReplyEnvelope::failure("boom")).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"boom"}"#);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let payload = r#"{"vpc_id":"vpc-integ1","cidr_block":"10.0.0.0/16","vni":1000,"extra":"field"}"#;
        let decoded: VpcCreate = serde_json::from_str(payload).unwrap();
        assert_eq!(decoded.vpc_id, "vpc-integ1");
        assert_eq!(decoded.vni, 1000);
    }
}
