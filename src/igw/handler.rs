//! Internet gateway handler: the AWS-shaped attach/detach state machine.
//!
//! OVN-side effects are never applied directly here — a successful attach
//! or detach publishes `vpc.igw-attach`/`vpc.igw-detach` and waits for C2's
//! reply; the registry mutation is rolled back if that reply is a failure
//! or the request times out.

use crate::bus::messages::{subjects, VpcIgwAttach, VpcIgwDetach};
use crate::bus::publisher::EventPublisher;
use crate::domain::value_objects::VpcId;
use crate::igw::errors::IgwError;
use crate::igw::registry::{IgwRecord, IgwRegistry, IgwState};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

/// A `TagSpecifications` entry on `CreateInternetGateway`.
#[derive(Debug, Clone, Default)]
pub struct TagSpecification {
    pub resource_type: String,
    pub tags: HashMap<String, String>,
}

/// A single `DescribeInternetGateways` filter: `key` against one of
/// `values`.
#[derive(Debug, Clone)]
pub struct Filter {
    pub key: String,
    pub values: Vec<String>,
}

fn validate_igw_id(igw_id: &str) -> Result<(), IgwError> {
    if igw_id.is_empty() {
        return Err(IgwError::MissingParameter("InternetGatewayId"));
    }
    if !igw_id.starts_with("igw-") {
        return Err(IgwError::InvalidInternetGatewayIdMalformed(igw_id.to_string()));
    }
    Ok(())
}

fn validate_vpc_id(vpc_id: &str) -> Result<(), IgwError> {
    if vpc_id.is_empty() {
        return Err(IgwError::MissingParameter("VpcId"));
    }
    if !vpc_id.starts_with("vpc-") {
        return Err(IgwError::InvalidVpcIdMalformed(vpc_id.to_string()));
    }
    Ok(())
}

/// Exposes the five AWS-shaped internet gateway operations.
pub struct IgwHandler {
    registry: IgwRegistry,
    publisher: Arc<dyn EventPublisher>,
}

impl IgwHandler {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            registry: IgwRegistry::new(),
            publisher,
        }
    }

    /// `CreateInternetGateway`: no OVN effect.
    pub async fn create_internet_gateway(
        &self,
        tag_specifications: Option<TagSpecification>,
    ) -> Result<IgwRecord, IgwError> {
        let tags = match tag_specifications {
            Some(spec) if !spec.resource_type.is_empty() && spec.resource_type != "internet-gateway" => {
                return Err(IgwError::MissingParameter("ResourceType"));
            }
            Some(spec) => spec.tags,
            None => HashMap::new(),
        };

        let record = IgwRecord {
            id: IgwRegistry::new_id(),
            state: IgwState::Detached,
            tags,
            created_at: Utc::now(),
        };

        let mut registry = self.registry.lock().await;
        registry.insert(record.id.as_str().to_string(), record.clone());
        Ok(record)
    }

    /// `AttachInternetGateway`.
    pub async fn attach_internet_gateway(&self, igw_id: &str, vpc_id: &str) -> Result<(), IgwError> {
        validate_igw_id(igw_id)?;
        validate_vpc_id(vpc_id)?;

        let mut registry = self.registry.lock().await;
        let record = registry
            .get_mut(igw_id)
            .ok_or_else(|| IgwError::InvalidInternetGatewayIdNotFound(igw_id.to_string()))?;

        if record.state != IgwState::Detached {
            return Err(IgwError::ResourceAlreadyAssociated(igw_id.to_string()));
        }

        record.state = IgwState::Attached(VpcId::from(vpc_id));

        let payload = serde_json::to_vec(&VpcIgwAttach {
            internet_gateway_id: igw_id.to_string(),
            vpc_id: vpc_id.to_string(),
        })
        .expect("VpcIgwAttach always serializes");

        match self.publisher.request(subjects::VPC_IGW_ATTACH, payload).await {
            Ok(reply) if reply.success => Ok(()),
            Ok(reply) => {
                let record = registry.get_mut(igw_id).expect("present, locked throughout");
                record.state = IgwState::Detached;
                Err(IgwError::Downstream(reply.error.unwrap_or_default()))
            }
            Err(e) => {
                let record = registry.get_mut(igw_id).expect("present, locked throughout");
                record.state = IgwState::Detached;
                Err(IgwError::Downstream(e.to_string()))
            }
        }
    }

    /// `DetachInternetGateway`.
    pub async fn detach_internet_gateway(&self, igw_id: &str, vpc_id: &str) -> Result<(), IgwError> {
        validate_igw_id(igw_id)?;
        validate_vpc_id(vpc_id)?;

        let mut registry = self.registry.lock().await;
        let record = registry
            .get_mut(igw_id)
            .ok_or_else(|| IgwError::InvalidInternetGatewayIdNotFound(igw_id.to_string()))?;

        if record.state.vpc_id().map(|v| v.as_str()) != Some(vpc_id) {
            return Err(IgwError::GatewayNotAttached(igw_id.to_string(), vpc_id.to_string()));
        }

        let previous = std::mem::replace(&mut record.state, IgwState::Detached);

        let payload = serde_json::to_vec(&VpcIgwDetach {
            internet_gateway_id: igw_id.to_string(),
            vpc_id: vpc_id.to_string(),
        })
        .expect("VpcIgwDetach always serializes");

        match self.publisher.request(subjects::VPC_IGW_DETACH, payload).await {
            Ok(reply) if reply.success => Ok(()),
            Ok(reply) => {
                let record = registry.get_mut(igw_id).expect("present, locked throughout");
                record.state = previous;
                Err(IgwError::Downstream(reply.error.unwrap_or_default()))
            }
            Err(e) => {
                let record = registry.get_mut(igw_id).expect("present, locked throughout");
                record.state = previous;
                Err(IgwError::Downstream(e.to_string()))
            }
        }
    }

    /// `DeleteInternetGateway`.
    pub async fn delete_internet_gateway(&self, igw_id: &str) -> Result<(), IgwError> {
        validate_igw_id(igw_id)?;

        let mut registry = self.registry.lock().await;
        let record = registry
            .get(igw_id)
            .ok_or_else(|| IgwError::InvalidInternetGatewayIdNotFound(igw_id.to_string()))?;

        if record.state != IgwState::Detached {
            return Err(IgwError::DependencyViolation(igw_id.to_string()));
        }

        registry.remove(igw_id);
        Ok(())
    }

    /// `DescribeInternetGateways`.
    pub async fn describe_internet_gateways(
        &self,
        igw_ids: Option<Vec<String>>,
        filters: &[Filter],
    ) -> Result<Vec<IgwRecord>, IgwError> {
        let registry = self.registry.lock().await;

        let candidates: Vec<IgwRecord> = match igw_ids {
            Some(ids) => {
                let mut records = Vec::with_capacity(ids.len());
                for id in ids {
                    let record = registry
                        .get(&id)
                        .cloned()
                        .ok_or(IgwError::InvalidInternetGatewayIdNotFound(id))?;
                    records.push(record);
                }
                records
            }
            None => registry.values().cloned().collect(),
        };

        Ok(candidates
            .into_iter()
            .filter(|record| filters.iter().all(|f| matches_filter(record, f)))
            .collect())
    }
}

fn matches_filter(record: &IgwRecord, filter: &Filter) -> bool {
    match filter.key.as_str() {
        "internet-gateway-id" => filter.values.iter().any(|v| v == record.id.as_str()),
        "attachment.vpc-id" => record
            .state
            .vpc_id()
            .map(|vpc_id| filter.values.iter().any(|v| v == vpc_id.as_str()))
            .unwrap_or(false),
        "attachment.state" => record.attachment_state().is_some() && filter.values.iter().any(|v| v == "attached"),
        key if key.starts_with("tag:") => {
            let tag_key = &key[4..];
            record
                .tags
                .get(tag_key)
                .map(|v| filter.values.iter().any(|fv| fv == v))
                .unwrap_or(false)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::publisher::mock::MockPublisher;

    fn handler(publisher: MockPublisher) -> IgwHandler {
        IgwHandler::new(Arc::new(publisher))
    }

    #[tokio::test]
    async fn attach_then_detach_round_trips_through_detached_state() {
        let h = handler(MockPublisher::succeeding());
        let record = h.create_internet_gateway(None).await.unwrap();
        h.attach_internet_gateway(record.id.as_str(), "vpc-a").await.unwrap();

        let described = h
            .describe_internet_gateways(Some(vec![record.id.as_str().to_string()]), &[])
            .await
            .unwrap();
        assert_eq!(described[0].state, IgwState::Attached(VpcId::from("vpc-a")));

        h.detach_internet_gateway(record.id.as_str(), "vpc-a").await.unwrap();
        let described = h
            .describe_internet_gateways(Some(vec![record.id.as_str().to_string()]), &[])
            .await
            .unwrap();
        assert_eq!(described[0].state, IgwState::Detached);
    }

    #[tokio::test]
    async fn attach_twice_is_rejected_as_already_associated() {
        let h = handler(MockPublisher::succeeding());
        let record = h.create_internet_gateway(None).await.unwrap();
        h.attach_internet_gateway(record.id.as_str(), "vpc-a").await.unwrap();
        let err = h.attach_internet_gateway(record.id.as_str(), "vpc-b").await.unwrap_err();
        assert!(matches!(err, IgwError::ResourceAlreadyAssociated(_)));
    }

    #[tokio::test]
    async fn detach_from_wrong_vpc_leaves_attachment_untouched() {
        let h = handler(MockPublisher::succeeding());
        let record = h.create_internet_gateway(None).await.unwrap();
        h.attach_internet_gateway(record.id.as_str(), "vpc-a").await.unwrap();

        let err = h.detach_internet_gateway(record.id.as_str(), "vpc-b").await.unwrap_err();
        assert!(matches!(err, IgwError::GatewayNotAttached(_, _)));

        let described = h
            .describe_internet_gateways(Some(vec![record.id.as_str().to_string()]), &[])
            .await
            .unwrap();
        assert_eq!(described[0].state, IgwState::Attached(VpcId::from("vpc-a")));
    }

    #[tokio::test]
    async fn delete_while_attached_is_a_dependency_violation() {
        let h = handler(MockPublisher::succeeding());
        let record = h.create_internet_gateway(None).await.unwrap();
        h.attach_internet_gateway(record.id.as_str(), "vpc-a").await.unwrap();
        let err = h.delete_internet_gateway(record.id.as_str()).await.unwrap_err();
        assert!(matches!(err, IgwError::DependencyViolation(_)));
    }

    #[tokio::test]
    async fn attach_rolls_back_registry_on_downstream_failure() {
        let h = handler(MockPublisher::failing("OVN client not connected"));
        let record = h.create_internet_gateway(None).await.unwrap();
        let err = h.attach_internet_gateway(record.id.as_str(), "vpc-a").await.unwrap_err();
        assert!(matches!(err, IgwError::Downstream(_)));

        let described = h
            .describe_internet_gateways(Some(vec![record.id.as_str().to_string()]), &[])
            .await
            .unwrap();
        assert_eq!(described[0].state, IgwState::Detached);
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected_before_touching_the_registry() {
        let h = handler(MockPublisher::succeeding());
        let err = h.attach_internet_gateway("not-an-igw", "vpc-a").await.unwrap_err();
        assert!(matches!(err, IgwError::InvalidInternetGatewayIdMalformed(_)));

        let err = h.attach_internet_gateway("", "vpc-a").await.unwrap_err();
        assert!(matches!(err, IgwError::MissingParameter(_)));
    }

    #[tokio::test]
    async fn describe_filters_are_conjunctive() {
        let h = handler(MockPublisher::succeeding());
        let mut tags = HashMap::new();
        tags.insert("Name".to_string(), "prod".to_string());
        let record = h
            .create_internet_gateway(Some(TagSpecification {
                resource_type: "internet-gateway".to_string(),
                tags,
            }))
            .await
            .unwrap();
        h.attach_internet_gateway(record.id.as_str(), "vpc-a").await.unwrap();

        let matching = h
            .describe_internet_gateways(
                None,
                &[
                    Filter { key: "attachment.vpc-id".to_string(), values: vec!["vpc-a".to_string()] },
                    Filter { key: "tag:Name".to_string(), values: vec!["prod".to_string()] },
                ],
            )
            .await
            .unwrap();
        assert_eq!(matching.len(), 1);

        let non_matching = h
            .describe_internet_gateways(
                None,
                &[
                    Filter { key: "attachment.vpc-id".to_string(), values: vec!["vpc-a".to_string()] },
                    Filter { key: "tag:Name".to_string(), values: vec!["staging".to_string()] },
                ],
            )
            .await
            .unwrap();
        assert!(non_matching.is_empty());
    }
}
