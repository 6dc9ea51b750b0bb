//! Event bus adapter: subscribes to the eight lifecycle topics on core
//! NATS pub/sub (no queue group — every daemon instance receives every
//! event) and dispatches decoded payloads to the translator.
//!
//! Nothing in this daemon's scope needs durability or replay — every
//! handler is idempotent and publishers are expected to retry on timeout —
//! so this adapter uses core `async_nats::Client::subscribe`/`publish`
//! rather than a JetStream consumer.

use crate::bus::messages::{
    subjects, ReplyEnvelope, VpcCreate, VpcCreatePort, VpcCreateSubnet, VpcDelete, VpcDeletePort, VpcDeleteSubnet,
    VpcIgwAttach, VpcIgwDetach,
};
use crate::domain::value_objects::{EniId, IgwId, SubnetId, VpcId};
use crate::topology::Translator;
use async_nats::Client;
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Errors raised while standing up the bus adapter.
#[derive(Error, Debug)]
pub enum BusError {
    #[error("failed to connect to NATS at {0}: {1}")]
    Connect(String, async_nats::ConnectError),

    #[error("failed to subscribe to {0}: {1}")]
    Subscribe(&'static str, async_nats::SubscribeError),
}

/// Subscribes to the eight lifecycle topics and dispatches to a
/// [`Translator`], replying with a [`ReplyEnvelope`] on each request's reply
/// subject when one is present.
pub struct BusAdapter {
    client: Client,
    translator: Arc<Translator>,
    tasks: Vec<JoinHandle<()>>,
}

impl BusAdapter {
    /// Connect to `nats_url` and return an adapter ready to [`Self::subscribe_all`].
    pub async fn connect(nats_url: &str, translator: Arc<Translator>) -> Result<Self, BusError> {
        tracing::info!(url = %nats_url, "connecting to event bus");
        let client = async_nats::connect(nats_url)
            .await
            .map_err(|e| BusError::Connect(nats_url.to_string(), e))?;
        Ok(Self {
            client,
            translator,
            tasks: Vec::new(),
        })
    }

    /// Subscribe to all eight topics, spawning one dispatch task per topic.
    pub async fn subscribe_all(&mut self) -> Result<(), BusError> {
        self.spawn(subjects::VPC_CREATE, |t, b| async move { handle_vpc_create(&t, &b).await }).await?;
        self.spawn(subjects::VPC_DELETE, |t, b| async move { handle_vpc_delete(&t, &b).await }).await?;
        self.spawn(subjects::VPC_CREATE_SUBNET, |t, b| async move { handle_vpc_create_subnet(&t, &b).await }).await?;
        self.spawn(subjects::VPC_DELETE_SUBNET, |t, b| async move { handle_vpc_delete_subnet(&t, &b).await }).await?;
        self.spawn(subjects::VPC_CREATE_PORT, |t, b| async move { handle_vpc_create_port(&t, &b).await }).await?;
        self.spawn(subjects::VPC_DELETE_PORT, |t, b| async move { handle_vpc_delete_port(&t, &b).await }).await?;
        self.spawn(subjects::VPC_IGW_ATTACH, |t, b| async move { handle_igw_attach(&t, &b).await }).await?;
        self.spawn(subjects::VPC_IGW_DETACH, |t, b| async move { handle_igw_detach(&t, &b).await }).await?;
        Ok(())
    }

    async fn spawn<F, Fut>(&mut self, subject: &'static str, handle: F) -> Result<(), BusError>
    where
        F: Fn(Arc<Translator>, Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ReplyEnvelope> + Send,
    {
        let mut subscriber = self
            .client
            .subscribe(subject)
            .await
            .map_err(|e| BusError::Subscribe(subject, e))?;
        let client = self.client.clone();
        let translator = self.translator.clone();

        let task = tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                let reply_to = message.reply.clone();
                let translator = translator.clone();
                let body = message.payload.to_vec();

                if !translator.ovn_connected().await {
                    let envelope = ReplyEnvelope::failure("OVN client not connected");
                    if let Some(reply_to) = reply_to {
                        publish_reply(&client, reply_to, &envelope).await;
                    }
                    continue;
                }

                let envelope = handle(translator, body).await;
                if let Some(reply_to) = reply_to {
                    publish_reply(&client, reply_to, &envelope).await;
                }
            }
        });
        self.tasks.push(task);
        Ok(())
    }

    /// Cancel every subscription task during shutdown.
    pub fn unsubscribe_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

async fn publish_reply(client: &Client, reply_to: async_nats::Subject, envelope: &ReplyEnvelope) {
    let payload = match serde_json::to_vec(envelope) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode reply envelope");
            return;
        }
    };
    if let Err(e) = client.publish(reply_to, payload.into()).await {
        tracing::warn!(error = %e, "failed to publish reply");
    }
}

fn decode_error(subject: &str, error: serde_json::Error) -> ReplyEnvelope {
    tracing::warn!(subject, error = %error, "failed to decode message payload");
    ReplyEnvelope::failure(error)
}

async fn handle_vpc_create(translator: &Translator, body: &[u8]) -> ReplyEnvelope {
    let request: VpcCreate = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return decode_error(subjects::VPC_CREATE, e),
    };
    let vpc_id = VpcId::from(request.vpc_id);
    match translator
        .vpc_create(&vpc_id, request.cidr_block.as_deref(), request.vni)
        .await
    {
        Ok(()) => ReplyEnvelope::ok(),
        Err(e) => ReplyEnvelope::failure(e),
    }
}

async fn handle_vpc_delete(translator: &Translator, body: &[u8]) -> ReplyEnvelope {
    let request: VpcDelete = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return decode_error(subjects::VPC_DELETE, e),
    };
    let vpc_id = VpcId::from(request.vpc_id);
    match translator.vpc_delete(&vpc_id).await {
        Ok(()) => ReplyEnvelope::ok(),
        Err(e) => ReplyEnvelope::failure(e),
    }
}

async fn handle_vpc_create_subnet(translator: &Translator, body: &[u8]) -> ReplyEnvelope {
    let request: VpcCreateSubnet = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return decode_error(subjects::VPC_CREATE_SUBNET, e),
    };
    let subnet_id = SubnetId::from(request.subnet_id);
    let vpc_id = VpcId::from(request.vpc_id);
    match translator.subnet_create(&subnet_id, &vpc_id, &request.cidr_block).await {
        Ok(()) => ReplyEnvelope::ok(),
        Err(e) => ReplyEnvelope::failure(e),
    }
}

async fn handle_vpc_delete_subnet(translator: &Translator, body: &[u8]) -> ReplyEnvelope {
    let request: VpcDeleteSubnet = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return decode_error(subjects::VPC_DELETE_SUBNET, e),
    };
    let subnet_id = SubnetId::from(request.subnet_id);
    let vpc_id = VpcId::from(request.vpc_id);
    match translator.subnet_delete(&subnet_id, &vpc_id, &request.cidr_block).await {
        Ok(()) => ReplyEnvelope::ok(),
        Err(e) => ReplyEnvelope::failure(e),
    }
}

async fn handle_vpc_create_port(translator: &Translator, body: &[u8]) -> ReplyEnvelope {
    let request: VpcCreatePort = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return decode_error(subjects::VPC_CREATE_PORT, e),
    };
    let eni_id = EniId::from(request.network_interface_id);
    let subnet_id = SubnetId::from(request.subnet_id);
    match translator
        .port_create(&eni_id, &subnet_id, &request.private_ip_address, &request.mac_address)
        .await
    {
        Ok(()) => ReplyEnvelope::ok(),
        Err(e) => ReplyEnvelope::failure(e),
    }
}

async fn handle_vpc_delete_port(translator: &Translator, body: &[u8]) -> ReplyEnvelope {
    let request: VpcDeletePort = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return decode_error(subjects::VPC_DELETE_PORT, e),
    };
    let eni_id = EniId::from(request.network_interface_id);
    let subnet_id = SubnetId::from(request.subnet_id);
    match translator.port_delete(&eni_id, &subnet_id).await {
        Ok(()) => ReplyEnvelope::ok(),
        Err(e) => ReplyEnvelope::failure(e),
    }
}

async fn handle_igw_attach(translator: &Translator, body: &[u8]) -> ReplyEnvelope {
    let request: VpcIgwAttach = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return decode_error(subjects::VPC_IGW_ATTACH, e),
    };
    let igw_id = IgwId::from(request.internet_gateway_id);
    let vpc_id = VpcId::from(request.vpc_id);
    match translator.igw_attach(&igw_id, &vpc_id).await {
        Ok(()) => ReplyEnvelope::ok(),
        Err(e) => ReplyEnvelope::failure(e),
    }
}

async fn handle_igw_detach(translator: &Translator, body: &[u8]) -> ReplyEnvelope {
    let request: VpcIgwDetach = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return decode_error(subjects::VPC_IGW_DETACH, e),
    };
    let igw_id = IgwId::from(request.internet_gateway_id);
    let vpc_id = VpcId::from(request.vpc_id);
    match translator.igw_detach(&igw_id, &vpc_id).await {
        Ok(()) => ReplyEnvelope::ok(),
        Err(e) => ReplyEnvelope::failure(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ovn::mock::MockOvnClient;
    use crate::ovn::OvnClient;

    #[tokio::test]
    async fn decode_error_surfaces_as_failure_envelope() {
        let translator = Translator::new(Arc::new(MockOvnClient::new()));
        let envelope = handle_vpc_create(&translator, b"not json").await;
        assert!(!envelope.success);
        assert!(envelope.error.is_some());
    }

    #[tokio::test]
    async fn vpc_create_dispatch_round_trips_through_translator() {
        let client = Arc::new(MockOvnClient::new());
        client.connect().await.unwrap();
        let translator = Translator::new(client.clone());
        let body = br#"{"vpc_id":"vpc-integ1","cidr_block":"10.0.0.0/16","vni":1000}"#;
        let envelope = handle_vpc_create(&translator, body).await;
        assert!(envelope.success);
        assert!(client.get_router("vpc-vpc-integ1").await.unwrap().is_some());
    }
}
