//! Integration tests against a live NATS server.
//!
//! These require a running NATS server reachable at `NATS_URL` (default
//! `nats://localhost:4222`). They are `#[ignore]`d by default since there is
//! no way to spin one up in CI without an external service.
//!
//! Run with: `NATS_URL=nats://localhost:4222 cargo test --test nats_integration -- --ignored`

use hive_vpcd::bus::publisher::{EventPublisher, NatsPublisher};

fn nats_url() -> String {
    std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string())
}

#[tokio::test]
#[ignore]
async fn publisher_round_trips_a_request_reply() {
    let client = async_nats::connect(nats_url()).await.expect("connect to NATS");
    let publisher = NatsPublisher::new(client.clone());

    let mut responder = client.subscribe("vpc.igw-attach").await.expect("subscribe");
    let responder_client = client.clone();
    tokio::spawn(async move {
        use futures::StreamExt;
        if let Some(message) = responder.next().await {
            if let Some(reply) = message.reply {
                let envelope = serde_json::to_vec(&serde_json::json!({"success": true})).unwrap();
                responder_client.publish(reply, envelope.into()).await.unwrap();
            }
        }
    });

    let reply = publisher
        .request("vpc.igw-attach", br#"{"internet_gateway_id":"igw-x","vpc_id":"vpc-x"}"#.to_vec())
        .await
        .expect("request should succeed");
    assert!(reply.success);
}

#[tokio::test]
#[ignore]
async fn publisher_times_out_when_nothing_replies() {
    let client = async_nats::connect(nats_url()).await.expect("connect to NATS");
    let publisher = NatsPublisher::new(client);

    let result = publisher.request("vpc.create", br#"{}"#.to_vec()).await;
    assert!(result.is_err());
}
