//! Outbound request/reply publishing used by the IGW handler to drive this
//! daemon's `vpc.igw-attach`/`vpc.igw-detach` handlers.
//!
//! A named port: the IGW handler depends only on [`EventPublisher`], not on
//! `async-nats` directly, so tests can swap in [`MockPublisher`].

use crate::bus::messages::ReplyEnvelope;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Every bus request/response cycle carries this timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug, Clone)]
pub enum PublishError {
    #[error("bus request to {0} timed out")]
    Timeout(String),

    #[error("bus request to {0} failed: {1}")]
    Failed(String, String),
}

/// Publish a request and wait for its [`ReplyEnvelope`].
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn request(&self, subject: &str, payload: Vec<u8>) -> Result<ReplyEnvelope, PublishError>;
}

/// [`EventPublisher`] backed by a live `async-nats` client.
pub struct NatsPublisher {
    client: async_nats::Client,
}

impl NatsPublisher {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn request(&self, subject: &str, payload: Vec<u8>) -> Result<ReplyEnvelope, PublishError> {
        let response = tokio::time::timeout(REQUEST_TIMEOUT, self.client.request(subject.to_string(), payload.into()))
            .await
            .map_err(|_| PublishError::Timeout(subject.to_string()))?
            .map_err(|e| PublishError::Failed(subject.to_string(), e.to_string()))?;

        serde_json::from_slice(&response.payload)
            .map_err(|e| PublishError::Failed(subject.to_string(), format!("decoding reply: {e}")))
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Records every request it receives and returns a fixed reply.
    pub struct MockPublisher {
        pub reply: ReplyEnvelope,
        pub requests: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl MockPublisher {
        pub fn succeeding() -> Self {
            Self {
                reply: ReplyEnvelope::ok(),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(error: impl std::fmt::Display) -> Self {
            Self {
                reply: ReplyEnvelope::failure(error),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EventPublisher for MockPublisher {
        async fn request(&self, subject: &str, payload: Vec<u8>) -> Result<ReplyEnvelope, PublishError> {
            self.requests.lock().unwrap().push((subject.to_string(), payload));
            Ok(ReplyEnvelope {
                success: self.reply.success,
                error: self.reply.error.clone(),
            })
        }
    }
}
