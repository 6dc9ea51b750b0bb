//! In-memory internet gateway registry.
//!
//! A restart loses every record — durability is left as an open question
//! for the broader system (see `DESIGN.md`). The registry exposes its
//! guard directly rather than individual lock-then-release methods,
//! because the handler must hold the lock across the `vpc.igw-attach`/
//! `vpc.igw-detach` publish to prevent an interleaved attach/detach on the
//! same record.

use crate::domain::value_objects::{IgwId, VpcId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use strum_macros::Display;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// The two states an internet gateway can be in. No intermediate
/// "attaching"/"detaching" state exists.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum IgwState {
    #[strum(serialize = "detached")]
    Detached,
    #[strum(serialize = "attached")]
    Attached(VpcId),
}

impl IgwState {
    pub fn vpc_id(&self) -> Option<&VpcId> {
        match self {
            Self::Detached => None,
            Self::Attached(vpc_id) => Some(vpc_id),
        }
    }
}

/// A single internet gateway record.
#[derive(Debug, Clone)]
pub struct IgwRecord {
    pub id: IgwId,
    pub state: IgwState,
    pub tags: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl IgwRecord {
    /// AWS reports `attachment.state` as `"attached"` for any record with a
    /// VPC and models no intermediate states.
    pub fn attachment_state(&self) -> Option<String> {
        match &self.state {
            IgwState::Detached => None,
            attached @ IgwState::Attached(_) => Some(attached.to_string()),
        }
    }
}

/// Process-wide registry of internet gateways, protected by a single mutex.
#[derive(Default)]
pub struct IgwRegistry {
    records: Mutex<HashMap<String, IgwRecord>>,
}

impl IgwRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the registry for the duration of one state-machine decision.
    pub async fn lock(&self) -> MutexGuard<'_, HashMap<String, IgwRecord>> {
        self.records.lock().await
    }

    /// Allocate a new internet gateway identifier: `igw-` followed by 18 hex
    /// characters.
    pub fn new_id() -> IgwId {
        let hex = Uuid::new_v4().simple().to_string();
        IgwId::from(format!("igw-{}", &hex[..18]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_has_the_expected_shape() {
        let id = IgwRegistry::new_id();
        assert!(id.as_str().starts_with("igw-"));
        assert_eq!(id.as_str().len(), 4 + 18);
    }

    #[test]
    fn attachment_state_reflects_record_state() {
        let detached = IgwRecord {
            id: IgwId::from("igw-000000000000000000"),
            state: IgwState::Detached,
            tags: HashMap::new(),
            created_at: Utc::now(),
        };
        assert_eq!(detached.attachment_state(), None);

        let attached = IgwRecord {
            state: IgwState::Attached(VpcId::from("vpc-integ1")),
            ..detached
        };
        assert_eq!(attached.attachment_state(), Some("attached".to_string()));
    }
}
