use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::errors::RegistryError;
use crate::metrics::NodeMetrics;
use crate::role::Role;
use crate::status::NodeStatus;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh id of the form `<role>-<uuid>`.
    pub fn generate(role: &Role) -> Self {
        Self(format!("{}-{}", role, Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub id: NodeId,
    pub role: Role,
    pub status: NodeStatus,
    /// Opaque reachability hint, never interpreted by the registry.
    pub address: String,
    pub public_key: String,
    /// Milliseconds since the Unix epoch.
    pub last_heartbeat: u64,
    pub capabilities: BTreeSet<String>,
    pub metrics: NodeMetrics,
}

impl NodeDescriptor {
    pub fn new(id: impl Into<NodeId>, role: impl Into<Role>, last_heartbeat: u64) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            status: NodeStatus::Starting,
            address: String::new(),
            public_key: String::new(),
            last_heartbeat,
            capabilities: BTreeSet::new(),
            metrics: NodeMetrics::default(),
        }
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = public_key.into();
        self
    }

    pub fn with_metrics(mut self, metrics: NodeMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn set_status(&mut self, status: NodeStatus) {
        self.status = status;
    }

    /// Never moves the heartbeat backwards.
    pub fn update_heartbeat(&mut self, timestamp: u64) {
        self.last_heartbeat = self.last_heartbeat.max(timestamp);
    }

    pub fn add_capability(&mut self, capability: impl Into<String>) {
        self.capabilities.insert(capability.into());
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.id.is_empty() {
            return Err(RegistryError::MalformedDescriptor("missing id"));
        }
        if self.role.is_empty() {
            return Err(RegistryError::MalformedDescriptor("missing role"));
        }
        Ok(())
    }
}
