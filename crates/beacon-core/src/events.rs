use serde::{Deserialize, Serialize};

use crate::node::NodeDescriptor;
use crate::role::Role;

/// Membership and leadership changes published by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    NodeRegistered { node: NodeDescriptor },
    NodeStatusUpdated { node: NodeDescriptor },
    NodeDeregistered { node: NodeDescriptor },
    LeaderPromoted { node: NodeDescriptor },
    /// Neither an active nor a backup node exists for the role.
    NoAvailableNodes { role: Role },
}

impl RegistryEvent {
    pub fn node(&self) -> Option<&NodeDescriptor> {
        match self {
            RegistryEvent::NodeRegistered { node }
            | RegistryEvent::NodeStatusUpdated { node }
            | RegistryEvent::NodeDeregistered { node }
            | RegistryEvent::LeaderPromoted { node } => Some(node),
            RegistryEvent::NoAvailableNodes { .. } => None,
        }
    }

    pub fn role(&self) -> &Role {
        match self {
            RegistryEvent::NoAvailableNodes { role } => role,
            RegistryEvent::NodeRegistered { node }
            | RegistryEvent::NodeStatusUpdated { node }
            | RegistryEvent::NodeDeregistered { node }
            | RegistryEvent::LeaderPromoted { node } => &node.role,
        }
    }
}
