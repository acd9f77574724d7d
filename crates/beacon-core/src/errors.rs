use crate::status::NodeStatus;

/// Domain errors for the registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Malformed node descriptor: {0}")]
    MalformedDescriptor(&'static str),

    #[error("Invalid status transition {from} -> {to}")]
    InvalidTransition { from: NodeStatus, to: NodeStatus },
}
