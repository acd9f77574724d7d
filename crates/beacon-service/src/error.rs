use beacon_core::{NodeStatus, RegistryError};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Initialization failed: {0}")]
    Initialization(#[source] BoxError),

    #[error("Cleanup failed: {0}")]
    Cleanup(#[source] BoxError),

    #[error("Cannot {action} a node that is {status}")]
    InvalidState { action: &'static str, status: NodeStatus },

    #[error("Invalid status transition {from} -> {to}")]
    InvalidTransition { from: NodeStatus, to: NodeStatus },

    #[error("Invalid configuration: {0}")]
    Config(&'static str),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
