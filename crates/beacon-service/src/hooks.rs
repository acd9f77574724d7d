use async_trait::async_trait;

use crate::error::BoxError;

/// Role-specific behaviour plugged into a [`ServiceNode`](crate::ServiceNode).
#[async_trait]
pub trait ServiceHooks: Send + Sync + 'static {
    /// Runs to completion before the node registers. An error aborts the start.
    async fn initialize(&self) -> Result<(), BoxError>;

    /// Runs on stop, before the node leaves the registry.
    async fn cleanup(&self) -> Result<(), BoxError>;

    /// The registry made this node its role's leader.
    async fn on_promoted(&self) {}

    /// This node is no longer its role's leader.
    async fn on_demoted(&self) {}
}
