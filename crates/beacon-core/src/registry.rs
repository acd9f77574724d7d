use crate::{NodeMetrics, NodeDescriptor, NodeId, NodeStatus, RegistryError, Role};

/// Membership table seen by a service lifecycle.
///
/// Status and deregistration calls for unknown ids are no-ops and return `Ok`.
pub trait MembershipRegistry: Send + Sync {
    fn register_node(&self, node: NodeDescriptor) -> Result<(), RegistryError>;
    fn update_node_status(&self, id: &NodeId, status: NodeStatus) -> Result<(), RegistryError>;
    fn update_node_metrics(&self, id: &NodeId, metrics: NodeMetrics);
    fn deregister_node(&self, id: &NodeId);
    fn get_node(&self, id: &NodeId) -> Option<NodeDescriptor>;
    fn get_active_nodes_for_role(&self, role: &Role) -> Vec<NodeDescriptor>;
    fn get_role_leader(&self, role: &Role) -> Option<NodeDescriptor>;
}
