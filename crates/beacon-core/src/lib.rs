pub mod node;
pub mod role;
pub mod status;
pub mod metrics;
pub mod events;
pub mod registry;
pub mod errors;
pub mod time;

pub use node::{NodeDescriptor, NodeId};
pub use role::Role;
pub use status::NodeStatus;
pub use metrics::NodeMetrics;
pub use events::RegistryEvent;
pub use registry::MembershipRegistry;
pub use errors::RegistryError;
pub use time::{Clock, ManualClock, SystemClock};
