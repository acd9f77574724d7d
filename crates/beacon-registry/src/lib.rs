pub mod config;
pub mod memory;
mod health;

pub use beacon_core::MembershipRegistry;
pub use config::RegistryConfig;
pub use memory::{MemoryRegistry, SweepReport};
