pub mod config;
pub mod error;
pub mod hooks;
pub mod node;
pub mod sampler;

pub use config::ServiceConfig;
pub use error::{BoxError, ServiceError};
pub use hooks::ServiceHooks;
pub use node::ServiceNode;
pub use sampler::{FixedLoad, LoadSampler, SystemLoadSampler};
