use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// How often the node reports itself to the registry. Kept well under the
    /// registry's silence threshold.
    pub heartbeat_interval: Duration,
}

impl ServiceConfig {
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(15),
        }
    }
}
