use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Sweep cadence. A node silent for more than twice this is considered dead.
    pub heartbeat_interval: Duration,
    /// Record the first active node of a leaderless role as its leader.
    /// When off, only promotion of a backup sets the leader.
    pub claim_leadership_on_activation: bool,
    /// Buffered events per subscriber before lagging receivers drop some.
    pub event_capacity: usize,
}

impl RegistryConfig {
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_claim_leadership_on_activation(mut self, claim: bool) -> Self {
        self.claim_leadership_on_activation = claim;
        self
    }

    pub(crate) fn silence_threshold_millis(&self) -> u64 {
        self.heartbeat_interval.as_millis() as u64 * 2
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            claim_leadership_on_activation: false,
            event_capacity: 256,
        }
    }
}
