use serde::{Deserialize, Serialize};

/// Self-reported load of a node. Only used to rank backups during election.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeMetrics {
    /// CPU usage in percent.
    pub cpu: f64,
    /// Memory usage in percent.
    pub memory: f64,
    /// Latency in milliseconds.
    pub latency: f64,
}

impl NodeMetrics {
    pub fn new(cpu: f64, memory: f64, latency: f64) -> Self {
        Self { cpu, memory, latency }
    }

    /// Election score; higher is better.
    ///
    /// `0.4 * (1 - cpu/100) + 0.3 * (1 - memory/100) + 0.3 * (1000 - latency)/1000`
    pub fn score(&self) -> f64 {
        0.4 * (1.0 - self.cpu / 100.0)
            + 0.3 * (1.0 - self.memory / 100.0)
            + 0.3 * (1000.0 - self.latency) / 1000.0
    }
}
