use std::time::Duration;

use beacon_core::NodeMetrics;
use sysinfo::System;

/// Source of the load figures a node reports with each heartbeat.
pub trait LoadSampler: Send + 'static {
    /// `tick_lag` is how late the heartbeat tick fired.
    fn sample(&mut self, tick_lag: Duration) -> NodeMetrics;
}

/// Host-wide CPU and memory usage. Latency is the heartbeat's scheduling lag.
pub struct SystemLoadSampler {
    system: System,
}

impl SystemLoadSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        // CPU usage is a delta between two refreshes; prime the first one.
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self { system }
    }
}

impl Default for SystemLoadSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadSampler for SystemLoadSampler {
    fn sample(&mut self, tick_lag: Duration) -> NodeMetrics {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        let cpu = f64::from(self.system.global_cpu_usage());
        let total = self.system.total_memory();
        let memory = if total == 0 {
            0.0
        } else {
            self.system.used_memory() as f64 / total as f64 * 100.0
        };
        NodeMetrics::new(cpu, memory, tick_lag.as_secs_f64() * 1000.0)
    }
}

/// Always reports the same load.
#[derive(Debug, Clone, Copy)]
pub struct FixedLoad(pub NodeMetrics);

impl LoadSampler for FixedLoad {
    fn sample(&mut self, _tick_lag: Duration) -> NodeMetrics {
        self.0
    }
}
