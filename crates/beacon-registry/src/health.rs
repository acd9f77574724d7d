use std::sync::{Arc, PoisonError};

use tokio::time::{Instant, interval_at};

use crate::memory::MemoryRegistry;

impl MemoryRegistry {
    /// Spawns the periodic liveness sweep. Must be called inside a tokio runtime.
    ///
    /// Calling it again while the sweep is running does nothing.
    pub fn start_health_check(&self) {
        let mut slot = self
            .inner
            .health_check
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let period = self.inner.config.heartbeat_interval;
        if period.is_zero() {
            tracing::error!("Health check interval must be non-zero, sweep not started");
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        *slot = Some(tokio::spawn(async move {
            tracing::info!(interval = ?period, "Health check started");
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                // The task never keeps a dropped registry alive.
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                MemoryRegistry { inner }.sweep();
            }
        }));
    }

    pub fn stop_health_check(&self) {
        let handle = self
            .inner
            .health_check
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::info!("Health check stopped");
        }
    }

    pub fn is_health_check_running(&self) -> bool {
        self.inner
            .health_check
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}
