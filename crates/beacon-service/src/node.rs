use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use beacon_core::{MembershipRegistry, NodeDescriptor, NodeId, NodeStatus, Role};

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::hooks::ServiceHooks;
use crate::sampler::{LoadSampler, SystemLoadSampler};

type Descriptor = Arc<Mutex<NodeDescriptor>>;

/// Drives one worker through its lifecycle and keeps it alive in the registry.
pub struct ServiceNode<H: ServiceHooks> {
    hooks: Arc<H>,
    registry: Arc<dyn MembershipRegistry>,
    config: ServiceConfig,
    descriptor: Descriptor,
    sampler: Mutex<Option<Box<dyn LoadSampler>>>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
    start_claimed: AtomicBool,
}

impl<H: ServiceHooks> ServiceNode<H> {
    pub fn new(descriptor: NodeDescriptor, hooks: H, registry: Arc<dyn MembershipRegistry>) -> Self {
        Self {
            hooks: Arc::new(hooks),
            registry,
            config: ServiceConfig::default(),
            descriptor: Arc::new(Mutex::new(descriptor.with_status(NodeStatus::Starting))),
            sampler: Mutex::new(Some(Box::new(SystemLoadSampler::new()))),
            heartbeat: Mutex::new(None),
            start_claimed: AtomicBool::new(false),
        }
    }

    /// Node with a freshly generated id.
    pub fn for_role(role: impl Into<Role>, hooks: H, registry: Arc<dyn MembershipRegistry>) -> Self {
        let role = role.into();
        let id = NodeId::generate(&role);
        Self::new(NodeDescriptor::new(id, role, 0), hooks, registry)
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sampler(self, sampler: impl LoadSampler) -> Self {
        *lock(&self.sampler) = Some(Box::new(sampler));
        self
    }

    pub fn id(&self) -> NodeId {
        lock(&self.descriptor).id.clone()
    }

    pub fn role(&self) -> Role {
        lock(&self.descriptor).role.clone()
    }

    pub fn status(&self) -> NodeStatus {
        lock(&self.descriptor).status
    }

    pub fn descriptor(&self) -> NodeDescriptor {
        lock(&self.descriptor).clone()
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Initializes, registers and starts heartbeating.
    ///
    /// If `initialize` fails the node is left `FAILING` and never registered.
    pub async fn start(&self) -> Result<(), ServiceError> {
        if self.config.heartbeat_interval.is_zero() {
            return Err(ServiceError::Config("heartbeat interval must be non-zero"));
        }
        // Only one caller gets past here, even while `initialize` is pending.
        let status = self.status();
        if status != NodeStatus::Starting || self.start_claimed.swap(true, Ordering::AcqRel) {
            return Err(ServiceError::InvalidState { action: "start", status });
        }

        if let Err(e) = self.hooks.initialize().await {
            lock(&self.descriptor).set_status(NodeStatus::Failing);
            tracing::error!(node = %self.id(), error = %e, "service initialization failed");
            return Err(ServiceError::Initialization(e));
        }

        let descriptor = self.descriptor();
        if let Err(e) = descriptor.validate().and_then(|()| self.registry.register_node(descriptor)) {
            lock(&self.descriptor).set_status(NodeStatus::Failing);
            return Err(e.into());
        }

        self.spawn_heartbeat();
        lock(&self.descriptor).set_status(NodeStatus::Active);

        tracing::info!(node = %self.id(), role = %self.role(), "service started");
        Ok(())
    }

    /// Marks the node inactive, runs `cleanup` and leaves the registry.
    ///
    /// The node is deregistered even when `cleanup` fails or panics.
    pub async fn stop(&self) -> Result<(), ServiceError> {
        let id = {
            let mut d = lock(&self.descriptor);
            d.set_status(NodeStatus::Inactive);
            d.id.clone()
        };
        self.halt_heartbeat().await;

        let _leave = Deregister { registry: &*self.registry, id: &id };
        let result = self.hooks.cleanup().await.map_err(ServiceError::Cleanup);
        if let Err(e) = &result {
            tracing::error!(node = %id, error = %e, "service cleanup failed");
        }
        tracing::info!(node = %id, "service stopped");
        result
    }

    pub fn is_leader(&self) -> bool {
        let (id, role) = {
            let d = lock(&self.descriptor);
            (d.id.clone(), d.role.clone())
        };
        self.registry
            .get_role_leader(&role)
            .is_some_and(|leader| leader.id == id)
    }

    /// Takes effect in the registry on the next heartbeat.
    pub fn become_backup(&self) -> Result<(), ServiceError> {
        self.transition(NodeStatus::Backup)
    }

    /// Takes effect in the registry on the next heartbeat.
    pub fn become_active(&self) -> Result<(), ServiceError> {
        self.transition(NodeStatus::Active)
    }

    fn transition(&self, to: NodeStatus) -> Result<(), ServiceError> {
        let mut d = lock(&self.descriptor);
        if !matches!(d.status, NodeStatus::Active | NodeStatus::Backup) {
            return Err(ServiceError::InvalidTransition { from: d.status, to });
        }
        if d.status != to {
            tracing::info!(node = %d.id, from = %d.status, to = %to, "service status changed");
            d.set_status(to);
        }
        Ok(())
    }

    fn spawn_heartbeat(&self) {
        let sampler = lock(&self.sampler)
            .take()
            .unwrap_or_else(|| Box::new(SystemLoadSampler::new()));
        let heartbeat = Heartbeat {
            descriptor: self.descriptor.clone(),
            registry: self.registry.clone(),
            hooks: self.hooks.clone(),
            sampler,
            was_leader: false,
        };
        let handle = tokio::spawn(heartbeat.run(self.config.heartbeat_interval));
        if let Some(previous) = lock(&self.heartbeat).replace(handle) {
            previous.abort();
        }
    }

    /// Aborts the heartbeat and waits until a beat in flight has finished.
    async fn halt_heartbeat(&self) {
        let handle = lock(&self.heartbeat).take();
        if let Some(handle) = handle {
            handle.abort();
            // Cancellation is the expected outcome.
            let _ = handle.await;
        }
    }

    fn abort_heartbeat(&self) {
        if let Some(handle) = lock(&self.heartbeat).take() {
            handle.abort();
        }
    }
}

impl<H: ServiceHooks> Drop for ServiceNode<H> {
    fn drop(&mut self) {
        self.abort_heartbeat();
    }
}

struct Deregister<'a> {
    registry: &'a dyn MembershipRegistry,
    id: &'a NodeId,
}

impl Drop for Deregister<'_> {
    fn drop(&mut self) {
        self.registry.deregister_node(self.id);
    }
}

struct Heartbeat<H: ServiceHooks> {
    descriptor: Descriptor,
    registry: Arc<dyn MembershipRegistry>,
    hooks: Arc<H>,
    sampler: Box<dyn LoadSampler>,
    was_leader: bool,
}

impl<H: ServiceHooks> Heartbeat<H> {
    async fn run(mut self, period: Duration) {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let scheduled = interval.tick().await;
            let lag = Instant::now().saturating_duration_since(scheduled);
            self.beat(lag).await;
        }
    }

    async fn beat(&mut self, lag: Duration) {
        let metrics = self.sampler.sample(lag);
        let descriptor = {
            let mut d = lock(&self.descriptor);
            if d.status == NodeStatus::Inactive {
                return;
            }
            d.metrics = metrics;
            d.clone()
        };
        let id = descriptor.id.clone();
        let role = descriptor.role.clone();

        if self.registry.get_node(&id).is_none() {
            // Reaped while we were unreachable; come back as a fresh member.
            tracing::warn!(node = %id, "node unknown to registry, registering again");
            if let Err(e) = self.registry.register_node(descriptor) {
                tracing::warn!(node = %id, error = %e, "re-registration failed");
            }
        } else {
            self.registry.update_node_metrics(&id, metrics);
            if let Err(e) = self.registry.update_node_status(&id, descriptor.status) {
                tracing::warn!(node = %id, error = %e, "heartbeat rejected");
            }
        }

        let is_leader = self
            .registry
            .get_role_leader(&role)
            .is_some_and(|leader| leader.id == id);
        if is_leader {
            let mut d = lock(&self.descriptor);
            // Keep the next heartbeat from undoing the promotion.
            if d.status == NodeStatus::Backup {
                d.set_status(NodeStatus::Active);
            }
        }
        if is_leader && !self.was_leader {
            tracing::info!(node = %id, role = %role, "service is now role leader");
            self.hooks.on_promoted().await;
        } else if !is_leader && self.was_leader {
            tracing::info!(node = %id, role = %role, "service lost role leadership");
            self.hooks.on_demoted().await;
        }
        self.was_leader = is_leader;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
