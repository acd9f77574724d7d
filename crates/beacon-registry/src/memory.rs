use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use beacon_core::{
    Clock, MembershipRegistry, NodeDescriptor, NodeId, NodeMetrics, NodeStatus, RegistryError,
    RegistryEvent, Role, SystemClock,
};

use crate::config::RegistryConfig;

/// In-memory membership table with per-role leadership.
///
/// Cloning is cheap and every clone shares the same table, so one registry is
/// created per process and handed to each service node.
#[derive(Clone)]
pub struct MemoryRegistry {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    state: Mutex<State>,
    events: broadcast::Sender<RegistryEvent>,
    clock: Arc<dyn Clock>,
    pub(crate) config: RegistryConfig,
    pub(crate) health_check: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Default)]
struct State {
    // Ordered so that score ties always resolve the same way.
    nodes: BTreeMap<NodeId, NodeDescriptor>,
    leaders: HashMap<Role, NodeId>,
}

/// Outcome of one liveness sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub demoted: Vec<NodeId>,
    pub reaped: Vec<NodeId>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.demoted.is_empty() && self.reaped.is_empty()
    }
}

impl MemoryRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RegistryConfig, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                events,
                clock,
                config,
                health_check: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.inner.events.subscribe()
    }

    pub fn get_nodes_for_role(&self, role: &Role) -> Vec<NodeDescriptor> {
        self.inner
            .lock()
            .nodes
            .values()
            .filter(|n| &n.role == role)
            .cloned()
            .collect()
    }

    pub fn get_all_nodes(&self) -> Vec<NodeDescriptor> {
        self.inner.lock().nodes.values().cloned().collect()
    }

    /// Runs the leadership re-check for `role` outside of any mutation.
    pub fn check_role_leadership(&self, role: &Role) {
        let mut state = self.inner.lock();
        self.inner.check_role_leadership(&mut state, role);
    }

    /// One liveness pass over the table.
    ///
    /// An `ACTIVE` node silent for more than twice the heartbeat interval is
    /// marked `FAILING`. A `FAILING` node that stays silent for another such
    /// window is removed. Other statuses are left alone.
    pub fn sweep(&self) -> SweepReport {
        let inner = &self.inner;
        let now = inner.clock.now_millis();
        let threshold = inner.config.silence_threshold_millis();
        let mut report = SweepReport::default();

        let mut state = inner.lock();
        let silent: Vec<(NodeId, NodeStatus)> = state
            .nodes
            .values()
            .filter(|n| now.saturating_sub(n.last_heartbeat) > threshold)
            .map(|n| (n.id.clone(), n.status))
            .collect();

        for (id, status) in silent {
            // Skip nodes already touched by this pass, e.g. a backup promoted
            // after its leader was marked failing.
            if state.nodes.get(&id).map(|n| n.status) != Some(status) {
                continue;
            }
            match status {
                NodeStatus::Active => {
                    tracing::warn!(node = %id, "node missed heartbeats, marking failing");
                    if inner
                        .update_status(&mut state, &id, NodeStatus::Failing, now)
                        .is_ok()
                    {
                        report.demoted.push(id);
                    }
                }
                NodeStatus::Failing => {
                    tracing::warn!(node = %id, "failing node still silent, removing");
                    if inner.deregister(&mut state, &id).is_some() {
                        metrics::counter!("beacon_nodes_reaped_total").increment(1);
                        report.reaped.push(id);
                    }
                }
                _ => {}
            }
        }

        if !report.is_empty() {
            tracing::info!(
                demoted = report.demoted.len(),
                reaped = report.reaped.len(),
                "liveness sweep finished"
            );
        }
        report
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl MembershipRegistry for MemoryRegistry {
    fn register_node(&self, node: NodeDescriptor) -> Result<(), RegistryError> {
        let now = self.inner.clock.now_millis();
        let mut state = self.inner.lock();
        self.inner.register(&mut state, node, now)
    }

    fn update_node_status(&self, id: &NodeId, status: NodeStatus) -> Result<(), RegistryError> {
        let now = self.inner.clock.now_millis();
        let mut state = self.inner.lock();
        self.inner.update_status(&mut state, id, status, now)
    }

    fn update_node_metrics(&self, id: &NodeId, metrics: NodeMetrics) {
        if let Some(node) = self.inner.lock().nodes.get_mut(id) {
            node.metrics = metrics;
        }
    }

    fn deregister_node(&self, id: &NodeId) {
        let mut state = self.inner.lock();
        self.inner.deregister(&mut state, id);
    }

    fn get_node(&self, id: &NodeId) -> Option<NodeDescriptor> {
        self.inner.lock().nodes.get(id).cloned()
    }

    fn get_active_nodes_for_role(&self, role: &Role) -> Vec<NodeDescriptor> {
        self.inner
            .lock()
            .nodes
            .values()
            .filter(|n| &n.role == role && n.status == NodeStatus::Active)
            .cloned()
            .collect()
    }

    fn get_role_leader(&self, role: &Role) -> Option<NodeDescriptor> {
        let state = self.inner.lock();
        state
            .leaders
            .get(role)
            .and_then(|id| state.nodes.get(id))
            .cloned()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: RegistryEvent) {
        // Err only means nobody is subscribed.
        let _ = self.events.send(event);
    }

    fn register(
        &self,
        state: &mut State,
        mut node: NodeDescriptor,
        now: u64,
    ) -> Result<(), RegistryError> {
        if let Err(e) = node.validate() {
            tracing::warn!(error = %e, "rejecting node registration");
            return Err(e);
        }
        // The registry clock is the only source of liveness.
        node.last_heartbeat = now;

        let role = node.role.clone();
        let previous = state.nodes.insert(node.id.clone(), node.clone());
        let moved_from = previous
            .filter(|prev| prev.role != role)
            .map(|prev| {
                if state.leaders.get(&prev.role) == Some(&prev.id) {
                    state.leaders.remove(&prev.role);
                }
                prev.role
            });

        tracing::info!(node = %node.id, role = %role, status = %node.status, "node registered");
        metrics::counter!("beacon_nodes_registered_total").increment(1);
        metrics::gauge!("beacon_registry_nodes").set(state.nodes.len() as f64);
        self.emit(RegistryEvent::NodeRegistered { node });

        self.check_role_leadership(state, &role);
        if let Some(old_role) = moved_from {
            self.check_role_leadership(state, &old_role);
        }
        Ok(())
    }

    fn update_status(
        &self,
        state: &mut State,
        id: &NodeId,
        status: NodeStatus,
        now: u64,
    ) -> Result<(), RegistryError> {
        let Some(node) = state.nodes.get_mut(id) else {
            tracing::debug!(node = %id, "status update for unknown node ignored");
            return Ok(());
        };
        if !node.status.can_transition_to(status) {
            return Err(RegistryError::InvalidTransition { from: node.status, to: status });
        }
        if node.status != status {
            tracing::debug!(node = %id, from = %node.status, to = %status, "node status changed");
        }
        node.set_status(status);
        node.update_heartbeat(now);

        let node = node.clone();
        let role = node.role.clone();
        self.emit(RegistryEvent::NodeStatusUpdated { node });
        self.check_role_leadership(state, &role);
        Ok(())
    }

    fn deregister(&self, state: &mut State, id: &NodeId) -> Option<NodeDescriptor> {
        let node = state.nodes.remove(id)?;
        if state.leaders.get(&node.role) == Some(&node.id) {
            state.leaders.remove(&node.role);
        }

        tracing::info!(node = %node.id, role = %node.role, "node deregistered");
        metrics::counter!("beacon_nodes_deregistered_total").increment(1);
        metrics::gauge!("beacon_registry_nodes").set(state.nodes.len() as f64);

        let role = node.role.clone();
        self.emit(RegistryEvent::NodeDeregistered { node: node.clone() });
        self.check_role_leadership(state, &role);
        Some(node)
    }

    fn check_role_leadership(&self, state: &mut State, role: &Role) {
        let stale = state
            .leaders
            .get(role)
            .is_some_and(|id| state.nodes.get(id).is_none_or(|n| n.status != NodeStatus::Active));
        if stale {
            state.leaders.remove(role);
        }

        let first_active = state
            .nodes
            .values()
            .find(|n| &n.role == role && n.status == NodeStatus::Active)
            .map(|n| n.id.clone());
        if let Some(id) = first_active {
            if self.config.claim_leadership_on_activation && !state.leaders.contains_key(role) {
                self.promote_to_leader(state, &id);
            }
            return;
        }

        let best = state
            .nodes
            .values()
            .filter(|n| &n.role == role && n.status == NodeStatus::Backup)
            .fold(None::<&NodeDescriptor>, |best, candidate| match best {
                Some(b) if b.metrics.score().total_cmp(&candidate.metrics.score()).is_ge() => Some(b),
                _ => Some(candidate),
            })
            .map(|n| n.id.clone());

        match best {
            Some(id) => self.promote_to_leader(state, &id),
            None => {
                tracing::warn!(role = %role, "no available nodes for role");
                metrics::counter!("beacon_leaderless_roles_total").increment(1);
                self.emit(RegistryEvent::NoAvailableNodes { role: role.clone() });
            }
        }
    }

    fn promote_to_leader(&self, state: &mut State, id: &NodeId) {
        let Some(node) = state.nodes.get_mut(id) else {
            return;
        };
        node.set_status(NodeStatus::Active);
        let node = node.clone();
        state.leaders.insert(node.role.clone(), node.id.clone());

        tracing::info!(
            node = %node.id,
            role = %node.role,
            score = node.metrics.score(),
            "node promoted to leader"
        );
        metrics::counter!("beacon_leader_promotions_total").increment(1);
        self.emit(RegistryEvent::LeaderPromoted { node });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .health_check
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::ManualClock;
    use std::time::Duration;

    fn registry() -> (MemoryRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let registry = MemoryRegistry::with_clock(RegistryConfig::default(), clock.clone());
        (registry, clock)
    }

    fn node(id: &str, role: &str, status: NodeStatus, cpu: f64, memory: f64, latency: f64) -> NodeDescriptor {
        NodeDescriptor::new(id, role, 0)
            .with_status(status)
            .with_metrics(NodeMetrics::new(cpu, memory, latency))
    }

    fn drain(rx: &mut broadcast::Receiver<RegistryEvent>) -> Vec<RegistryEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn lone_backup_is_promoted_on_registration() {
        let (registry, _) = registry();
        let chain = Role::new("chain");

        registry
            .register_node(node("a", "chain", NodeStatus::Backup, 20.0, 30.0, 100.0))
            .unwrap();

        let leader = registry.get_role_leader(&chain).unwrap();
        assert_eq!(leader.id, NodeId::new("a"));
        assert_eq!(leader.status, NodeStatus::Active);
    }

    #[test]
    fn best_scoring_backup_wins() {
        let (registry, _) = registry();
        let role = Role::new("r");

        // An active node holds off promotion while both backups register.
        registry.register_node(node("holder", "r", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();
        registry.register_node(node("b2", "r", NodeStatus::Backup, 80.0, 80.0, 900.0)).unwrap();
        registry.register_node(node("b1", "r", NodeStatus::Backup, 10.0, 10.0, 50.0)).unwrap();
        assert!(registry.get_role_leader(&role).is_none());

        registry.deregister_node(&NodeId::new("holder"));

        let leader = registry.get_role_leader(&role).unwrap();
        assert_eq!(leader.id, NodeId::new("b1"));
        assert_eq!(
            registry.get_node(&NodeId::new("b2")).unwrap().status,
            NodeStatus::Backup
        );
    }

    #[test]
    fn ties_go_to_the_first_candidate() {
        let (registry, _) = registry();
        let role = Role::new("r");
        registry.register_node(node("holder", "r", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();
        registry.register_node(node("y", "r", NodeStatus::Backup, 5.0, 5.0, 5.0)).unwrap();
        registry.register_node(node("x", "r", NodeStatus::Backup, 5.0, 5.0, 5.0)).unwrap();

        registry.deregister_node(&NodeId::new("holder"));

        assert_eq!(registry.get_role_leader(&role).unwrap().id, NodeId::new("x"));
    }

    #[test]
    fn direct_active_registration_does_not_claim_leadership() {
        let (registry, _) = registry();
        let role = Role::new("auth");
        registry.register_node(node("a", "auth", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();

        assert_eq!(registry.get_active_nodes_for_role(&role).len(), 1);
        assert!(registry.get_role_leader(&role).is_none());
    }

    #[test]
    fn direct_active_registration_claims_leadership_when_enabled() {
        let clock = Arc::new(ManualClock::new(0));
        let config = RegistryConfig::default().with_claim_leadership_on_activation(true);
        let registry = MemoryRegistry::with_clock(config, clock);
        let role = Role::new("auth");

        registry.register_node(node("b", "auth", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();
        registry.register_node(node("a", "auth", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();

        // The first claimant keeps the role.
        assert_eq!(registry.get_role_leader(&role).unwrap().id, NodeId::new("b"));
    }

    #[test]
    fn silent_active_node_fails_over_to_backup() {
        let (registry, clock) = registry();
        let role = Role::new("chain");
        registry.register_node(node("a", "chain", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();
        registry.register_node(node("b", "chain", NodeStatus::Backup, 10.0, 10.0, 10.0)).unwrap();
        assert!(registry.get_role_leader(&role).is_none());

        clock.advance(Duration::from_secs(61));
        let report = registry.sweep();

        assert_eq!(report.demoted, vec![NodeId::new("a")]);
        assert_eq!(registry.get_node(&NodeId::new("a")).unwrap().status, NodeStatus::Failing);
        let leader = registry.get_role_leader(&role).unwrap();
        assert_eq!(leader.id, NodeId::new("b"));
        assert_eq!(leader.status, NodeStatus::Active);
    }

    #[test]
    fn exactly_two_intervals_of_silence_is_tolerated() {
        let (registry, clock) = registry();
        registry.register_node(node("a", "chain", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();

        clock.advance(Duration::from_secs(60));
        assert!(registry.sweep().is_empty());
    }

    #[test]
    fn failing_node_is_reaped_after_another_window() {
        let (registry, clock) = registry();
        let role = Role::new("chain");
        registry.register_node(node("b", "chain", NodeStatus::Backup, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(registry.get_role_leader(&role).unwrap().id, NodeId::new("b"));

        clock.advance(Duration::from_secs(61));
        assert_eq!(registry.sweep().demoted, vec![NodeId::new("b")]);
        assert!(registry.get_role_leader(&role).is_none());

        clock.advance(Duration::from_secs(30));
        assert!(registry.sweep().is_empty());

        clock.advance(Duration::from_secs(31));
        assert_eq!(registry.sweep().reaped, vec![NodeId::new("b")]);
        assert!(registry.get_node(&NodeId::new("b")).is_none());
        assert!(registry.get_role_leader(&role).is_none());
    }

    #[test]
    fn silent_backups_and_starting_nodes_are_kept() {
        let (registry, clock) = registry();
        let live = NodeId::new("a");
        registry.register_node(node("s", "r", NodeStatus::Starting, 0.0, 0.0, 0.0)).unwrap();
        registry.register_node(node("i", "x", NodeStatus::Inactive, 0.0, 0.0, 0.0)).unwrap();
        registry.register_node(node("a", "q", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();
        registry.register_node(node("b", "q", NodeStatus::Backup, 0.0, 0.0, 0.0)).unwrap();

        for _ in 0..2 {
            clock.advance(Duration::from_secs(600));
            registry.update_node_status(&live, NodeStatus::Active).unwrap();
            assert!(registry.sweep().is_empty());
        }

        assert_eq!(registry.get_all_nodes().len(), 4);
        assert_eq!(registry.get_node(&NodeId::new("b")).unwrap().status, NodeStatus::Backup);
    }

    #[test]
    fn heartbeat_revives_failing_node() {
        let (registry, clock) = registry();
        let id = NodeId::new("a");
        registry.register_node(node("a", "chain", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();

        clock.advance(Duration::from_secs(61));
        registry.sweep();
        registry.update_node_status(&id, NodeStatus::Active).unwrap();

        clock.advance(Duration::from_secs(31));
        assert!(registry.sweep().is_empty());
        assert_eq!(registry.get_node(&id).unwrap().status, NodeStatus::Active);
    }

    #[test]
    fn status_update_refreshes_heartbeat() {
        let (registry, clock) = registry();
        let id = NodeId::new("a");
        registry.register_node(node("a", "chain", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();
        let registered_at = registry.get_node(&id).unwrap().last_heartbeat;

        clock.advance(Duration::from_secs(15));
        registry.update_node_status(&id, NodeStatus::Active).unwrap();

        assert_eq!(registry.get_node(&id).unwrap().last_heartbeat, registered_at + 15_000);
    }

    #[test]
    fn registration_ignores_caller_supplied_heartbeat() {
        let (registry, clock) = registry();
        let id = NodeId::new("a");
        let mut descriptor = node("a", "chain", NodeStatus::Active, 0.0, 0.0, 0.0);
        descriptor.last_heartbeat = u64::MAX;
        registry.register_node(descriptor).unwrap();
        assert_eq!(registry.get_node(&id).unwrap().last_heartbeat, clock.now_millis());

        clock.advance(Duration::from_secs(61));

        assert_eq!(registry.sweep().demoted, vec![id]);
    }

    #[test]
    fn invalid_transition_is_rejected() {
        let (registry, _) = registry();
        let id = NodeId::new("a");
        registry.register_node(node("a", "chain", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();
        registry.update_node_status(&id, NodeStatus::Inactive).unwrap();

        let err = registry.update_node_status(&id, NodeStatus::Active).unwrap_err();
        assert_eq!(
            err,
            RegistryError::InvalidTransition { from: NodeStatus::Inactive, to: NodeStatus::Active }
        );
        assert_eq!(registry.get_node(&id).unwrap().status, NodeStatus::Inactive);
    }

    #[test]
    fn malformed_registration_is_rejected() {
        let (registry, _) = registry();
        let mut rx = registry.subscribe();

        assert!(registry.register_node(NodeDescriptor::new("", "chain", 0)).is_err());
        assert!(registry.register_node(NodeDescriptor::new("a", "", 0)).is_err());

        assert!(registry.get_all_nodes().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let (registry, _) = registry();
        registry.register_node(node("a", "chain", NodeStatus::Backup, 1.0, 2.0, 3.0)).unwrap();
        let before = registry.get_all_nodes();
        let mut rx = registry.subscribe();

        let ghost = NodeId::new("nonexistent");
        registry.update_node_status(&ghost, NodeStatus::Active).unwrap();
        registry.update_node_metrics(&ghost, NodeMetrics::new(99.0, 99.0, 99.0));
        registry.deregister_node(&ghost);

        assert_eq!(registry.get_all_nodes(), before);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn deregistration_is_idempotent() {
        let (registry, _) = registry();
        let id = NodeId::new("a");
        registry.register_node(node("a", "chain", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();
        let mut rx = registry.subscribe();

        registry.deregister_node(&id);
        registry.deregister_node(&id);

        let removed = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, RegistryEvent::NodeDeregistered { .. }))
            .count();
        assert_eq!(removed, 1);
        assert!(registry.get_node(&id).is_none());
    }

    #[test]
    fn deregistering_the_leader_clears_the_pointer() {
        let (registry, _) = registry();
        let role = Role::new("chain");
        registry.register_node(node("a", "chain", NodeStatus::Backup, 0.0, 0.0, 0.0)).unwrap();
        registry.register_node(node("z", "chain", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(registry.get_role_leader(&role).unwrap().id, NodeId::new("a"));

        registry.deregister_node(&NodeId::new("a"));

        assert!(registry.get_role_leader(&role).is_none());
        assert_eq!(registry.get_active_nodes_for_role(&role).len(), 1);
    }

    #[test]
    fn leader_pointer_is_single_valued() {
        let (registry, _) = registry();
        let role = Role::new("r");
        for id in ["a", "b", "c"] {
            registry.register_node(node(id, "r", NodeStatus::Backup, 0.0, 0.0, 0.0)).unwrap();
        }
        let active = registry.get_active_nodes_for_role(&role);
        let leader = registry.get_role_leader(&role).unwrap();

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, leader.id);
    }

    #[test]
    fn demoted_leader_loses_the_pointer() {
        let (registry, _) = registry();
        let role = Role::new("r");
        registry.register_node(node("a", "r", NodeStatus::Backup, 0.0, 0.0, 0.0)).unwrap();
        registry.register_node(node("b", "r", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();

        registry.update_node_status(&NodeId::new("a"), NodeStatus::Backup).unwrap();

        assert!(registry.get_role_leader(&role).is_none());
    }

    #[test]
    fn role_change_on_reregistration_releases_old_role() {
        let (registry, _) = registry();
        registry.register_node(node("a", "old", NodeStatus::Backup, 0.0, 0.0, 0.0)).unwrap();
        assert!(registry.get_role_leader(&Role::new("old")).is_some());

        registry.register_node(node("a", "new", NodeStatus::Backup, 0.0, 0.0, 0.0)).unwrap();

        assert!(registry.get_role_leader(&Role::new("old")).is_none());
        assert_eq!(
            registry.get_role_leader(&Role::new("new")).unwrap().id,
            NodeId::new("a")
        );
    }

    #[test]
    fn events_follow_mutation_order() {
        let (registry, _) = registry();
        let mut rx = registry.subscribe();

        registry.register_node(node("a", "chain", NodeStatus::Backup, 0.0, 0.0, 0.0)).unwrap();
        registry.deregister_node(&NodeId::new("a"));

        let kinds: Vec<&'static str> = drain(&mut rx)
            .iter()
            .map(|e| match e {
                RegistryEvent::NodeRegistered { .. } => "registered",
                RegistryEvent::NodeStatusUpdated { .. } => "updated",
                RegistryEvent::NodeDeregistered { .. } => "deregistered",
                RegistryEvent::LeaderPromoted { .. } => "promoted",
                RegistryEvent::NoAvailableNodes { .. } => "leaderless",
            })
            .collect();
        assert_eq!(kinds, vec!["registered", "promoted", "deregistered", "leaderless"]);
    }

    #[test]
    fn recheck_of_empty_role_reports_no_available_nodes() {
        let (registry, _) = registry();
        let mut rx = registry.subscribe();

        registry.check_role_leadership(&Role::new("game_compute"));

        assert_eq!(
            drain(&mut rx),
            vec![RegistryEvent::NoAvailableNodes { role: Role::new("game_compute") }]
        );
        assert_eq!(registry.config().heartbeat_interval, Duration::from_secs(30));
    }

    #[test]
    fn metrics_feed_the_election() {
        let (registry, _) = registry();
        let role = Role::new("r");
        registry.register_node(node("holder", "r", NodeStatus::Active, 0.0, 0.0, 0.0)).unwrap();
        registry.register_node(node("a", "r", NodeStatus::Backup, 0.0, 0.0, 0.0)).unwrap();
        registry.register_node(node("b", "r", NodeStatus::Backup, 50.0, 50.0, 50.0)).unwrap();

        registry.update_node_metrics(&NodeId::new("a"), NodeMetrics::new(90.0, 90.0, 900.0));
        registry.deregister_node(&NodeId::new("holder"));

        assert_eq!(registry.get_role_leader(&role).unwrap().id, NodeId::new("b"));
    }
}
