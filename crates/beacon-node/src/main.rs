use async_trait::async_trait;
use beacon_core::{MembershipRegistry, RegistryEvent, Role};
use beacon_registry::{MemoryRegistry, RegistryConfig};
use beacon_service::{BoxError, ServiceConfig, ServiceHooks, ServiceNode};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "beacon-node")]
#[command(about = "Runs a service registry with a pool of workers per role", long_about = None)]
struct Cli {
    /// Roles to run workers for
    #[arg(long, env = "BEACON_ROLES", value_delimiter = ',', default_value = "auth,chain,game_compute")]
    roles: Vec<String>,

    /// Workers per role; all but the first start as backups
    #[arg(long, env = "BEACON_REPLICAS", default_value_t = 2)]
    replicas: usize,

    /// Registry liveness sweep cadence
    #[arg(long, env = "BEACON_SWEEP_INTERVAL_SECS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    sweep_interval_secs: u64,

    /// Worker heartbeat cadence
    #[arg(long, env = "BEACON_HEARTBEAT_INTERVAL_SECS", default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    heartbeat_interval_secs: u64,

    /// Let the first active worker of a leaderless role become its leader
    #[arg(long, env = "BEACON_CLAIM_ACTIVE_LEADERSHIP")]
    claim_active_leadership: bool,

    /// Expose Prometheus metrics on this address
    #[arg(long, env = "BEACON_METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,
}

struct RoleWorker {
    role: Role,
}

#[async_trait]
impl ServiceHooks for RoleWorker {
    async fn initialize(&self) -> Result<(), BoxError> {
        tracing::debug!(role = %self.role, "worker initializing");
        Ok(())
    }

    async fn cleanup(&self) -> Result<(), BoxError> {
        tracing::debug!(role = %self.role, "worker cleaning up");
        Ok(())
    }

    async fn on_promoted(&self) {
        tracing::info!(role = %self.role, "worker took over role");
    }

    async fn on_demoted(&self) {
        tracing::info!(role = %self.role, "worker handed role over");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        tracing::info!("metrics listening on {}", addr);
    }

    let config = RegistryConfig::default()
        .with_heartbeat_interval(Duration::from_secs(cli.sweep_interval_secs))
        .with_claim_leadership_on_activation(cli.claim_active_leadership);
    let registry = MemoryRegistry::new(config);
    registry.start_health_check();
    tracing::info!(sweep_interval = ?registry.config().heartbeat_interval, "registry started");

    // Event logger
    let mut events = registry.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let shared: Arc<dyn MembershipRegistry> = Arc::new(registry.clone());
    let service_config = ServiceConfig::default()
        .with_heartbeat_interval(Duration::from_secs(cli.heartbeat_interval_secs));

    let mut workers = Vec::new();
    for role in &cli.roles {
        for replica in 0..cli.replicas.max(1) {
            let hooks = RoleWorker { role: Role::new(role.as_str()) };
            let worker = ServiceNode::for_role(role.as_str(), hooks, shared.clone())
                .with_config(service_config.clone());

            if let Err(e) = worker.start().await {
                tracing::error!(role = %role, error = %e, "worker failed to start");
                continue;
            }
            if replica > 0 {
                worker.become_backup()?;
            }
            workers.push(worker);
        }
    }
    tracing::info!(workers = workers.len(), roles = cli.roles.len(), "workers started");

    shutdown_signal().await;

    for worker in &workers {
        if let Err(e) = worker.stop().await {
            tracing::error!(node = %worker.id(), error = %e, "worker stop failed");
        }
    }
    registry.stop_health_check();
    tracing::info!(remaining = registry.get_all_nodes().len(), "registry shut down");

    Ok(())
}

fn log_event(event: &RegistryEvent) {
    match event {
        RegistryEvent::LeaderPromoted { node } => {
            tracing::info!(role = %node.role, node = %node.id, "leader promoted");
        }
        RegistryEvent::NoAvailableNodes { role } => {
            tracing::warn!(role = %role, "role has no available nodes");
        }
        _ => {
            let payload = serde_json::to_string(event).unwrap_or_default();
            tracing::debug!(role = %event.role(), event = %payload, "registry event");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("signal received, starting graceful shutdown");
}
