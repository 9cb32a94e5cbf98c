use crate::coordination::CoordinationStore;
use crate::domain::health::ProcessorsHealth;
use crate::domain::payment::ProcessingType;
use crate::domain::routing_decision::RoutingDecision;
use crate::health::selector::{select_processor, SelectionPolicy};
use crate::processors::ProcessorClient;
use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub interval: Duration,
    pub leader_ttl: Duration,
    pub snapshot_ttl: Duration,
    pub probe_timeout: Duration,
    /// A locally cached decision older than this is treated as unknown.
    pub stale_after: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            leader_ttl: Duration::from_secs(15),
            snapshot_ttl: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            stale_after: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedDecision {
    decision: RoutingDecision,
    synced_at: Instant,
}

#[derive(Clone)]
pub struct HealthMonitor {
    instance_id: String,
    store: Arc<dyn CoordinationStore>,
    default_client: Arc<dyn ProcessorClient>,
    fallback_client: Arc<dyn ProcessorClient>,
    policy: SelectionPolicy,
    settings: MonitorSettings,
    cached: Arc<RwLock<Option<CachedDecision>>>,
}

impl HealthMonitor {
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        default_client: Arc<dyn ProcessorClient>,
        fallback_client: Arc<dyn ProcessorClient>,
        policy: SelectionPolicy,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            instance_id: uuid::Uuid::new_v4().to_string(),
            store,
            default_client,
            fallback_client,
            policy,
            settings,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Never touches the network; `None` until a fresh snapshot has been synced.
    pub fn available_processor(&self) -> Option<ProcessingType> {
        self.current_decision().processor()
    }

    pub fn current_decision(&self) -> RoutingDecision {
        let cached = *self.cached.read();
        match cached {
            Some(c) if c.synced_at.elapsed() <= self.settings.stale_after => c.decision,
            _ => RoutingDecision::NoneAvailable,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(instance_id = %self.instance_id, "health monitor started");
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(instance_id = %self.instance_id, "health monitor stopped");
                    return;
                }
                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    /// One round: contend for leadership, probe and publish if leader, then sync.
    pub async fn tick(&self) {
        match self
            .store
            .try_acquire_leader(&self.instance_id, self.settings.leader_ttl)
            .await
        {
            Ok(true) => self.lead().await,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(instance_id = %self.instance_id, "leader lock acquisition failed: {}", e);
            }
        }

        if let Err(e) = self.sync().await {
            tracing::warn!(instance_id = %self.instance_id, "health sync failed: {}", e);
        }
    }

    async fn lead(&self) {
        let snapshot = match self.probe().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(instance_id = %self.instance_id, "skipping health publish: {}", e);
                return;
            }
        };

        if let Err(e) = self
            .store
            .publish_snapshot(&snapshot, self.settings.snapshot_ttl)
            .await
        {
            tracing::warn!(instance_id = %self.instance_id, "health publish failed: {}", e);
            return;
        }

        if let Err(e) = self
            .store
            .renew_leader(&self.instance_id, self.settings.leader_ttl)
            .await
        {
            tracing::warn!(instance_id = %self.instance_id, "leader lock renewal failed: {}", e);
        }
        tracing::debug!(instance_id = %self.instance_id, ?snapshot, "published processor health");
    }

    /// Probes both processors concurrently; any failure fails the whole round.
    pub async fn probe(&self) -> Result<ProcessorsHealth> {
        let timeout = self.settings.probe_timeout;
        let (default, fallback) = tokio::join!(
            tokio::time::timeout(timeout, self.default_client.health_check()),
            tokio::time::timeout(timeout, self.fallback_client.health_check()),
        );

        let default = default.map_err(|_| anyhow!("default health probe timed out"))??;
        let fallback = fallback.map_err(|_| anyhow!("fallback health probe timed out"))??;

        Ok(ProcessorsHealth {
            default: Some(default),
            fallback: Some(fallback),
        })
    }

    /// Recomputes the local decision from the shared snapshot. An absent snapshot
    /// leaves the previous decision in place until it goes stale.
    pub async fn sync(&self) -> Result<()> {
        let Some(snapshot) = self.store.fetch_snapshot().await? else {
            return Ok(());
        };

        let decision = select_processor(&snapshot, &self.policy);
        *self.cached.write() = Some(CachedDecision {
            decision,
            synced_at: Instant::now(),
        });
        tracing::debug!(instance_id = %self.instance_id, ?decision, "synced routing decision");
        Ok(())
    }
}
