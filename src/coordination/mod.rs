use crate::domain::health::ProcessorsHealth;
use anyhow::Result;
use std::time::Duration;

pub mod store_memory;
pub mod store_redis;

pub const LEADER_LOCK_KEY: &str = "processor_health_leader_lock";
pub const PROCESSORS_HEALTH_KEY: &str = "processors_health_status";

/// Shared store used by every instance to elect a prober and exchange the
/// latest health snapshot. Leadership is advisory: two leaders may briefly
/// overlap, publishing is last-write-wins.
#[async_trait::async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Takes the lock if nobody holds it; returns true also when this instance
    /// already holds it.
    async fn try_acquire_leader(&self, instance_id: &str, ttl: Duration) -> Result<bool>;

    async fn renew_leader(&self, instance_id: &str, ttl: Duration) -> Result<()>;

    async fn publish_snapshot(&self, snapshot: &ProcessorsHealth, ttl: Duration) -> Result<()>;

    async fn fetch_snapshot(&self) -> Result<Option<ProcessorsHealth>>;

    async fn ping(&self) -> Result<()>;
}
