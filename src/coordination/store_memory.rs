use crate::coordination::{CoordinationStore, LEADER_LOCK_KEY, PROCESSORS_HEALTH_KEY};
use crate::domain::health::ProcessorsHealth;
use anyhow::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Process-local TTL map standing in for Redis in single-instance runs.
#[derive(Clone, Default)]
pub struct MemoryCoordinationStore {
    entries: Arc<Mutex<Entries>>,
}

impl MemoryCoordinationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

type Entries = HashMap<&'static str, (String, Instant)>;

fn live(entries: &mut Entries, key: &'static str) -> Option<String> {
    let now = Instant::now();
    let expired = matches!(entries.get(key), Some((_, expires_at)) if *expires_at <= now);
    if expired {
        entries.remove(key);
    }
    entries.get(key).map(|(value, _)| value.clone())
}

#[async_trait::async_trait]
impl CoordinationStore for MemoryCoordinationStore {
    async fn try_acquire_leader(&self, instance_id: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.lock();
        match live(&mut entries, LEADER_LOCK_KEY) {
            Some(holder) => Ok(holder == instance_id),
            None => {
                entries.insert(LEADER_LOCK_KEY, (instance_id.to_string(), Instant::now() + ttl));
                Ok(true)
            }
        }
    }

    async fn renew_leader(&self, instance_id: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock();
        if let Some((holder, expires_at)) = entries.get_mut(LEADER_LOCK_KEY) {
            if holder == instance_id {
                *expires_at = Instant::now() + ttl;
            }
        }
        Ok(())
    }

    async fn publish_snapshot(&self, snapshot: &ProcessorsHealth, ttl: Duration) -> Result<()> {
        let payload = serde_json::to_string(snapshot)?;
        self.entries
            .lock()
            .insert(PROCESSORS_HEALTH_KEY, (payload, Instant::now() + ttl));
        Ok(())
    }

    async fn fetch_snapshot(&self) -> Result<Option<ProcessorsHealth>> {
        let raw = live(&mut self.entries.lock(), PROCESSORS_HEALTH_KEY);
        match raw {
            Some(p) => Ok(Some(serde_json::from_str(&p)?)),
            None => Ok(None),
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
