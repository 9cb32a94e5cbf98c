use crate::coordination::{CoordinationStore, LEADER_LOCK_KEY, PROCESSORS_HEALTH_KEY};
use crate::domain::health::ProcessorsHealth;
use anyhow::Result;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

#[derive(Clone)]
pub struct RedisCoordinationStore {
    conn: MultiplexedConnection,
}

impl RedisCoordinationStore {
    /// Fails when Redis cannot be reached, which aborts startup.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(Self { conn })
    }
}

fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

/// `SET key id NX EX ttl`: replies OK when taken, nil when someone holds it.
fn acquire_cmd(instance_id: &str, ttl: Duration) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(LEADER_LOCK_KEY)
        .arg(instance_id)
        .arg("NX")
        .arg("EX")
        .arg(ttl_secs(ttl));
    cmd
}

fn is_holder(holder: Option<&str>, instance_id: &str) -> bool {
    holder == Some(instance_id)
}

fn decode_snapshot(payload: Option<&str>) -> Result<Option<ProcessorsHealth>> {
    match payload {
        Some(p) => Ok(Some(serde_json::from_str::<ProcessorsHealth>(p)?)),
        None => Ok(None),
    }
}

#[async_trait::async_trait]
impl CoordinationStore for RedisCoordinationStore {
    async fn try_acquire_leader(&self, instance_id: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let acquired: Option<String> = acquire_cmd(instance_id, ttl).query_async(&mut conn).await?;
        if acquired.is_some() {
            return Ok(true);
        }

        let holder: Option<String> = conn.get(LEADER_LOCK_KEY).await?;
        Ok(is_holder(holder.as_deref(), instance_id))
    }

    async fn renew_leader(&self, _instance_id: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: bool = conn.expire(LEADER_LOCK_KEY, ttl_secs(ttl) as i64).await?;
        Ok(())
    }

    async fn publish_snapshot(&self, snapshot: &ProcessorsHealth, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(snapshot)?;
        let _: () = conn.set_ex(PROCESSORS_HEALTH_KEY, payload, ttl_secs(ttl)).await?;
        Ok(())
    }

    async fn fetch_snapshot(&self) -> Result<Option<ProcessorsHealth>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(PROCESSORS_HEALTH_KEY).await?;
        decode_snapshot(payload.as_deref())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
