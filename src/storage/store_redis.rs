use crate::domain::payment::Payment;
use crate::domain::summary::{PaymentsSummary, SummaryAccumulator};
use crate::storage::{PaymentStore, PAYMENTS_KEY};
use anyhow::Result;
use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::collections::HashMap;

/// Payments live in one Redis hash, field = correlation id, value = JSON.
#[derive(Clone)]
pub struct RedisPaymentStore {
    conn: MultiplexedConnection,
}

impl RedisPaymentStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(Self { conn })
    }
}

pub fn encode_record(payment: &Payment) -> Result<String> {
    Ok(serde_json::to_string(payment)?)
}

/// Aggregates raw hash fields; unreadable records are logged and skipped.
pub fn summarize_records<I>(records: I, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> PaymentsSummary
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut acc = SummaryAccumulator::default();
    for (correlation_id, raw) in records {
        match serde_json::from_str::<Payment>(&raw) {
            Ok(payment) => acc.add_payment(&payment, from, to),
            Err(e) => tracing::warn!(%correlation_id, "skipping unreadable stored payment: {}", e),
        }
    }
    acc.finish()
}

#[async_trait::async_trait]
impl PaymentStore for RedisPaymentStore {
    async fn save_payment(&self, payment: &Payment) -> Result<()> {
        let mut conn = self.conn.clone();
        let payload = encode_record(payment)?;
        let _: i64 = conn.hset(PAYMENTS_KEY, &payment.correlation_id, payload).await?;
        Ok(())
    }

    async fn payments_summary(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<PaymentsSummary> {
        let mut conn = self.conn.clone();
        let all: HashMap<String, String> = conn.hgetall(PAYMENTS_KEY).await?;
        Ok(summarize_records(all, from, to))
    }

    async fn purge_payments(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(PAYMENTS_KEY).await?;
        Ok(())
    }
}
