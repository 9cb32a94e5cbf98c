use crate::domain::payment::Payment;
use crate::domain::summary::PaymentsSummary;
use anyhow::Result;
use chrono::{DateTime, Utc};

pub mod store_memory;
pub mod store_postgres;
pub mod store_redis;

pub const PAYMENTS_KEY: &str = "payments";

/// Persistence for successfully delivered payments. Saves are keyed by
/// correlation id, so saving the same payment twice overwrites rather than
/// double counts.
#[async_trait::async_trait]
pub trait PaymentStore: Send + Sync {
    async fn save_payment(&self, payment: &Payment) -> Result<()>;

    /// Aggregates per processor over payments requested within `[from, to]`.
    async fn payments_summary(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<PaymentsSummary>;

    async fn purge_payments(&self) -> Result<()>;
}
