use crate::domain::payment::{Payment, ProcessingType};
use crate::domain::summary::{PaymentsSummary, SummaryAccumulator};
use crate::storage::PaymentStore;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

#[derive(Clone)]
pub struct PgPaymentStore {
    pub pool: PgPool,
}

impl PgPaymentStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

fn parse_processing_type(s: &str) -> Option<ProcessingType> {
    match s {
        "default" => Some(ProcessingType::Default),
        "fallback" => Some(ProcessingType::Fallback),
        _ => None,
    }
}

#[async_trait::async_trait]
impl PaymentStore for PgPaymentStore {
    async fn save_payment(&self, payment: &Payment) -> Result<()> {
        let requested_at = payment
            .requested_at
            .ok_or_else(|| anyhow!("payment {} has no requestedAt", payment.correlation_id))?;
        let processing_type = payment
            .processing_type
            .ok_or_else(|| anyhow!("payment {} was never routed", payment.correlation_id))?;

        sqlx::query(
            r#"
            INSERT INTO payments (correlation_id, amount_cents, requested_at, processing_type)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (correlation_id) DO UPDATE SET
                amount_cents = EXCLUDED.amount_cents,
                requested_at = EXCLUDED.requested_at,
                processing_type = EXCLUDED.processing_type
            "#,
        )
        .bind(&payment.correlation_id)
        .bind(payment.amount_cents())
        .bind(requested_at)
        .bind(processing_type.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn payments_summary(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<PaymentsSummary> {
        let rows = sqlx::query(
            r#"
            SELECT processing_type,
                   COUNT(*) AS total_requests,
                   COALESCE(SUM(amount_cents), 0)::BIGINT AS total_cents
            FROM payments
            WHERE ($1::timestamptz IS NULL OR requested_at >= $1)
              AND ($2::timestamptz IS NULL OR requested_at <= $2)
            GROUP BY processing_type
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let mut acc = SummaryAccumulator::default();
        for r in rows {
            let processing_type: String = r.get("processing_type");
            let total_requests: i64 = r.get("total_requests");
            let total_cents: i64 = r.get("total_cents");
            match parse_processing_type(&processing_type) {
                Some(pt) => acc.add_bucket(pt, total_requests.max(0) as u64, total_cents),
                None => tracing::warn!(%processing_type, "ignoring payments with unknown processing type"),
            }
        }
        Ok(acc.finish())
    }

    async fn purge_payments(&self) -> Result<()> {
        sqlx::query("DELETE FROM payments").execute(&self.pool).await?;
        Ok(())
    }
}
