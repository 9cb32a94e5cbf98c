use crate::domain::payment::Payment;
use crate::domain::summary::{PaymentsSummary, SummaryAccumulator};
use crate::storage::PaymentStore;
use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryPaymentStore {
    payments: Arc<Mutex<HashMap<String, Payment>>>,
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, correlation_id: &str) -> Option<Payment> {
        self.payments.lock().get(correlation_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.payments.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl PaymentStore for MemoryPaymentStore {
    async fn save_payment(&self, payment: &Payment) -> Result<()> {
        self.payments
            .lock()
            .insert(payment.correlation_id.clone(), payment.clone());
        Ok(())
    }

    async fn payments_summary(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<PaymentsSummary> {
        let payments = self.payments.lock();
        let mut acc = SummaryAccumulator::default();
        for payment in payments.values() {
            acc.add_payment(payment, from, to);
        }
        Ok(acc.finish())
    }

    async fn purge_payments(&self) -> Result<()> {
        self.payments.lock().clear();
        Ok(())
    }
}
