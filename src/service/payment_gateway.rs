use crate::domain::payment::{Payment, ProcessingType};
use crate::error::PaymentError;
use crate::health::monitor::HealthMonitor;
use crate::processors::ProcessorClient;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct PaymentGateway {
    pub monitor: HealthMonitor,
    pub default_client: Arc<dyn ProcessorClient>,
    pub fallback_client: Arc<dyn ProcessorClient>,
}

impl PaymentGateway {
    pub fn client_for(&self, processor: ProcessingType) -> &Arc<dyn ProcessorClient> {
        match processor {
            ProcessingType::Default => &self.default_client,
            ProcessingType::Fallback => &self.fallback_client,
        }
    }

    /// Routes and submits one payment. Stamps `processingType` (and
    /// `requestedAt` when missing) before the call; never persists anything.
    pub async fn make_payment(&self, payment: &mut Payment) -> Result<ProcessingType, PaymentError> {
        let processor = self
            .monitor
            .available_processor()
            .ok_or(PaymentError::NoAvailableProcessor)?;

        payment.processing_type = Some(processor);
        payment.requested_at.get_or_insert_with(Utc::now);

        let started = Instant::now();
        let result = self.client_for(processor).submit_payment(payment).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(()) => {
                tracing::debug!(correlation_id = %payment.correlation_id, %processor, latency_ms, "payment accepted");
            }
            Err(e) if e.is_retryable() => {
                tracing::debug!(correlation_id = %payment.correlation_id, %processor, latency_ms, "transient processor failure: {}", e);
            }
            Err(e) => {
                tracing::warn!(correlation_id = %payment.correlation_id, %processor, latency_ms, "payment rejected: {}", e);
            }
        }

        result.map(|()| processor)
    }
}
