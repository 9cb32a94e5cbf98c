use crate::domain::health::HealthCheck;
use crate::domain::payment::{Payment, ProcessingType};
use crate::error::PaymentError;
use anyhow::Result;

pub mod http;
pub mod mock;

#[async_trait::async_trait]
pub trait ProcessorClient: Send + Sync {
    fn processing_type(&self) -> ProcessingType;

    /// Submits one payment; the body must already carry its processing type.
    async fn submit_payment(&self, payment: &Payment) -> Result<(), PaymentError>;

    async fn health_check(&self) -> Result<HealthCheck>;

    async fn purge_payments(&self) -> Result<()>;
}

/// 200 is success; overload/unavailability statuses are worth retrying, anything
/// else is taken as a permanent rejection of this payment.
pub fn classify_status(processor: ProcessingType, status: u16) -> Result<(), PaymentError> {
    match status {
        200 => Ok(()),
        408 | 429 | 500 | 503 => Err(PaymentError::ProcessorTransientFailure {
            processor,
            reason: format!("status {}", status),
        }),
        _ => Err(PaymentError::ProcessorPermanentRejection { processor, status }),
    }
}
