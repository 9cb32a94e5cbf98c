use crate::domain::payment::ProcessingType;

/// Outcome classification of a single delivery attempt.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("no available payment processor")]
    NoAvailableProcessor,

    #[error("processor {processor} failed transiently: {reason}")]
    ProcessorTransientFailure { processor: ProcessingType, reason: String },

    #[error("processor {processor} rejected payment with status {status}")]
    ProcessorPermanentRejection { processor: ProcessingType, status: u16 },
}

impl PaymentError {
    /// Transient failures and "nobody available" are worth another attempt later.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PaymentError::ProcessorPermanentRejection { .. })
    }
}
