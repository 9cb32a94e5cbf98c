use crate::domain::health::HealthCheck;
use crate::domain::payment::{Payment, ProcessingType};
use crate::error::PaymentError;
use crate::processors::{classify_status, ProcessorClient};
use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    Accept,
    RespondWith(u16),
    TransportError,
    /// Parks every submission until `release_held` is called, then accepts.
    Hold,
}

/// Scripted in-process processor for wiring tests and local runs.
pub struct MockProcessor {
    processing_type: ProcessingType,
    behavior: Mutex<MockBehavior>,
    health: Mutex<Option<HealthCheck>>,
    gate: Semaphore,
    attempts: AtomicUsize,
    in_flight: AtomicUsize,
    probes: AtomicUsize,
    purges: AtomicUsize,
    accepted: Mutex<Vec<Payment>>,
}

impl MockProcessor {
    pub fn new(processing_type: ProcessingType, behavior: MockBehavior, health: Option<HealthCheck>) -> Self {
        Self {
            processing_type,
            behavior: Mutex::new(behavior),
            health: Mutex::new(health),
            gate: Semaphore::new(0),
            attempts: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            purges: AtomicUsize::new(0),
            accepted: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// `None` makes the health probe fail.
    pub fn set_health(&self, health: Option<HealthCheck>) {
        *self.health.lock() = health;
    }

    pub fn release_held(&self) {
        self.gate.close();
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn purges(&self) -> usize {
        self.purges.load(Ordering::SeqCst)
    }

    pub fn accepted(&self) -> Vec<Payment> {
        self.accepted.lock().clone()
    }
}

#[async_trait::async_trait]
impl ProcessorClient for MockProcessor {
    fn processing_type(&self) -> ProcessingType {
        self.processing_type
    }

    async fn submit_payment(&self, payment: &Payment) -> Result<(), PaymentError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock();

        let result = match behavior {
            MockBehavior::Accept => Ok(()),
            MockBehavior::RespondWith(status) => classify_status(self.processing_type, status),
            MockBehavior::TransportError => Err(PaymentError::ProcessorTransientFailure {
                processor: self.processing_type,
                reason: "connection refused".to_string(),
            }),
            MockBehavior::Hold => {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                // closed gate means released
                let _ = self.gate.acquire().await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        };

        if result.is_ok() {
            self.accepted.lock().push(payment.clone());
        }
        result
    }

    async fn health_check(&self) -> Result<HealthCheck> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let health = *self.health.lock();
        health.ok_or_else(|| anyhow!("{} health endpoint unreachable", self.processing_type))
    }

    async fn purge_payments(&self) -> Result<()> {
        self.purges.fetch_add(1, Ordering::SeqCst);
        self.accepted.lock().clear();
        Ok(())
    }
}
