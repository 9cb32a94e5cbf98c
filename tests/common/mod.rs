#![allow(dead_code)]

use payments_router::coordination::store_memory::MemoryCoordinationStore;
use payments_router::domain::health::HealthCheck;
use payments_router::domain::payment::{Payment, ProcessingType};
use payments_router::health::monitor::{HealthMonitor, MonitorSettings};
use payments_router::health::selector::SelectionPolicy;
use payments_router::processors::mock::{MockBehavior, MockProcessor};
use payments_router::service::payment_gateway::PaymentGateway;
use payments_router::storage::store_memory::MemoryPaymentStore;
use std::sync::Arc;

pub struct Harness {
    pub coordination: Arc<MemoryCoordinationStore>,
    pub default: Arc<MockProcessor>,
    pub fallback: Arc<MockProcessor>,
    pub store: Arc<MemoryPaymentStore>,
    pub monitor: HealthMonitor,
    pub gateway: PaymentGateway,
}

pub fn harness(default_health: Option<HealthCheck>, fallback_health: Option<HealthCheck>) -> Harness {
    harness_with(default_health, fallback_health, MonitorSettings::default())
}

pub fn harness_with(
    default_health: Option<HealthCheck>,
    fallback_health: Option<HealthCheck>,
    settings: MonitorSettings,
) -> Harness {
    let coordination = Arc::new(MemoryCoordinationStore::new());
    let default = Arc::new(MockProcessor::new(ProcessingType::Default, MockBehavior::Accept, default_health));
    let fallback = Arc::new(MockProcessor::new(ProcessingType::Fallback, MockBehavior::Accept, fallback_health));
    let monitor = HealthMonitor::new(
        coordination.clone(),
        default.clone(),
        fallback.clone(),
        SelectionPolicy::default(),
        settings,
    );
    let gateway = PaymentGateway {
        monitor: monitor.clone(),
        default_client: default.clone(),
        fallback_client: fallback.clone(),
    };

    Harness {
        coordination,
        default,
        fallback,
        store: Arc::new(MemoryPaymentStore::new()),
        monitor,
        gateway,
    }
}

pub fn payment(id: &str, amount: f64) -> Payment {
    Payment {
        correlation_id: id.to_string(),
        amount,
        requested_at: None,
        processing_type: None,
    }
}
