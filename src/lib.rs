pub mod config;
pub mod coordination;
pub mod domain {
    pub mod health;
    pub mod payment;
    pub mod routing_decision;
    pub mod summary;
}
pub mod error;
pub mod health {
    pub mod monitor;
    pub mod selector;
}
pub mod http {
    pub mod handlers {
        pub mod ops;
        pub mod payments;
        pub mod purge;
        pub mod summary;
    }
    pub mod routes;
}
pub mod processors;
pub mod service {
    pub mod payment_gateway;
}
pub mod storage;
pub mod worker {
    pub mod intake;
    pub mod retry;
}

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub intake: worker::intake::IntakeQueue,
    pub store: Arc<dyn storage::PaymentStore>,
    pub coordination: Arc<dyn coordination::CoordinationStore>,
    pub default_client: Arc<dyn processors::ProcessorClient>,
    pub fallback_client: Arc<dyn processors::ProcessorClient>,
    pub monitor: health::monitor::HealthMonitor,
    pub purge_processors: bool,
}
