use payments_router::config::{AppConfig, CoordinationBackend, StorageBackend};
use payments_router::coordination::store_memory::MemoryCoordinationStore;
use payments_router::coordination::store_redis::RedisCoordinationStore;
use payments_router::coordination::CoordinationStore;
use payments_router::domain::payment::ProcessingType;
use payments_router::health::monitor::HealthMonitor;
use payments_router::http::routes::router;
use payments_router::processors::http::HttpProcessorClient;
use payments_router::processors::ProcessorClient;
use payments_router::service::payment_gateway::PaymentGateway;
use payments_router::storage::store_memory::MemoryPaymentStore;
use payments_router::storage::store_postgres::PgPaymentStore;
use payments_router::storage::store_redis::RedisPaymentStore;
use payments_router::storage::PaymentStore;
use payments_router::worker::intake::{intake_channel, IntakeWorkerPool};
use payments_router::worker::retry::{retry_channel, RetryEngine};
use payments_router::AppState;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let coordination: Arc<dyn CoordinationStore> = match cfg.coordination_backend {
        CoordinationBackend::Redis => Arc::new(RedisCoordinationStore::connect(&cfg.redis_url).await?),
        CoordinationBackend::Memory => Arc::new(MemoryCoordinationStore::new()),
    };

    let store: Arc<dyn PaymentStore> = match cfg.storage_backend {
        StorageBackend::Redis => Arc::new(RedisPaymentStore::connect(&cfg.redis_url).await?),
        StorageBackend::Postgres => Arc::new(PgPaymentStore::connect(&cfg.database_url, 10).await?),
        StorageBackend::Memory => Arc::new(MemoryPaymentStore::new()),
    };

    let http_client = reqwest::Client::new();
    let default_client: Arc<dyn ProcessorClient> = Arc::new(HttpProcessorClient::new(
        ProcessingType::Default,
        &cfg.default_url,
        cfg.default_timeout(),
        cfg.probe_timeout(),
        &cfg.processor_admin_token,
        http_client.clone(),
    ));
    let fallback_client: Arc<dyn ProcessorClient> = Arc::new(HttpProcessorClient::new(
        ProcessingType::Fallback,
        &cfg.fallback_url,
        cfg.fallback_timeout(),
        cfg.probe_timeout(),
        &cfg.processor_admin_token,
        http_client,
    ));

    let monitor = HealthMonitor::new(
        coordination.clone(),
        default_client.clone(),
        fallback_client.clone(),
        cfg.selection_policy(),
        cfg.monitor_settings(),
    );
    let gateway = PaymentGateway {
        monitor: monitor.clone(),
        default_client: default_client.clone(),
        fallback_client: fallback_client.clone(),
    };

    let shutdown = CancellationToken::new();
    // Cancelled only after the intake workers have drained, so their last
    // retryable failures still reach the engine.
    let retry_shutdown = CancellationToken::new();

    let monitor_task = tokio::spawn(monitor.clone().run(shutdown.clone()));

    let (retry_queue, retry_rx) = retry_channel(cfg.retry_queue_capacity);
    let engine = RetryEngine {
        gateway: gateway.clone(),
        store: store.clone(),
        queue: retry_queue.clone(),
        settings: cfg.retry_settings(),
    };
    let retry_task = tokio::spawn(engine.run(retry_rx, retry_shutdown.clone()));

    let (intake, intake_rx) = intake_channel(cfg.queue_capacity);
    let pool = IntakeWorkerPool {
        gateway,
        store: store.clone(),
        retry_queue,
        workers: cfg.workers,
    };
    let workers = pool.start(intake_rx, shutdown.clone());

    let state = AppState {
        intake,
        store,
        coordination,
        default_client,
        fallback_client,
        monitor: monitor.clone(),
        purge_processors: cfg.purge_processors,
    };

    tracing::info!(
        instance_id = %monitor.instance_id(),
        workers = cfg.workers,
        queue_capacity = cfg.queue_capacity,
        "payments router starting"
    );

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Requests answered by now may still sit in the intake queue; the
    // workers drain it after this cancel.
    shutdown.cancel();
    for worker in workers {
        if let Err(e) = worker.await {
            tracing::error!("intake worker panicked: {}", e);
        }
    }
    retry_shutdown.cancel();
    if let Err(e) = retry_task.await {
        tracing::error!("retry engine panicked: {}", e);
    }
    if let Err(e) = monitor_task.await {
        tracing::error!("health monitor panicked: {}", e);
    }

    tracing::info!("payments router stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
