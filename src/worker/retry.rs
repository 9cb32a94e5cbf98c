use crate::domain::payment::{Payment, ProcessingType};
use crate::error::PaymentError;
use crate::service::payment_gateway::PaymentGateway;
use crate::storage::PaymentStore;
use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct RetryItem {
    pub payment: Payment,
    pub retry_count: u32,
    pub unavailable_reschedules: u32,
}

impl RetryItem {
    pub fn new(payment: Payment) -> Self {
        Self {
            payment,
            retry_count: 0,
            unavailable_reschedules: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub max_batch_size: usize,
    pub batch_timeout: Duration,
    pub cooldown: Duration,
    pub base_backoff: Duration,
    pub backoff_cap: Duration,
    pub jitter_cap: Duration,
    pub max_retries: u32,
    /// `None` keeps rescheduling while no processor is available.
    pub max_unavailable_reschedules: Option<u32>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_batch_size: 20,
            batch_timeout: Duration::from_millis(200),
            cooldown: Duration::from_millis(500),
            base_backoff: Duration::from_millis(200),
            backoff_cap: Duration::from_secs(5),
            jitter_cap: Duration::from_millis(100),
            max_retries: 5,
            max_unavailable_reschedules: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Persisted(ProcessingType),
    Rescheduled(Duration),
    Abandoned,
    Rejected,
}

/// `min(cap, base * 2^(n-1)) + U(0, jitter)` for the n-th retry.
pub fn backoff_delay(retry_count: u32, settings: &RetrySettings) -> Duration {
    let exp = retry_count.saturating_sub(1).min(31);
    let delay = settings
        .base_backoff
        .saturating_mul(1u32 << exp)
        .min(settings.backoff_cap);

    let jitter_ms = settings.jitter_cap.as_millis() as u64;
    if jitter_ms == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
}

#[derive(Clone)]
pub struct RetryQueue {
    tx: mpsc::Sender<RetryItem>,
    delayed: Arc<Mutex<HashMap<u64, String>>>,
    next_timer: Arc<AtomicU64>,
}

pub fn retry_channel(capacity: usize) -> (RetryQueue, mpsc::Receiver<RetryItem>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let queue = RetryQueue {
        tx,
        delayed: Arc::new(Mutex::new(HashMap::new())),
        next_timer: Arc::new(AtomicU64::new(0)),
    };
    (queue, rx)
}

impl RetryQueue {
    pub async fn enqueue(&self, item: RetryItem) -> Result<()> {
        self.tx
            .send(item)
            .await
            .map_err(|e| anyhow!("retry queue closed, dropping {}", e.0.payment.correlation_id))
    }

    pub fn enqueue_after(&self, item: RetryItem, delay: Duration) {
        let timer = self.next_timer.fetch_add(1, Ordering::Relaxed);
        self.delayed
            .lock()
            .insert(timer, item.payment.correlation_id.clone());

        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.delayed.lock().remove(&timer);
            if let Err(e) = queue.enqueue(item).await {
                tracing::error!("{}", e);
            }
        });
    }

    /// Correlation ids of items still waiting out a backoff or cooldown.
    pub fn delayed(&self) -> Vec<String> {
        self.delayed.lock().values().cloned().collect()
    }
}

#[derive(Clone)]
pub struct RetryEngine {
    pub gateway: PaymentGateway,
    pub store: Arc<dyn PaymentStore>,
    pub queue: RetryQueue,
    pub settings: RetrySettings,
}

impl RetryEngine {
    pub async fn run(self, mut receiver: mpsc::Receiver<RetryItem>, shutdown: CancellationToken) {
        let max_batch = self.settings.max_batch_size.max(1);
        let mut batch: Vec<RetryItem> = Vec::with_capacity(max_batch);
        let mut flush_at: Option<Instant> = None;
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep_until(flush_at.unwrap_or_else(Instant::now)), if flush_at.is_some() => {
                    flush_at = None;
                    self.spawn_batch(&mut in_flight, std::mem::take(&mut batch));
                }
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
                item = receiver.recv() => {
                    let Some(item) = item else { break };
                    if batch.is_empty() {
                        flush_at = Some(Instant::now() + self.settings.batch_timeout);
                    }
                    batch.push(item);
                    if batch.len() >= max_batch {
                        flush_at = None;
                        self.spawn_batch(&mut in_flight, std::mem::take(&mut batch));
                    }
                }
            }
        }

        receiver.close();
        while let Ok(item) = receiver.try_recv() {
            batch.push(item);
        }
        if !batch.is_empty() {
            tracing::info!(pending = batch.len(), "flushing retry batch before shutdown");
            self.process_batch(batch).await;
        }
        while in_flight.join_next().await.is_some() {}

        let stranded = self.queue.delayed();
        if !stranded.is_empty() {
            tracing::warn!(
                count = stranded.len(),
                correlation_ids = ?stranded,
                "dropping retries still waiting out their delay"
            );
        }
        tracing::info!("retry engine stopped");
    }

    fn spawn_batch(&self, in_flight: &mut JoinSet<Vec<RetryOutcome>>, batch: Vec<RetryItem>) {
        let engine = self.clone();
        in_flight.spawn(async move { engine.process_batch(batch).await });
    }

    /// Processor availability is checked once per batch; items are then
    /// attempted one after another.
    pub async fn process_batch(&self, batch: Vec<RetryItem>) -> Vec<RetryOutcome> {
        if self.gateway.monitor.available_processor().is_none() {
            tracing::debug!(size = batch.len(), "no processor available, cooling down retry batch");
            return batch
                .into_iter()
                .map(|item| self.reschedule_unavailable(item))
                .collect();
        }

        let mut outcomes = Vec::with_capacity(batch.len());
        for item in batch {
            outcomes.push(self.attempt(item).await);
        }
        outcomes
    }

    async fn attempt(&self, mut item: RetryItem) -> RetryOutcome {
        match self.gateway.make_payment(&mut item.payment).await {
            Ok(processor) => {
                if let Err(e) = self.store.save_payment(&item.payment).await {
                    tracing::error!(correlation_id = %item.payment.correlation_id, "failed to store retried payment: {}", e);
                }
                tracing::debug!(correlation_id = %item.payment.correlation_id, %processor, retry_count = item.retry_count, "retried payment accepted");
                RetryOutcome::Persisted(processor)
            }
            Err(PaymentError::NoAvailableProcessor) => self.reschedule_unavailable(item),
            Err(e) if e.is_retryable() => {
                item.retry_count += 1;
                if item.retry_count >= self.settings.max_retries {
                    tracing::warn!(correlation_id = %item.payment.correlation_id, retry_count = item.retry_count, "abandoning payment after repeated failures: {}", e);
                    return RetryOutcome::Abandoned;
                }
                let delay = backoff_delay(item.retry_count, &self.settings);
                self.queue.enqueue_after(item, delay);
                RetryOutcome::Rescheduled(delay)
            }
            Err(e) => {
                tracing::warn!(correlation_id = %item.payment.correlation_id, retry_count = item.retry_count, "dropping rejected payment: {}", e);
                RetryOutcome::Rejected
            }
        }
    }

    fn reschedule_unavailable(&self, mut item: RetryItem) -> RetryOutcome {
        item.unavailable_reschedules += 1;
        if let Some(max) = self.settings.max_unavailable_reschedules {
            if item.unavailable_reschedules > max {
                tracing::warn!(correlation_id = %item.payment.correlation_id, reschedules = item.unavailable_reschedules, "abandoning payment, no processor became available");
                return RetryOutcome::Abandoned;
            }
        }
        let cooldown = self.settings.cooldown;
        self.queue.enqueue_after(item, cooldown);
        RetryOutcome::Rescheduled(cooldown)
    }
}
