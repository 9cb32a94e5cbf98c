use crate::domain::payment::{Payment, ProcessingType};
use crate::service::payment_gateway::PaymentGateway;
use crate::storage::PaymentStore;
use crate::worker::retry::{RetryItem, RetryQueue};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("intake queue is full")]
    Full,
    #[error("intake queue is closed")]
    Closed,
}

/// Admission side of the bounded intake queue. Never waits for capacity.
#[derive(Clone)]
pub struct IntakeQueue {
    tx: mpsc::Sender<Payment>,
}

pub fn intake_channel(capacity: usize) -> (IntakeQueue, mpsc::Receiver<Payment>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (IntakeQueue { tx }, rx)
}

impl IntakeQueue {
    pub fn try_admit(&self, payment: Payment) -> Result<(), AdmissionError> {
        self.tx.try_send(payment).map_err(|e| match e {
            TrySendError::Full(_) => AdmissionError::Full,
            TrySendError::Closed(_) => AdmissionError::Closed,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeOutcome {
    Persisted(ProcessingType),
    QueuedForRetry,
    Dropped,
}

#[derive(Clone)]
pub struct IntakeWorkerPool {
    pub gateway: PaymentGateway,
    pub store: Arc<dyn PaymentStore>,
    pub retry_queue: RetryQueue,
    pub workers: usize,
}

impl IntakeWorkerPool {
    pub fn start(&self, receiver: mpsc::Receiver<Payment>, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        let receiver = Arc::new(Mutex::new(receiver));
        let mut handles: Vec<JoinHandle<()>> = (0..self.workers.max(1))
            .map(|worker| {
                let pool = self.clone();
                let receiver = receiver.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move { pool.run_worker(worker, receiver, shutdown).await })
            })
            .collect();

        // Stop admission as soon as shutdown starts, even while every worker is busy.
        handles.push(tokio::spawn(async move {
            shutdown.cancelled().await;
            receiver.lock().await.close();
        }));
        handles
    }

    async fn run_worker(self, worker: usize, receiver: Arc<Mutex<mpsc::Receiver<Payment>>>, shutdown: CancellationToken) {
        tracing::debug!(worker, "intake worker started");
        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                payment = async { receiver.lock().await.recv().await } => payment,
            };
            let Some(payment) = next else { break };
            self.process_payment(payment).await;
        }

        let mut drained = 0usize;
        loop {
            let next = {
                let mut rx = receiver.lock().await;
                rx.close();
                rx.try_recv().ok()
            };
            let Some(payment) = next else { break };
            self.process_payment(payment).await;
            drained += 1;
        }
        tracing::debug!(worker, drained, "intake worker stopped");
    }

    pub async fn process_payment(&self, mut payment: Payment) -> IntakeOutcome {
        match self.gateway.make_payment(&mut payment).await {
            Ok(processor) => {
                if let Err(e) = self.store.save_payment(&payment).await {
                    tracing::error!(correlation_id = %payment.correlation_id, %processor, "failed to store payment: {}", e);
                }
                IntakeOutcome::Persisted(processor)
            }
            Err(e) if e.is_retryable() => {
                tracing::debug!(correlation_id = %payment.correlation_id, "handing payment to retry engine: {}", e);
                match self.retry_queue.enqueue(RetryItem::new(payment)).await {
                    Ok(()) => IntakeOutcome::QueuedForRetry,
                    Err(e) => {
                        tracing::error!("{}", e);
                        IntakeOutcome::Dropped
                    }
                }
            }
            Err(_) => IntakeOutcome::Dropped,
        }
    }
}
