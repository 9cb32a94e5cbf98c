use crate::domain::health::HealthCheck;
use crate::domain::payment::{Payment, ProcessingType};
use crate::error::PaymentError;
use crate::processors::{classify_status, ProcessorClient};
use anyhow::{bail, Result};
use std::time::Duration;

pub struct HttpProcessorClient {
    pub processing_type: ProcessingType,
    pub base_url: String,
    pub payment_timeout: Duration,
    pub probe_timeout: Duration,
    pub admin_token: String,
    pub client: reqwest::Client,
}

impl HttpProcessorClient {
    pub fn new(
        processing_type: ProcessingType,
        base_url: &str,
        payment_timeout: Duration,
        probe_timeout: Duration,
        admin_token: &str,
        client: reqwest::Client,
    ) -> Self {
        Self {
            processing_type,
            base_url: base_url.trim_end_matches('/').to_string(),
            payment_timeout,
            probe_timeout,
            admin_token: admin_token.to_string(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl ProcessorClient for HttpProcessorClient {
    fn processing_type(&self) -> ProcessingType {
        self.processing_type
    }

    async fn submit_payment(&self, payment: &Payment) -> Result<(), PaymentError> {
        let url = format!("{}/payments", self.base_url);
        let resp = self
            .client
            .post(url)
            .json(payment)
            .timeout(self.payment_timeout)
            .send()
            .await;

        match resp {
            Ok(r) => classify_status(self.processing_type, r.status().as_u16()),
            Err(e) if e.is_timeout() => Err(PaymentError::ProcessorTransientFailure {
                processor: self.processing_type,
                reason: "timeout".to_string(),
            }),
            Err(e) => Err(PaymentError::ProcessorTransientFailure {
                processor: self.processing_type,
                reason: e.to_string(),
            }),
        }
    }

    async fn health_check(&self) -> Result<HealthCheck> {
        let url = format!("{}/payments/service-health", self.base_url);
        let resp = self
            .client
            .get(url)
            .timeout(self.probe_timeout)
            .send()
            .await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            bail!("{} health check failed with status {}", self.processing_type, status.as_u16());
        }
        Ok(resp.json::<HealthCheck>().await?)
    }

    async fn purge_payments(&self) -> Result<()> {
        let url = format!("{}/admin/purge-payments", self.base_url);
        let resp = self
            .client
            .post(url)
            .header("X-Rinha-Token", &self.admin_token)
            .timeout(self.probe_timeout)
            .send()
            .await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            bail!("{} purge failed with status {}", self.processing_type, status.as_u16());
        }
        Ok(())
    }
}
