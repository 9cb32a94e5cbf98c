use crate::domain::payment::{Payment, ProcessingType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessorSummary {
    #[serde(rename = "totalRequests")]
    pub total_requests: u64,
    #[serde(rename = "totalAmount")]
    pub total_amount: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentsSummary {
    pub default: ProcessorSummary,
    pub fallback: ProcessorSummary,
}

/// Sums amounts in integer cents so the two-decimal totals never drift.
#[derive(Debug, Default)]
pub struct SummaryAccumulator {
    default_requests: u64,
    default_cents: i128,
    fallback_requests: u64,
    fallback_cents: i128,
}

impl SummaryAccumulator {
    pub fn add(&mut self, processing_type: ProcessingType, amount_cents: i64) {
        match processing_type {
            ProcessingType::Default => {
                self.default_requests += 1;
                self.default_cents += i128::from(amount_cents);
            }
            ProcessingType::Fallback => {
                self.fallback_requests += 1;
                self.fallback_cents += i128::from(amount_cents);
            }
        }
    }

    pub fn add_bucket(&mut self, processing_type: ProcessingType, requests: u64, amount_cents: i64) {
        match processing_type {
            ProcessingType::Default => {
                self.default_requests += requests;
                self.default_cents += i128::from(amount_cents);
            }
            ProcessingType::Fallback => {
                self.fallback_requests += requests;
                self.fallback_cents += i128::from(amount_cents);
            }
        }
    }

    /// Counts a stored payment if it was routed and falls inside the window.
    pub fn add_payment(&mut self, payment: &Payment, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) {
        let Some(processing_type) = payment.processing_type else {
            return;
        };
        let Some(requested_at) = payment.requested_at else {
            return;
        };
        if within_window(requested_at, from, to) {
            self.add(processing_type, payment.amount_cents());
        }
    }

    pub fn finish(self) -> PaymentsSummary {
        PaymentsSummary {
            default: ProcessorSummary {
                total_requests: self.default_requests,
                total_amount: cents_to_amount(self.default_cents),
            },
            fallback: ProcessorSummary {
                total_requests: self.fallback_requests,
                total_amount: cents_to_amount(self.fallback_cents),
            },
        }
    }
}

pub fn within_window(requested_at: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    if from.is_some_and(|f| requested_at < f) {
        return false;
    }
    if to.is_some_and(|t| requested_at > t) {
        return false;
    }
    true
}

fn cents_to_amount(cents: i128) -> f64 {
    cents as f64 / 100.0
}
