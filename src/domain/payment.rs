use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingType {
    Default,
    Fallback,
}

impl ProcessingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingType::Default => "default",
            ProcessingType::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ProcessingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment as it moves through the pipeline and as it is sent upstream.
///
/// `processing_type` is only set once a routing decision has been made, so it is
/// omitted from the wire body until then.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    #[serde(rename = "correlationId")]
    pub correlation_id: String,
    pub amount: f64,
    #[serde(rename = "requestedAt", default, skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
    #[serde(rename = "processingType", default, skip_serializing_if = "Option::is_none")]
    pub processing_type: Option<ProcessingType>,
}

impl Payment {
    pub fn received(req: CreatePaymentRequest, now: DateTime<Utc>) -> Self {
        Self {
            correlation_id: req.correlation_id,
            amount: req.amount,
            requested_at: Some(now),
            processing_type: None,
        }
    }

    pub fn amount_cents(&self) -> i64 {
        (self.amount * 100.0).round() as i64
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreatePaymentRequest {
    #[serde(rename = "correlationId")]
    pub correlation_id: String,
    pub amount: f64,
}

/// Largest accepted amount; keeps every amount exactly representable in cents.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

pub fn validate_request(req: &CreatePaymentRequest) -> Result<(), ErrorEnvelope> {
    if req.correlation_id.trim().is_empty() {
        return Err(err("INVALID_CORRELATION_ID", "correlationId must not be empty"));
    }
    if !req.amount.is_finite() || req.amount < 0.0 {
        return Err(err("INVALID_AMOUNT", "amount must be a non-negative number"));
    }
    if req.amount > MAX_AMOUNT {
        return Err(err("INVALID_AMOUNT", "amount exceeds the maximum accepted value"));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

pub fn err(code: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrouted_payment_omits_processing_type() {
        let payment = Payment {
            correlation_id: "c1".to_string(),
            amount: 19.9,
            requested_at: None,
            processing_type: None,
        };
        let v = serde_json::to_value(&payment).unwrap();
        assert_eq!(v["correlationId"], "c1");
        assert!(v.get("processingType").is_none());
        assert!(v.get("requestedAt").is_none());
    }

    #[test]
    fn routed_payment_carries_wire_fields() {
        let now = Utc::now();
        let mut payment = Payment::received(
            CreatePaymentRequest {
                correlation_id: "c2".to_string(),
                amount: 10.0,
            },
            now,
        );
        payment.processing_type = Some(ProcessingType::Fallback);
        let v = serde_json::to_value(&payment).unwrap();
        assert_eq!(v["processingType"], "fallback");
        assert!(v["requestedAt"].is_string());
    }

    #[test]
    fn rejects_negative_and_non_finite_amounts() {
        let bad = |amount: f64| CreatePaymentRequest {
            correlation_id: "c".to_string(),
            amount,
        };
        assert!(validate_request(&bad(-1.0)).is_err());
        assert!(validate_request(&bad(f64::NAN)).is_err());
        assert!(validate_request(&bad(0.0)).is_ok());
        assert!(validate_request(&CreatePaymentRequest {
            correlation_id: " ".to_string(),
            amount: 1.0
        })
        .is_err());
    }

    #[test]
    fn amounts_above_the_ceiling_are_rejected() {
        let req = |amount: f64| CreatePaymentRequest {
            correlation_id: "c".to_string(),
            amount,
        };
        assert!(validate_request(&req(MAX_AMOUNT)).is_ok());
        let e = validate_request(&req(6.0e16)).unwrap_err();
        assert_eq!(e.error.code, "INVALID_AMOUNT");
    }

    #[test]
    fn cents_are_rounded_not_truncated() {
        let payment = Payment {
            correlation_id: "c".to_string(),
            amount: 19.99,
            requested_at: None,
            processing_type: None,
        };
        assert_eq!(payment.amount_cents(), 1999);
    }
}
