use serde::{Deserialize, Serialize};

/// Body of `GET /payments/service-health` on a processor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthCheck {
    pub failing: bool,
    #[serde(rename = "minResponseTime")]
    pub min_response_time: i64,
}

impl HealthCheck {
    pub fn healthy(min_response_time: i64) -> Self {
        Self {
            failing: false,
            min_response_time,
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            min_response_time: 0,
        }
    }
}

/// Combined snapshot published by the leader and read by every instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessorsHealth {
    #[serde(default)]
    pub default: Option<HealthCheck>,
    #[serde(default)]
    pub fallback: Option<HealthCheck>,
}
