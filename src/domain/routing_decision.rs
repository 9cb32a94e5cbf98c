use crate::domain::payment::ProcessingType;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingDecision {
    UseDefault,
    UseFallback,
    NoneAvailable,
}

impl RoutingDecision {
    pub fn processor(&self) -> Option<ProcessingType> {
        match self {
            RoutingDecision::UseDefault => Some(ProcessingType::Default),
            RoutingDecision::UseFallback => Some(ProcessingType::Fallback),
            RoutingDecision::NoneAvailable => None,
        }
    }
}
