use crate::domain::health::{HealthCheck, ProcessorsHealth};
use crate::domain::routing_decision::RoutingDecision;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionPolicy {
    /// Absolute latency gates, both judged on the default processor's latency.
    Threshold { preferred_max_ms: i64, fallback_gate_ms: i64 },
    /// Pick fallback when it is faster than default by more than `margin`.
    Proportional { margin: f64 },
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::Threshold {
            preferred_max_ms: 300,
            fallback_gate_ms: 200,
        }
    }
}

pub fn select_processor(health: &ProcessorsHealth, policy: &SelectionPolicy) -> RoutingDecision {
    match *policy {
        SelectionPolicy::Threshold {
            preferred_max_ms,
            fallback_gate_ms,
        } => by_threshold(health, preferred_max_ms, fallback_gate_ms),
        SelectionPolicy::Proportional { margin } => by_proportion(health, margin),
    }
}

fn usable(h: Option<&HealthCheck>) -> Option<&HealthCheck> {
    h.filter(|h| !h.failing)
}

fn by_threshold(health: &ProcessorsHealth, preferred_max_ms: i64, fallback_gate_ms: i64) -> RoutingDecision {
    let default = health.default.as_ref();
    let fallback = health.fallback.as_ref();

    if usable(default).is_some_and(|d| d.min_response_time <= preferred_max_ms) {
        return RoutingDecision::UseDefault;
    }

    let default_fast_enough = default.is_some_and(|d| d.min_response_time <= fallback_gate_ms);
    if usable(fallback).is_some() && default_fast_enough {
        return RoutingDecision::UseFallback;
    }

    if usable(default).is_some() {
        return RoutingDecision::UseDefault;
    }

    RoutingDecision::NoneAvailable
}

fn by_proportion(health: &ProcessorsHealth, margin: f64) -> RoutingDecision {
    match (usable(health.default.as_ref()), usable(health.fallback.as_ref())) {
        (Some(d), Some(f)) => {
            if (d.min_response_time as f64) * margin > f.min_response_time as f64 {
                RoutingDecision::UseFallback
            } else {
                RoutingDecision::UseDefault
            }
        }
        (Some(_), None) => RoutingDecision::UseDefault,
        (None, Some(_)) => RoutingDecision::UseFallback,
        (None, None) => RoutingDecision::NoneAvailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(default: Option<HealthCheck>, fallback: Option<HealthCheck>) -> ProcessorsHealth {
        ProcessorsHealth { default, fallback }
    }

    #[test]
    fn slow_but_healthy_default_still_beats_fallback() {
        let s = snapshot(Some(HealthCheck::healthy(900)), Some(HealthCheck::healthy(5)));
        assert_eq!(select_processor(&s, &SelectionPolicy::default()), RoutingDecision::UseDefault);
    }

    #[test]
    fn failing_default_with_low_latency_routes_to_fallback() {
        let s = snapshot(
            Some(HealthCheck {
                failing: true,
                min_response_time: 100,
            }),
            Some(HealthCheck::healthy(50)),
        );
        assert_eq!(select_processor(&s, &SelectionPolicy::default()), RoutingDecision::UseFallback);
    }

    #[test]
    fn failing_default_with_high_latency_blocks_fallback() {
        let s = snapshot(
            Some(HealthCheck {
                failing: true,
                min_response_time: 250,
            }),
            Some(HealthCheck::healthy(50)),
        );
        assert_eq!(select_processor(&s, &SelectionPolicy::default()), RoutingDecision::NoneAvailable);
    }

    #[test]
    fn unknown_default_never_opens_the_fallback_gate() {
        let s = snapshot(None, Some(HealthCheck::healthy(10)));
        assert_eq!(select_processor(&s, &SelectionPolicy::default()), RoutingDecision::NoneAvailable);
    }

    #[test]
    fn proportional_prefers_clearly_faster_fallback() {
        let policy = SelectionPolicy::Proportional { margin: 1.3 };
        let s = snapshot(Some(HealthCheck::healthy(100)), Some(HealthCheck::healthy(120)));
        assert_eq!(select_processor(&s, &policy), RoutingDecision::UseFallback);

        let s = snapshot(Some(HealthCheck::healthy(100)), Some(HealthCheck::healthy(130)));
        assert_eq!(select_processor(&s, &policy), RoutingDecision::UseDefault);
    }

    #[test]
    fn proportional_uses_the_only_healthy_processor() {
        let policy = SelectionPolicy::Proportional { margin: 1.3 };
        let s = snapshot(Some(HealthCheck::failing()), Some(HealthCheck::healthy(999)));
        assert_eq!(select_processor(&s, &policy), RoutingDecision::UseFallback);
        let s = snapshot(Some(HealthCheck::healthy(999)), None);
        assert_eq!(select_processor(&s, &policy), RoutingDecision::UseDefault);
    }
}
