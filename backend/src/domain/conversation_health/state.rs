//! Health state machine.

use crate::domain::HealthState;

use super::signals::HealthSignals;

/// Signal thresholds counting toward a cooling transition.
fn negative_count(signals: &HealthSignals) -> usize {
    [
        signals.latency_trend < -0.3,
        signals.length_trend < -0.3,
        signals.sentiment_trajectory < -0.2,
        signals.initiative_ratio < 0.3,
        signals.topic_diversity < 0.3,
    ]
    .into_iter()
    .filter(|hit| *hit)
    .count()
}

/// Signal thresholds counting toward an active transition.
fn positive_count(signals: &HealthSignals) -> usize {
    [
        signals.latency_trend > 0.2,
        signals.length_trend > 0.0,
        signals.sentiment_trajectory > 0.0,
        signals.initiative_ratio > 0.5,
        signals.topic_diversity > 0.5,
    ]
    .into_iter()
    .filter(|hit| *hit)
    .count()
}

/// Compute the next health state.
///
/// Starvation dominates: three silent days always land in `dormant`
/// regardless of the signals.
pub fn next_state(
    previous: HealthState,
    days_since_last_message: f64,
    signals: &HealthSignals,
) -> HealthState {
    if days_since_last_message >= 3.0 {
        return HealthState::Dormant;
    }
    if previous == HealthState::Dormant && days_since_last_message < 1.0 {
        return HealthState::Revived;
    }

    if negative_count(signals) >= 2 {
        return HealthState::Cooling;
    }

    let positives = positive_count(signals);
    if positives >= 3 {
        return HealthState::Active;
    }
    if previous == HealthState::Warming {
        return if positives >= 2 {
            HealthState::Active
        } else {
            HealthState::Warming
        };
    }
    previous
}
