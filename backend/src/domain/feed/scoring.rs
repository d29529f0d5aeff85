//! Soft-scoring helpers for the ranking stage.

use crate::domain::Match;

/// Weight of each blended term in the final feed score.
const WEIGHT_RESONANCE: f64 = 0.40;
const WEIGHT_FRESHNESS: f64 = 0.15;
/// Reserved slot kept at zero until an engagement signal lands.
const WEIGHT_RESERVED: f64 = 0.15;
const WEIGHT_GHOST: f64 = 0.15;
const WEIGHT_SUBSCRIPTION: f64 = 0.15;

/// Activity freshness tiering over hours since last active.
pub fn freshness(hours_since_active: f64) -> f64 {
    if hours_since_active <= 1.0 {
        1.0
    } else if hours_since_active <= 24.0 {
        0.9
    } else if hours_since_active <= 72.0 {
        0.7
    } else {
        (0.7 - (hours_since_active - 72.0) / 168.0).max(0.3)
    }
}

/// Ghost penalty over the candidate's recent matches.
///
/// `recent_matches` is already bounded to the 20 most recent by the
/// repository read; the rate is ghosted-over-matched within that window.
pub fn ghost_penalty(recent_matches: &[Match]) -> f64 {
    let matched = recent_matches
        .iter()
        .filter(|pair| pair.matched_at.is_some())
        .count();
    if matched == 0 {
        return 0.0;
    }
    let ghosted = recent_matches.iter().filter(|pair| pair.is_ghosted()).count();
    let rate = ghosted as f64 / matched as f64;
    (rate * 0.7).min(0.5)
}

/// Blend the soft-score terms into the final ranking score.
pub fn blend(
    resonance_total: u8,
    freshness_score: f64,
    ghost_penalty: f64,
    subscription_boost: f64,
) -> f64 {
    f64::from(resonance_total) / 100.0 * WEIGHT_RESONANCE
        + freshness_score * WEIGHT_FRESHNESS
        + 0.0 * WEIGHT_RESERVED
        + (1.0 - ghost_penalty) * WEIGHT_GHOST
        + (1.0 + subscription_boost) * WEIGHT_SUBSCRIPTION
}
