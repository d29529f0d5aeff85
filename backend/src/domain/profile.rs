//! Resonance profile aggregate and its classification enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// High-level energy category classified from passive behavioural signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyArchetype {
    Spark,
    Anchor,
    Wave,
    Ember,
    Storm,
}

impl EnergyArchetype {
    /// Classification iteration order; also the tie-break order.
    pub const ALL: [Self; 5] = [
        Self::Spark,
        Self::Anchor,
        Self::Wave,
        Self::Ember,
        Self::Storm,
    ];

    /// Visualization palette color for this archetype.
    pub fn palette_color(self) -> &'static str {
        match self {
            Self::Spark => "#FFD700",
            Self::Anchor => "#4A90D9",
            Self::Wave => "#4AF7C4",
            Self::Ember => "#FF6B35",
            Self::Storm => "#C77DFF",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spark => "spark",
            Self::Anchor => "anchor",
            Self::Wave => "wave",
            Self::Ember => "ember",
            Self::Storm => "storm",
        }
    }
}

/// Communication shape classified from messaging and bio signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationStyle {
    Expressive,
    Precise,
    Poetic,
    Minimal,
    Witty,
}

impl CommunicationStyle {
    pub const ALL: [Self; 5] = [
        Self::Expressive,
        Self::Precise,
        Self::Poetic,
        Self::Minimal,
        Self::Witty,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expressive => "expressive",
            Self::Precise => "precise",
            Self::Poetic => "poetic",
            Self::Minimal => "minimal",
            Self::Witty => "witty",
        }
    }
}

/// Number of hourly activity slots tracked per profile.
pub const PEAK_HOUR_SLOTS: usize = 24;

/// One resonance profile per onboarded user.
///
/// The dense semantic vector itself lives in the vector store keyed by the
/// user id; this row only records whether an embedding was generated.
///
/// ## Invariants
/// - Exists iff the user completed onboarding and at least one profile
///   rebuild ran.
/// - `peak_hours` values are normalized to `[0, 1]`.
/// - Score fields (`vocabulary_richness`, `humor_score`, `depth_score`) are
///   in `[0, 1]`; `completeness` is in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResonanceProfile {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archetype: Option<EnergyArchetype>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<CommunicationStyle>,
    /// Dominant emotion tags, most prominent first.
    pub dominant_emotions: Vec<String>,
    /// Hourly activity scores indexed by hour-of-day (UTC).
    pub peak_hours: [f64; PEAK_HOUR_SLOTS],
    pub vocabulary_richness: f64,
    pub humor_score: f64,
    pub depth_score: f64,
    /// Weighted signal-coverage score in `[0, 100]`.
    pub completeness: f64,
    /// False when the embedding upstream failed during the last rebuild.
    pub embedding_generated: bool,
    pub recalculated_at: DateTime<Utc>,
    pub model_version: String,
}

impl ResonanceProfile {
    /// An empty profile shell for `user_id`, scored as fully unknown.
    pub fn empty(user_id: UserId, now: DateTime<Utc>, model_version: impl Into<String>) -> Self {
        Self {
            user_id,
            archetype: None,
            communication_style: None,
            dominant_emotions: Vec::new(),
            peak_hours: [0.0; PEAK_HOUR_SLOTS],
            vocabulary_richness: 0.0,
            humor_score: 0.0,
            depth_score: 0.5,
            completeness: 0.0,
            embedding_generated: false,
            recalculated_at: now,
            model_version: model_version.into(),
        }
    }

    /// Whether all hourly slots are zero (no session data observed).
    pub fn peak_hours_empty(&self) -> bool {
        self.peak_hours.iter().all(|slot| *slot == 0.0)
    }

    /// Age of the profile relative to `now`, in hours.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        (now - self.recalculated_at).num_seconds().max(0) as f64 / 3_600.0
    }
}
