//! Typed signal bundles produced by the profile-builder aggregators.
//!
//! Each data source yields its own bundle, or nothing when the source has
//! insufficient data. Classification predicates pattern-match over the
//! record-of-optionals; every aggregator tolerates the absence of all
//! others.

use serde::{Deserialize, Serialize};

use super::PEAK_HOUR_SLOTS;
use super::events::SpeakingPace;

/// Coarse bio length classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BioStyle {
    Minimal,
    Moderate,
    Expressive,
}

/// Signals from the most recent voice-note analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSignals {
    pub transcript_word_count: u32,
    pub vocabulary_richness: f64,
    pub sentiment: f64,
    pub dominant_emotions: Vec<String>,
    pub speaking_pace: SpeakingPace,
}

/// Signals derived from the user's bio text and edit history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BioSignals {
    pub word_count: u32,
    pub edit_count: u32,
    pub deletion_rate: f64,
    pub style: BioStyle,
}

/// Signals from the user's sent-message history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingSignals {
    pub avg_length: f64,
    pub question_rate: f64,
    pub emoji_rate: f64,
    pub vocabulary_diversity: f64,
    pub message_count: usize,
}

/// Signals from typing burst durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingSignals {
    pub mean_burst_ms: f64,
    /// Population standard deviation of burst durations.
    pub cadence_variance_ms: f64,
    pub burst_count: usize,
}

/// Signals from app session open/close events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSignals {
    /// Per-hour activity normalized by the busiest slot.
    pub hourly_activity: [f64; PEAK_HOUR_SLOTS],
    pub mean_duration_ms: f64,
    pub sessions_per_day: f64,
}

impl SessionSignals {
    /// Count of hours with meaningful activity (score above 0.1).
    pub fn active_hour_count(&self) -> usize {
        self.hourly_activity
            .iter()
            .filter(|slot| **slot > 0.1)
            .count()
    }
}

/// Signals from profile and photo browsing behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowsingSignals {
    pub photo_dwell_ratio: f64,
    pub avg_dwell_ms: f64,
    pub bio_read_rate: f64,
    pub views_per_session: f64,
}

/// The record-of-optionals composed from all six aggregators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignalBundles {
    pub voice: Option<VoiceSignals>,
    pub bio: Option<BioSignals>,
    pub messaging: Option<MessagingSignals>,
    pub typing: Option<TypingSignals>,
    pub sessions: Option<SessionSignals>,
    pub browsing: Option<BrowsingSignals>,
}

impl SignalBundles {
    /// Whether no aggregator produced any data at all.
    pub fn is_empty(&self) -> bool {
        self.voice.is_none()
            && self.bio.is_none()
            && self.messaging.is_none()
            && self.typing.is_none()
            && self.sessions.is_none()
            && self.browsing.is_none()
    }
}
