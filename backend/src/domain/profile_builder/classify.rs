//! Archetype, style, and score classification over the signal bundles.

use crate::domain::events::SpeakingPace;
use crate::domain::signals::{BioStyle, SignalBundles};
use crate::domain::{CommunicationStyle, EnergyArchetype, PEAK_HOUR_SLOTS};

/// Classified outcome fed into the profile row and vector metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub archetype: EnergyArchetype,
    pub style: CommunicationStyle,
    pub dominant_emotions: Vec<String>,
    pub depth_score: f64,
    pub vocabulary_richness: f64,
    pub humor_score: f64,
    pub completeness: f64,
    pub peak_hours: [f64; PEAK_HOUR_SLOTS],
}

/// Classify the full bundle record.
pub fn classify(bundles: &SignalBundles) -> Classification {
    Classification {
        archetype: classify_archetype(bundles),
        style: classify_style(bundles),
        dominant_emotions: dominant_emotions(bundles),
        depth_score: depth_score(bundles),
        vocabulary_richness: vocabulary_richness(bundles),
        humor_score: humor_score(bundles),
        completeness: completeness(bundles),
        peak_hours: bundles
            .sessions
            .as_ref()
            .map(|sessions| sessions.hourly_activity)
            .unwrap_or([0.0; PEAK_HOUR_SLOTS]),
    }
}

/// Additive indicator scoring per archetype; ties break on iteration order.
pub fn classify_archetype(bundles: &SignalBundles) -> EnergyArchetype {
    if bundles.is_empty() {
        return EnergyArchetype::Wave;
    }

    let mut best = EnergyArchetype::ALL[0];
    let mut best_score = f64::NEG_INFINITY;
    for archetype in EnergyArchetype::ALL {
        let score = archetype_score(archetype, bundles);
        if score > best_score {
            best = archetype;
            best_score = score;
        }
    }
    best
}

fn archetype_score(archetype: EnergyArchetype, bundles: &SignalBundles) -> f64 {
    let voice = bundles.voice.as_ref();
    let bio = bundles.bio.as_ref();
    let messaging = bundles.messaging.as_ref();
    let typing = bundles.typing.as_ref();
    let sessions = bundles.sessions.as_ref();
    let browsing = bundles.browsing.as_ref();

    let mut score = 0.0;
    match archetype {
        EnergyArchetype::Spark => {
            if voice.is_some_and(|v| v.speaking_pace == SpeakingPace::Fast) {
                score += 0.3;
            }
            if messaging.is_some_and(|m| m.emoji_rate > 0.5) {
                score += 0.2;
            }
            if sessions.is_some_and(|s| s.sessions_per_day > 5.0) {
                score += 0.2;
            }
            if typing.is_some_and(|t| t.mean_burst_ms < 2_000.0) {
                score += 0.15;
            }
            if browsing.is_some_and(|b| b.views_per_session > 10.0) {
                score += 0.15;
            }
        }
        EnergyArchetype::Anchor => {
            if voice.is_some_and(|v| v.speaking_pace == SpeakingPace::Slow) {
                score += 0.3;
            }
            if messaging.is_some_and(|m| m.avg_length > 100.0) {
                score += 0.25;
            }
            if typing.is_some_and(|t| t.mean_burst_ms > 5_000.0) {
                score += 0.2;
            }
            if messaging.is_some_and(|m| m.question_rate > 0.4) {
                score += 0.25;
            }
        }
        EnergyArchetype::Wave => {
            if voice.is_some_and(|v| v.sentiment > 0.5) {
                score += 0.3;
            }
            if messaging.is_some_and(|m| m.vocabulary_diversity > 0.7) {
                score += 0.25;
            }
            if bio.is_some_and(|b| b.style == BioStyle::Expressive) {
                score += 0.2;
            }
            if typing.is_some_and(|t| t.cadence_variance_ms > 3_000.0) {
                score += 0.25;
            }
        }
        EnergyArchetype::Ember => {
            if voice.is_some_and(|v| v.vocabulary_richness > 0.6) {
                score += 0.3;
            }
            if messaging.is_some_and(|m| m.avg_length > 40.0 && m.avg_length <= 100.0) {
                score += 0.3;
            }
            if browsing.is_some_and(|b| b.photo_dwell_ratio < 2.0) {
                score += 0.2;
            }
            if sessions.is_some_and(|s| s.mean_duration_ms > 600_000.0) {
                score += 0.2;
            }
        }
        EnergyArchetype::Storm => {
            if voice.is_some_and(|v| v.speaking_pace == SpeakingPace::Fast && v.sentiment < 0.0) {
                score += 0.3;
            }
            if typing.is_some_and(|t| t.cadence_variance_ms > 5_000.0) {
                score += 0.3;
            }
            if sessions.is_some_and(|s| s.sessions_per_day > 8.0) {
                score += 0.2;
            }
            if messaging.is_some_and(|m| m.emoji_rate > 0.8) {
                score += 0.2;
            }
        }
    }
    score
}

/// Decision cascade over messaging and bio; absent messaging metrics read
/// as zero so a minimal bio alone still classifies as minimal.
pub fn classify_style(bundles: &SignalBundles) -> CommunicationStyle {
    if bundles.messaging.is_none() && bundles.bio.is_none() {
        return CommunicationStyle::Expressive;
    }

    let avg_length = bundles
        .messaging
        .as_ref()
        .map_or(0.0, |m| m.avg_length);
    let question_rate = bundles
        .messaging
        .as_ref()
        .map_or(0.0, |m| m.question_rate);
    let emoji_rate = bundles.messaging.as_ref().map_or(0.0, |m| m.emoji_rate);
    let vocabulary_diversity = bundles
        .messaging
        .as_ref()
        .map_or(0.0, |m| m.vocabulary_diversity);
    let voice_richness = bundles
        .voice
        .as_ref()
        .map_or(0.0, |v| v.vocabulary_richness);
    let bio_minimal = bundles
        .bio
        .as_ref()
        .is_some_and(|b| b.style == BioStyle::Minimal);

    if avg_length < 30.0 && bio_minimal {
        CommunicationStyle::Minimal
    } else if vocabulary_diversity > 0.6 && emoji_rate < 0.2 && avg_length > 40.0 {
        CommunicationStyle::Precise
    } else if vocabulary_diversity > 0.7 && avg_length > 60.0 && voice_richness > 0.7 {
        CommunicationStyle::Poetic
    } else if question_rate > 0.3 && emoji_rate > 0.3 {
        CommunicationStyle::Witty
    } else {
        CommunicationStyle::Expressive
    }
}

/// Dominant emotion tags come from the voice analysis alone.
pub fn dominant_emotions(bundles: &SignalBundles) -> Vec<String> {
    bundles
        .voice
        .as_ref()
        .map(|voice| voice.dominant_emotions.clone())
        .unwrap_or_default()
}

/// Depth-seeking score: mean of the available contributions, default 0.5.
pub fn depth_score(bundles: &SignalBundles) -> f64 {
    let mut contributions = Vec::with_capacity(3);

    if let Some(messaging) = &bundles.messaging {
        contributions.push(
            (messaging.avg_length / 100.0).min(1.0) * 0.4
                + messaging.question_rate * 0.3
                + messaging.vocabulary_diversity * 0.3,
        );
    }
    if let Some(voice) = &bundles.voice {
        if voice.vocabulary_richness > 0.0 {
            contributions.push(voice.vocabulary_richness * 0.5);
        }
    }
    if let Some(browsing) = &bundles.browsing {
        contributions.push(browsing.bio_read_rate * 0.5);
    }

    if contributions.is_empty() {
        0.5
    } else {
        contributions.iter().sum::<f64>() / contributions.len() as f64
    }
}

/// Profile-level vocabulary richness: the strongest of the voice and
/// messaging estimates.
pub fn vocabulary_richness(bundles: &SignalBundles) -> f64 {
    let voice = bundles
        .voice
        .as_ref()
        .map_or(0.0, |v| v.vocabulary_richness);
    let messaging = bundles
        .messaging
        .as_ref()
        .map_or(0.0, |m| m.vocabulary_diversity);
    voice.max(messaging).clamp(0.0, 1.0)
}

/// Humor estimate from playful messaging markers and voice positivity.
pub fn humor_score(bundles: &SignalBundles) -> f64 {
    let mut score = 0.0;
    if let Some(messaging) = &bundles.messaging {
        score += messaging.emoji_rate.min(1.0) * 0.5 + messaging.question_rate * 0.3;
    }
    if let Some(voice) = &bundles.voice {
        score += voice.sentiment.max(0.0) * 0.2;
    }
    score.clamp(0.0, 1.0)
}

/// Weighted signal-coverage score in `[0, 100]`.
pub fn completeness(bundles: &SignalBundles) -> f64 {
    let mut score = 0.0;
    if bundles.voice.is_some() {
        score += 25.0;
    }
    if bundles.bio.is_some() {
        score += 15.0;
    }
    if let Some(messaging) = &bundles.messaging {
        score += 20.0 * (messaging.message_count as f64 / 50.0).min(1.0);
    }
    if bundles.typing.is_some() {
        score += 10.0;
    }
    if let Some(sessions) = &bundles.sessions {
        score += 15.0 * (sessions.active_hour_count() as f64 / 7.0).min(1.0);
    }
    if bundles.browsing.is_some() {
        score += 15.0;
    }
    score
}
