//! Deterministic embedding-prompt construction.
//!
//! The prompt is a natural-language paragraph assembled from the signal
//! bundles; identical bundles always produce identical text so re-embeds are
//! cache-friendly upstream.

use crate::domain::User;
use crate::domain::events::SpeakingPace;
use crate::domain::signals::SignalBundles;

/// Assemble the embedding prompt for one user.
pub fn embedding_prompt(user: &User, bundles: &SignalBundles) -> String {
    let mut sentences: Vec<String> = Vec::with_capacity(6);

    if let Some(voice) = &bundles.voice {
        let pace = match voice.speaking_pace {
            SpeakingPace::Fast => "quickly and energetically",
            SpeakingPace::Moderate => "at an easy conversational pace",
            SpeakingPace::Slow => "slowly and deliberately",
        };
        sentences.push(format!("They speak {pace}."));
    }

    if let Some(messaging) = &bundles.messaging {
        let shape = if messaging.avg_length > 100.0 {
            "long, considered messages"
        } else if messaging.avg_length > 40.0 {
            "mid-length messages"
        } else {
            "short, punchy messages"
        };
        let questions = if messaging.question_rate > 0.3 {
            " and ask a lot of questions"
        } else {
            ""
        };
        sentences.push(format!("They write {shape}{questions}."));
    }

    if let Some(typing) = &bundles.typing {
        let cadence = if typing.cadence_variance_ms > 3_000.0 {
            "bursts that vary wildly in length"
        } else if typing.mean_burst_ms < 2_000.0 {
            "quick, decisive bursts"
        } else {
            "steady, even bursts"
        };
        sentences.push(format!("They type in {cadence}."));
    }

    if let Some(sessions) = &bundles.sessions {
        sentences.push(format!(
            "They are most active in the {}.",
            peak_bucket(&sessions.hourly_activity)
        ));
    }

    if let Some(browsing) = &bundles.browsing {
        let preference = if browsing.photo_dwell_ratio > 2.0 {
            "linger on photos"
        } else if browsing.bio_read_rate > 0.5 {
            "read bios carefully"
        } else {
            "skim profiles quickly"
        };
        sentences.push(format!("When browsing they {preference}."));
    }

    if let Some(bio) = user.bio.as_deref().map(str::trim).filter(|bio| !bio.is_empty()) {
        sentences.push(format!("In their own words: {bio}"));
    }

    if sentences.is_empty() {
        sentences.push("A new member with no observed behaviour yet.".to_owned());
    }

    sentences.join(" ")
}

/// Name the day-part containing the busiest hourly slot.
fn peak_bucket(hourly: &[f64; crate::domain::PEAK_HOUR_SLOTS]) -> &'static str {
    let peak_hour = hourly
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(hour, _)| hour)
        .unwrap_or(12);
    match peak_hour {
        0..=5 => "late night",
        6..=11 => "morning",
        12..=17 => "afternoon",
        _ => "evening",
    }
}
