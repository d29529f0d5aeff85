//! The six passive-signal extractors.
//!
//! Each extractor is a pure function over already-fetched rows; the rebuild
//! service performs the I/O for all six sources concurrently and feeds the
//! results in. Every extractor returns `None` when its source has too little
//! data, and each tolerates the absence of all others.

use chrono::{DateTime, Utc};

use crate::domain::events::{BehavioralEvent, EventType, VoiceAnalysisPayload};
use crate::domain::signals::{
    BioSignals, BioStyle, BrowsingSignals, MessagingSignals, SessionSignals, TypingSignals,
    VoiceSignals,
};
use crate::domain::{Message, PEAK_HOUR_SLOTS, User};

/// Most messages considered by the messaging extractor.
pub const MESSAGING_WINDOW: usize = 500;

/// Minimum messages before messaging signals exist.
const MESSAGING_MIN: usize = 3;

/// Minimum typing bursts before cadence signals exist.
const TYPING_MIN_STARTS: usize = 5;

/// Minimum app opens before session signals exist.
const SESSION_MIN_OPENS: usize = 3;

/// Minimum profile views before browsing signals exist.
const BROWSING_MIN_VIEWS: usize = 3;

/// Coarse deletion-rate constant applied whenever any bio edits exist.
const BIO_DELETION_RATE_WITH_EDITS: f64 = 0.3;

/// Dwell defaults used until finer-grained dwell instrumentation lands.
const DEFAULT_AVG_DWELL_MS: f64 = 8_000.0;
const DEFAULT_BIO_READ_RATE: f64 = 0.6;

/// Signals from the most recent voice-note analysis.
///
/// No voice URL on the user means the source does not exist. A URL without
/// a recorded analysis event yields a zero-initialized bundle with the
/// default moderate pace, so downstream completeness still credits the
/// upload.
pub fn voice_signals(user: &User, latest: Option<&BehavioralEvent>) -> Option<VoiceSignals> {
    user.voice_intro_url.as_ref()?;

    let payload = latest.and_then(BehavioralEvent::payload::<VoiceAnalysisPayload>);
    let payload = payload.unwrap_or_default();
    Some(VoiceSignals {
        transcript_word_count: payload.transcript_word_count,
        vocabulary_richness: payload.vocabulary_richness,
        sentiment: payload.sentiment,
        dominant_emotions: payload.dominant_emotions,
        speaking_pace: payload.speaking_pace,
    })
}

/// Signals from the bio text plus its edit history.
pub fn bio_signals(user: &User, edit_event_count: usize) -> Option<BioSignals> {
    let bio = user.bio.as_deref()?;
    let word_count = bio.split_whitespace().count() as u32;

    let style = if word_count < 20 {
        BioStyle::Minimal
    } else if word_count > 80 {
        BioStyle::Expressive
    } else {
        BioStyle::Moderate
    };

    Some(BioSignals {
        word_count,
        edit_count: edit_event_count as u32,
        deletion_rate: if edit_event_count > 0 {
            BIO_DELETION_RATE_WITH_EDITS
        } else {
            0.0
        },
        style,
    })
}

/// Signals over the user's most recent sent messages.
pub fn messaging_signals(messages: &[Message]) -> Option<MessagingSignals> {
    if messages.len() < MESSAGING_MIN {
        return None;
    }

    let total = messages.len() as f64;
    let avg_length = messages
        .iter()
        .map(|message| message.content.chars().count() as f64)
        .sum::<f64>()
        / total;
    let question_rate = messages
        .iter()
        .filter(|message| message.content.contains('?'))
        .count() as f64
        / total;
    let emoji_rate = messages
        .iter()
        .map(|message| emoji_count(&message.content) as f64)
        .sum::<f64>()
        / total;

    let mut tokens = 0_usize;
    let mut unique = std::collections::HashSet::new();
    for message in messages {
        for token in message.content.split_whitespace() {
            tokens += 1;
            unique.insert(token.to_lowercase());
        }
    }
    let vocabulary_diversity = if tokens == 0 {
        0.0
    } else {
        unique.len() as f64 / tokens as f64
    };

    Some(MessagingSignals {
        avg_length,
        question_rate,
        emoji_rate,
        vocabulary_diversity,
        message_count: messages.len(),
    })
}

fn emoji_count(content: &str) -> usize {
    content
        .chars()
        .filter(|ch| ('\u{1F600}'..='\u{1F9FF}').contains(ch))
        .count()
}

/// Cadence signals from paired typing start/stop events.
///
/// `events` must be ordered ascending by client timestamp; an unmatched
/// start is paired with the next stop.
pub fn typing_signals(events: &[BehavioralEvent]) -> Option<TypingSignals> {
    let start_count = events
        .iter()
        .filter(|event| event.event_type == EventType::TypingStarted)
        .count();
    if start_count < TYPING_MIN_STARTS {
        return None;
    }

    let durations = paired_durations_ms(events, &EventType::TypingStarted, &EventType::TypingStopped);
    if durations.is_empty() {
        return None;
    }

    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    let variance = durations
        .iter()
        .map(|duration| (duration - mean).powi(2))
        .sum::<f64>()
        / durations.len() as f64;

    Some(TypingSignals {
        mean_burst_ms: mean,
        cadence_variance_ms: variance.sqrt(),
        burst_count: durations.len(),
    })
}

/// Hourly activity and session-shape signals from app open/close events.
///
/// `events` must be ordered ascending by client timestamp.
pub fn session_signals(events: &[BehavioralEvent]) -> Option<SessionSignals> {
    let opens: Vec<DateTime<Utc>> = events
        .iter()
        .filter(|event| event.event_type == EventType::AppOpened)
        .map(|event| event.client_ts)
        .collect();
    if opens.len() < SESSION_MIN_OPENS {
        return None;
    }

    let mut counts = [0_u32; PEAK_HOUR_SLOTS];
    for open in &opens {
        use chrono::Timelike;
        counts[open.hour() as usize] += 1;
    }
    let max = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    let mut hourly_activity = [0.0; PEAK_HOUR_SLOTS];
    for (slot, count) in hourly_activity.iter_mut().zip(counts) {
        *slot = count as f64 / max;
    }

    let durations = paired_durations_ms(events, &EventType::AppOpened, &EventType::AppClosed);
    let mean_duration_ms = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<f64>() / durations.len() as f64
    };

    Some(SessionSignals {
        hourly_activity,
        mean_duration_ms,
        sessions_per_day: opens.len() as f64 / 7.0,
    })
}

/// Browsing-preference signals from profile and photo view events.
pub fn browsing_signals(events: &[BehavioralEvent]) -> Option<BrowsingSignals> {
    let profile_views = events
        .iter()
        .filter(|event| event.event_type == EventType::ProfileViewed)
        .count();
    if profile_views < BROWSING_MIN_VIEWS {
        return None;
    }

    let photo_views = events
        .iter()
        .filter(|event| event.event_type == EventType::PhotoViewed)
        .count();

    let sessions: std::collections::HashSet<_> = events
        .iter()
        .filter(|event| event.event_type == EventType::ProfileViewed)
        .map(|event| event.session_id)
        .collect();

    Some(BrowsingSignals {
        photo_dwell_ratio: photo_views as f64 / profile_views as f64,
        avg_dwell_ms: DEFAULT_AVG_DWELL_MS,
        bio_read_rate: DEFAULT_BIO_READ_RATE,
        views_per_session: profile_views as f64 / sessions.len().max(1) as f64,
    })
}

/// Pair `start`/`stop` events in order and return per-pair durations in ms.
fn paired_durations_ms(
    events: &[BehavioralEvent],
    start: &EventType,
    stop: &EventType,
) -> Vec<f64> {
    let mut pending: Option<DateTime<Utc>> = None;
    let mut durations = Vec::new();
    for event in events {
        if event.event_type == *start {
            if pending.is_none() {
                pending = Some(event.client_ts);
            }
        } else if event.event_type == *stop {
            if let Some(started) = pending.take() {
                let millis = (event.client_ts - started).num_milliseconds();
                if millis >= 0 {
                    durations.push(millis as f64);
                }
            }
        }
    }
    durations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::SpeakingPace;
    use crate::domain::{ConversationId, SessionId, SubscriptionTier, UserId};
    use chrono::{TimeDelta, TimeZone};
    use rstest::rstest;
    use serde_json::json;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid instant")
    }

    fn sample_user(bio: Option<&str>, voice_url: Option<&str>) -> User {
        let now = base_time();
        User {
            id: UserId::random(),
            display_name: "Sam".to_owned(),
            bio: bio.map(str::to_owned),
            pronouns: None,
            city: None,
            country: None,
            location: None,
            voice_intro_url: voice_url.map(str::to_owned),
            subscription_tier: SubscriptionTier::Free,
            last_active_at: now,
            onboarding_completed: true,
            deleted_at: None,
            created_at: now,
        }
    }

    fn event_at(event_type: EventType, at: DateTime<Utc>) -> BehavioralEvent {
        BehavioralEvent {
            user_id: UserId::random(),
            session_id: SessionId::random(),
            event_type,
            event_data: None,
            client_ts: at,
            server_ts: at,
        }
    }

    fn message(content: &str) -> Message {
        Message {
            conversation_id: ConversationId::random(),
            sender_id: Some(UserId::random()),
            content: content.to_owned(),
            content_type: Default::default(),
            sentiment: None,
            emotion_tag: None,
            sent_at: base_time(),
            read_at: None,
            deleted_at: None,
        }
    }

    #[test]
    fn voice_absent_without_url() {
        let user = sample_user(None, None);
        assert!(voice_signals(&user, None).is_none());
    }

    #[test]
    fn voice_url_without_analysis_yields_zeroed_bundle() {
        let user = sample_user(None, Some("https://cdn/voice.ogg"));
        let signals = voice_signals(&user, None).expect("bundle");
        assert_eq!(signals.speaking_pace, SpeakingPace::Moderate);
        assert_eq!(signals.transcript_word_count, 0);
        assert_eq!(signals.sentiment, 0.0);
    }

    #[test]
    fn voice_analysis_payload_populates_bundle() {
        let user = sample_user(None, Some("https://cdn/voice.ogg"));
        let mut event = event_at(EventType::VoiceNoteAnalyzed, base_time());
        event.event_data = Some(json!({
            "transcriptWordCount": 120,
            "vocabularyRichness": 0.8,
            "sentiment": 0.6,
            "dominantEmotions": ["joy", "curiosity"],
            "speakingPace": "fast",
        }));

        let signals = voice_signals(&user, Some(&event)).expect("bundle");
        assert_eq!(signals.speaking_pace, SpeakingPace::Fast);
        assert_eq!(signals.vocabulary_richness, 0.8);
        assert_eq!(signals.dominant_emotions, vec!["joy", "curiosity"]);
    }

    #[rstest]
    #[case("Sound engineer by day", BioStyle::Minimal)]
    #[case(
        "I spend my weekends hiking ridges, fixing synths, reading short fiction, \
         and cooking for anyone who will sit still long enough to eat",
        BioStyle::Moderate
    )]
    fn bio_style_follows_word_count(#[case] bio: &str, #[case] style: BioStyle) {
        let user = sample_user(Some(bio), None);
        let signals = bio_signals(&user, 0).expect("bundle");
        assert_eq!(signals.style, style);
        assert_eq!(signals.deletion_rate, 0.0);
    }

    #[test]
    fn bio_expressive_above_eighty_words() {
        let long_bio = ["word"; 85].join(" ");
        let user = sample_user(Some(&long_bio), None);
        let signals = bio_signals(&user, 2).expect("bundle");
        assert_eq!(signals.style, BioStyle::Expressive);
        assert_eq!(signals.edit_count, 2);
        assert_eq!(signals.deletion_rate, 0.3);
    }

    #[test]
    fn bio_absent_without_text() {
        let user = sample_user(None, None);
        assert!(bio_signals(&user, 3).is_none());
    }

    #[test]
    fn messaging_requires_three_messages() {
        assert!(messaging_signals(&[message("hi"), message("hey")]).is_none());
    }

    #[test]
    fn messaging_rates_are_per_message() {
        let messages = vec![
            message("how was your day?"),
            message("mine was busy 😀😀"),
            message("same here honestly"),
            message("what are you reading?"),
        ];
        let signals = messaging_signals(&messages).expect("bundle");
        assert_eq!(signals.message_count, 4);
        assert!((signals.question_rate - 0.5).abs() < 1e-9);
        assert!((signals.emoji_rate - 0.5).abs() < 1e-9);
        assert!(signals.vocabulary_diversity > 0.8);
    }

    #[test]
    fn typing_requires_five_starts() {
        let start = base_time();
        let mut events = Vec::new();
        for burst in 0..4 {
            let at = start + TimeDelta::seconds(burst * 60);
            events.push(event_at(EventType::TypingStarted, at));
            events.push(event_at(EventType::TypingStopped, at + TimeDelta::seconds(3)));
        }
        assert!(typing_signals(&events).is_none());
    }

    #[test]
    fn typing_reports_mean_and_population_deviation() {
        let start = base_time();
        let mut events = Vec::new();
        // Five bursts of 2s, 2s, 2s, 4s, 4s.
        for (burst, seconds) in [2_i64, 2, 2, 4, 4].iter().enumerate() {
            let at = start + TimeDelta::seconds(burst as i64 * 120);
            events.push(event_at(EventType::TypingStarted, at));
            events.push(event_at(
                EventType::TypingStopped,
                at + TimeDelta::seconds(*seconds),
            ));
        }

        let signals = typing_signals(&events).expect("bundle");
        assert!((signals.mean_burst_ms - 2_800.0).abs() < 1e-6);
        // Population std dev of [2000,2000,2000,4000,4000] is ~979.8 ms.
        assert!((signals.cadence_variance_ms - 979.795_897).abs() < 1e-3);
        assert_eq!(signals.burst_count, 5);
    }

    #[test]
    fn sessions_require_three_opens() {
        let events = vec![
            event_at(EventType::AppOpened, base_time()),
            event_at(EventType::AppOpened, base_time() + TimeDelta::hours(1)),
        ];
        assert!(session_signals(&events).is_none());
    }

    #[test]
    fn sessions_normalize_by_busiest_hour() {
        let day = base_time();
        let mut events = Vec::new();
        // Two opens at 09:00, one at 21:00.
        events.push(event_at(EventType::AppOpened, day));
        events.push(event_at(EventType::AppOpened, day + TimeDelta::days(1)));
        events.push(event_at(EventType::AppOpened, day + TimeDelta::hours(12)));
        events.sort_by_key(|event| event.client_ts);

        let signals = session_signals(&events).expect("bundle");
        assert_eq!(signals.hourly_activity[9], 1.0);
        assert_eq!(signals.hourly_activity[21], 0.5);
        assert!((signals.sessions_per_day - 3.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn sessions_mean_duration_from_open_close_pairs() {
        let start = base_time();
        let mut events = Vec::new();
        for (session, minutes) in [10_i64, 20].iter().enumerate() {
            let at = start + TimeDelta::hours(session as i64 * 3);
            events.push(event_at(EventType::AppOpened, at));
            events.push(event_at(
                EventType::AppClosed,
                at + TimeDelta::minutes(*minutes),
            ));
        }
        events.push(event_at(EventType::AppOpened, start + TimeDelta::hours(9)));

        let signals = session_signals(&events).expect("bundle");
        assert!((signals.mean_duration_ms - 900_000.0).abs() < 1e-6);
    }

    #[test]
    fn browsing_requires_three_profile_views() {
        let events = vec![
            event_at(EventType::ProfileViewed, base_time()),
            event_at(EventType::PhotoViewed, base_time()),
        ];
        assert!(browsing_signals(&events).is_none());
    }

    #[test]
    fn browsing_ratios_and_defaults() {
        let session = SessionId::random();
        let mut events: Vec<BehavioralEvent> = (0..4)
            .map(|step| {
                event_at(
                    EventType::ProfileViewed,
                    base_time() + TimeDelta::minutes(step),
                )
            })
            .collect();
        for event in &mut events {
            event.session_id = session;
        }
        for step in 0..6 {
            events.push(event_at(
                EventType::PhotoViewed,
                base_time() + TimeDelta::minutes(10 + step),
            ));
        }

        let signals = browsing_signals(&events).expect("bundle");
        assert!((signals.photo_dwell_ratio - 1.5).abs() < 1e-9);
        assert_eq!(signals.avg_dwell_ms, 8_000.0);
        assert_eq!(signals.bio_read_rate, 0.6);
        assert_eq!(signals.views_per_session, 4.0);
    }
}
