//! The five conversation-vitality signal extractors.
//!
//! All extractors take the most recent messages ordered newest-first (the
//! repository's native order) and window themselves as needed. Trend signals
//! live in `[-1, 1]`; ratio signals live in `[0, 1]`.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::domain::{Message, UserId};

/// Message window per signal.
const LATENCY_WINDOW: usize = 50;
const LENGTH_WINDOW: usize = 50;
const SENTIMENT_WINDOW: usize = 30;
const INITIATIVE_WINDOW: usize = 100;
const DIVERSITY_WINDOW: usize = 30;

/// Gap that starts a new messaging session.
const SESSION_GAP_HOURS: i64 = 2;

/// The five signals for one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSignals {
    /// Positive when replies are speeding up.
    pub latency_trend: f64,
    /// Positive when messages are getting longer.
    pub length_trend: f64,
    /// Positive when sentiment is improving.
    pub sentiment_trajectory: f64,
    /// Balance of who starts sessions; 1 is perfectly mutual.
    pub initiative_ratio: f64,
    /// Lexical variety of the recent conversation.
    pub topic_diversity: f64,
}

impl HealthSignals {
    /// Compute all five signals over a newest-first message window.
    pub fn extract(messages_desc: &[Message]) -> Self {
        Self {
            latency_trend: latency_trend(messages_desc),
            length_trend: length_trend(messages_desc),
            sentiment_trajectory: sentiment_trajectory(messages_desc),
            initiative_ratio: initiative_ratio(messages_desc),
            topic_diversity: topic_diversity(messages_desc),
        }
    }

    /// Weighted remap of the signals onto `[0, 100]`.
    pub fn overall_health(&self) -> u8 {
        let score = (self.latency_trend + 1.0) / 2.0 * 25.0
            + (self.length_trend + 1.0) / 2.0 * 20.0
            + (self.sentiment_trajectory + 1.0) / 2.0 * 20.0
            + self.initiative_ratio * 20.0
            + self.topic_diversity * 15.0;
        score.round().clamp(0.0, 100.0) as u8
    }
}

fn chronological(messages_desc: &[Message], window: usize) -> Vec<&Message> {
    let mut window: Vec<&Message> = messages_desc.iter().take(window).collect();
    window.reverse();
    window
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Split a chronological series at its midpoint into (older, recent) means.
fn midpoint_means(series: &[f64]) -> (f64, f64) {
    let mid = series.len() / 2;
    (mean(&series[..mid]), mean(&series[mid..]))
}

/// Response-latency trend: positive when recent replies arrive faster.
pub fn latency_trend(messages_desc: &[Message]) -> f64 {
    let window = chronological(messages_desc, LATENCY_WINDOW);
    if window.len() < 4 {
        return 0.0;
    }

    let mut gaps_ms = Vec::new();
    for pair in window.windows(2) {
        let (previous, current) = (pair[0], pair[1]);
        let (Some(a), Some(b)) = (previous.sender_id, current.sender_id) else {
            continue;
        };
        if a != b {
            let gap = (current.sent_at - previous.sent_at).num_milliseconds();
            gaps_ms.push(gap.max(0) as f64);
        }
    }
    if gaps_ms.len() < 3 {
        return 0.0;
    }

    let (older, recent) = midpoint_means(&gaps_ms);
    if older <= 0.0 {
        return 0.0;
    }
    (1.0 - recent / older).clamp(-1.0, 1.0)
}

/// Message-length trend: positive when messages are growing.
pub fn length_trend(messages_desc: &[Message]) -> f64 {
    let window = chronological(messages_desc, LENGTH_WINDOW);
    if window.len() < 6 {
        return 0.0;
    }

    let lengths: Vec<f64> = window
        .iter()
        .map(|message| message.content.chars().count() as f64)
        .collect();
    let (older, recent) = midpoint_means(&lengths);
    if older <= 0.0 {
        return 0.0;
    }
    (recent / older - 1.0).clamp(-1.0, 1.0)
}

/// Sentiment trajectory over the scored messages only.
pub fn sentiment_trajectory(messages_desc: &[Message]) -> f64 {
    let scored: Vec<f64> = {
        let mut scored: Vec<f64> = messages_desc
            .iter()
            .filter_map(|message| message.sentiment)
            .take(SENTIMENT_WINDOW)
            .collect();
        scored.reverse();
        scored
    };
    if scored.len() < 4 {
        return 0.0;
    }

    let (older, recent) = midpoint_means(&scored);
    (recent - older).clamp(-1.0, 1.0)
}

/// Initiative balance: who starts messaging sessions.
pub fn initiative_ratio(messages_desc: &[Message]) -> f64 {
    let window = chronological(messages_desc, INITIATIVE_WINDOW);

    let mut starts: std::collections::HashMap<UserId, usize> = std::collections::HashMap::new();
    let mut previous_sent = None;
    for message in &window {
        let is_start = match previous_sent {
            None => true,
            Some(previous) => {
                message.sent_at - previous > TimeDelta::hours(SESSION_GAP_HOURS)
            }
        };
        if is_start {
            if let Some(sender) = message.sender_id {
                *starts.entry(sender).or_default() += 1;
            }
        }
        previous_sent = Some(message.sent_at);
    }

    match starts.len() {
        0 => 0.5,
        1 => 0.2,
        _ => {
            let min = starts.values().copied().min().unwrap_or(0) as f64;
            let max = starts.values().copied().max().unwrap_or(1) as f64;
            min / max
        }
    }
}

/// Lexical variety over tokens longer than three characters.
pub fn topic_diversity(messages_desc: &[Message]) -> f64 {
    let window = chronological(messages_desc, DIVERSITY_WINDOW);
    if window.len() < 5 {
        return 0.5;
    }

    let mut total = 0_usize;
    let mut unique = std::collections::HashSet::new();
    for message in &window {
        for token in message.content.split_whitespace() {
            if token.chars().count() > 3 {
                total += 1;
                unique.insert(token.to_lowercase());
            }
        }
    }
    if total == 0 {
        return 0.0;
    }

    let raw = unique.len() as f64 / total as f64;
    ((raw - 0.2) / 0.5).clamp(0.0, 1.0)
}
