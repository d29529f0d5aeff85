//! Behaviour coverage for the health monitor service.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::domain::config::{HealthSweepConfig, IoDeadline, RateLimitConfig};
use crate::domain::ports::{
    GenerativeClientError, MockCompletionClient, MockConversationRepository,
    MockMessageRepository, MockProfileRepository,
};
use crate::domain::runtime::SlidingWindowLimiter;
use crate::domain::{
    Conversation, ConversationId, HealthState, MatchId, Message, MessageContentType, UserId,
};
use crate::test_support::{ImmediateSleeper, MutableClock};

use super::{HealthMonitor, HealthMonitorPorts};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0)
        .single()
        .expect("valid instant")
}

fn clock() -> Arc<MutableClock> {
    Arc::new(MutableClock::new(start()))
}

fn limiter(clock: Arc<MutableClock>) -> Arc<SlidingWindowLimiter> {
    Arc::new(SlidingWindowLimiter::new(
        RateLimitConfig::default(),
        clock,
        Arc::new(ImmediateSleeper),
    ))
}

fn conversation(state: HealthState, last_message_at: DateTime<Utc>) -> Conversation {
    Conversation {
        id: ConversationId::random(),
        match_id: MatchId::random(),
        last_message_at: Some(last_message_at),
        health_state: state,
        pending_nudge: None,
        nudge_generated_at: None,
        archived_by_a: false,
        archived_by_b: false,
    }
}

fn message(
    conversation_id: ConversationId,
    sender: UserId,
    sent_at: DateTime<Utc>,
    content: &str,
) -> Message {
    Message {
        conversation_id,
        sender_id: Some(sender),
        content: content.to_owned(),
        content_type: MessageContentType::Text,
        sentiment: None,
        emotion_tag: None,
        sent_at,
        read_at: None,
        deleted_at: None,
    }
}

/// Twenty messages whose reply latency doubles, length halves, and whose
/// sessions are all opened by one side.
fn cooling_history(
    conversation_id: ConversationId,
    a: UserId,
    b: UserId,
    now: DateTime<Utc>,
) -> Vec<Message> {
    let mut messages = Vec::new();
    let mut at = now - TimeDelta::hours(40);
    for index in 0..20_usize {
        let sender = if index % 5 == 0 {
            a
        } else if index % 2 == 0 {
            a
        } else {
            b
        };
        let content = if index < 10 {
            "a generously detailed update about the day and its small wins"
        } else {
            "ok"
        };
        let gap = if index < 10 {
            TimeDelta::minutes(5)
        } else {
            TimeDelta::minutes(100)
        };
        at += gap;
        messages.push(message(conversation_id, sender, at, content));
    }
    messages.reverse();
    messages
}

fn empty_profiles() -> MockProfileRepository {
    let mut profiles = MockProfileRepository::new();
    profiles.expect_find_many().returning(|_| Ok(Vec::new()));
    profiles
}

fn monitor(
    conversations: MockConversationRepository,
    messages: MockMessageRepository,
    profiles: MockProfileRepository,
    completions: MockCompletionClient,
) -> HealthMonitor {
    let clock = clock();
    HealthMonitor::new(
        HealthMonitorPorts {
            conversations: Arc::new(conversations),
            messages: Arc::new(messages),
            profiles: Arc::new(profiles),
            completions: Arc::new(completions),
        },
        limiter(clock.clone()),
        clock,
        HealthSweepConfig::default(),
        IoDeadline::default(),
    )
}

#[tokio::test]
async fn four_silent_days_force_dormant() {
    let now = start();
    let convo = conversation(HealthState::Active, now - TimeDelta::days(4));
    let convo_id = convo.id;

    let mut conversations = MockConversationRepository::new();
    conversations
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(convo)));
    conversations
        .expect_update_health()
        .withf(move |id, state, nudge| {
            *id == convo_id && *state == HealthState::Dormant && nudge.is_none()
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let mut messages = MockMessageRepository::new();
    messages
        .expect_recent_in_conversation()
        .returning(|_, _| Ok(Vec::new()));

    let monitor = monitor(
        conversations,
        messages,
        MockProfileRepository::new(),
        MockCompletionClient::new(),
    );

    let report = monitor.analyze(convo_id).await.expect("analysis");
    assert_eq!(report.new_state, HealthState::Dormant);
    assert!(!report.nudge_generated);
}

#[tokio::test]
async fn cooling_transition_nudges_the_quiet_party() {
    let now = start();
    let user_a = UserId::random();
    let user_b = UserId::random();
    let convo = conversation(HealthState::Active, now - TimeDelta::hours(6));
    let convo_id = convo.id;
    let history = cooling_history(convo_id, user_a, user_b, now);

    let mut conversations = MockConversationRepository::new();
    conversations
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(convo)));
    conversations
        .expect_participants()
        .return_once(move |_| Ok(Some((user_a, user_b))));
    conversations
        .expect_update_health()
        .withf(move |id, state, nudge| {
            *id == convo_id
                && *state == HealthState::Cooling
                && nudge
                    .as_ref()
                    .is_some_and(|nudge| nudge.text == "What trail are you eyeing next?")
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let mut messages = MockMessageRepository::new();
    messages
        .expect_recent_in_conversation()
        .return_once(move |_, _| Ok(history));

    let mut completions = MockCompletionClient::new();
    completions
        .expect_complete()
        .withf(|system, user, params| {
            system.contains("conversation catalyst")
                && user.contains("Recent messages")
                && params.max_output_tokens == 500
        })
        .times(1)
        .returning(|_, _, _| Ok("  What trail are you eyeing next?  ".to_owned()));

    let monitor = monitor(conversations, messages, empty_profiles(), completions);

    let report = monitor.analyze(convo_id).await.expect("analysis");
    assert_eq!(report.previous_state, HealthState::Active);
    assert_eq!(report.new_state, HealthState::Cooling);
    assert!(report.nudge_generated);
}

#[tokio::test]
async fn completion_failure_still_persists_the_transition() {
    let now = start();
    let user_a = UserId::random();
    let user_b = UserId::random();
    let convo = conversation(HealthState::Active, now - TimeDelta::hours(6));
    let convo_id = convo.id;
    let history = cooling_history(convo_id, user_a, user_b, now);

    let mut conversations = MockConversationRepository::new();
    conversations
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(convo)));
    conversations
        .expect_participants()
        .return_once(move |_| Ok(Some((user_a, user_b))));
    conversations
        .expect_update_health()
        .withf(move |id, state, nudge| {
            *id == convo_id && *state == HealthState::Cooling && nudge.is_none()
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let mut messages = MockMessageRepository::new();
    messages
        .expect_recent_in_conversation()
        .return_once(move |_, _| Ok(history));

    let mut completions = MockCompletionClient::new();
    completions
        .expect_complete()
        .returning(|_, _, _| Err(GenerativeClientError::upstream("model overloaded")));

    let monitor = monitor(conversations, messages, empty_profiles(), completions);

    let report = monitor.analyze(convo_id).await.expect("analysis");
    assert_eq!(report.new_state, HealthState::Cooling);
    assert!(!report.nudge_generated);
}

#[tokio::test]
async fn unchanged_state_skips_the_write() {
    let now = start();
    let convo = conversation(HealthState::Active, now - TimeDelta::hours(1));
    let convo_id = convo.id;

    let mut conversations = MockConversationRepository::new();
    conversations
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(convo)));
    conversations.expect_update_health().times(0);

    let mut messages = MockMessageRepository::new();
    // Too few messages for any signal: everything reads neutral, the state
    // holds, and no row write happens.
    messages
        .expect_recent_in_conversation()
        .returning(|_, _| Ok(Vec::new()));

    let monitor = monitor(
        conversations,
        messages,
        MockProfileRepository::new(),
        MockCompletionClient::new(),
    );

    let report = monitor.analyze(convo_id).await.expect("analysis");
    assert_eq!(report.new_state, HealthState::Active);
}

#[tokio::test]
async fn sweep_counts_buckets_and_swallows_failures() {
    let now = start();
    let active = conversation(HealthState::Active, now - TimeDelta::hours(1));
    let stale = conversation(HealthState::Active, now - TimeDelta::days(5));
    let missing = conversation(HealthState::Warming, now - TimeDelta::hours(2));
    let (active_id, stale_id, missing_id) = (active.id, stale.id, missing.id);

    let mut conversations = MockConversationRepository::new();
    let listing = vec![active.clone(), stale.clone(), missing.clone()];
    conversations
        .expect_list_with_messages_since()
        .return_once(move |_| Ok(listing));
    conversations.expect_find_by_id().returning(move |id| {
        if id == active_id {
            Ok(Some(active.clone()))
        } else if id == stale_id {
            Ok(Some(stale.clone()))
        } else {
            // The row vanished between listing and analysis.
            Ok(None)
        }
    });
    conversations
        .expect_update_health()
        .withf(move |id, state, _| *id == stale_id && *state == HealthState::Dormant)
        .times(1)
        .returning(|_, _, _| Ok(()));

    let mut messages = MockMessageRepository::new();
    messages
        .expect_recent_in_conversation()
        .returning(|_, _| Ok(Vec::new()));

    let monitor = monitor(
        conversations,
        messages,
        MockProfileRepository::new(),
        MockCompletionClient::new(),
    );

    let summary = monitor.sweep().await.expect("sweep");
    assert_eq!(summary.total, 3);
    assert_eq!(summary.healthy, 1);
    assert_eq!(summary.dormant, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.nudges_generated, 0);
    let _ = missing_id;
}
