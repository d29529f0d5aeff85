//! Conversation health monitoring.
//!
//! Five trend signals drive a per-conversation state machine; a transition
//! into `cooling` additionally asks the completion upstream for a nudge
//! aimed at the quieter participant. The batch driver sweeps every
//! conversation with recent traffic.

use std::sync::Arc;

use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::ports::{
    CompletionClient, CompletionParams, ConversationRepository, MessageRepository, NudgeUpdate,
    ProfileRepository,
};
use crate::domain::runtime::{SlidingWindowLimiter, with_deadline};
use crate::domain::{
    Conversation, ConversationId, CoreResult, Error, HealthState, Message, ResonanceProfile,
    UserId, config::{HealthSweepConfig, IoDeadline},
};

mod nudge;
mod signals;
mod state;

pub use nudge::{NUDGE_SYSTEM_PROMPT, build_user_prompt, quiet_party};
pub use signals::{
    HealthSignals, initiative_ratio, latency_trend, length_trend, sentiment_trajectory,
    topic_diversity,
};
pub use state::next_state;

/// Message window fetched per analysis; covers every signal's needs.
const ANALYSIS_WINDOW: usize = 100;

/// Outcome of analysing one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub conversation_id: ConversationId,
    pub previous_state: HealthState,
    pub new_state: HealthState,
    /// Composite vitality in `[0, 100]`.
    pub health_score: u8,
    pub signals: HealthSignals,
    pub nudge_generated: bool,
}

/// Aggregate counters reported by the batch sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub total: usize,
    pub healthy: usize,
    pub cooling: usize,
    pub dormant: usize,
    pub nudges_generated: usize,
    pub failed: usize,
}

/// Port bundle required by the health monitor.
pub struct HealthMonitorPorts {
    pub conversations: Arc<dyn ConversationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub completions: Arc<dyn CompletionClient>,
}

/// Per-conversation analyser plus batch driver.
pub struct HealthMonitor {
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
    profiles: Arc<dyn ProfileRepository>,
    completions: Arc<dyn CompletionClient>,
    limiter: Arc<SlidingWindowLimiter>,
    clock: Arc<dyn Clock>,
    config: HealthSweepConfig,
    deadline: IoDeadline,
}

impl HealthMonitor {
    pub fn new(
        ports: HealthMonitorPorts,
        limiter: Arc<SlidingWindowLimiter>,
        clock: Arc<dyn Clock>,
        config: HealthSweepConfig,
        deadline: IoDeadline,
    ) -> Self {
        Self {
            conversations: ports.conversations,
            messages: ports.messages,
            profiles: ports.profiles,
            completions: ports.completions,
            limiter,
            clock,
            config,
            deadline,
        }
    }

    /// Analyse one conversation and persist any state change.
    pub async fn analyze(&self, conversation_id: ConversationId) -> CoreResult<HealthReport> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await
            .map_err(|error| Error::internal(error.to_string()))?
            .ok_or_else(|| {
                Error::not_found(format!("conversation {conversation_id} does not exist"))
            })?;

        let messages = self
            .messages
            .recent_in_conversation(conversation_id, ANALYSIS_WINDOW)
            .await
            .map_err(|error| Error::internal(error.to_string()))?;

        let signals = HealthSignals::extract(&messages);
        let now = self.clock.utc();
        let previous_state = conversation.health_state;
        let new_state = next_state(
            previous_state,
            conversation.days_since_last_message(now),
            &signals,
        );

        let nudge = if new_state == HealthState::Cooling && previous_state != HealthState::Cooling
        {
            self.generate_nudge(&conversation, &messages).await
        } else {
            None
        };
        let nudge_generated = nudge.is_some();

        if new_state != previous_state {
            self.conversations
                .update_health(conversation_id, new_state, nudge)
                .await
                .map_err(|error| Error::internal(error.to_string()))?;
        }

        Ok(HealthReport {
            conversation_id,
            previous_state,
            new_state,
            health_score: signals.overall_health(),
            signals,
            nudge_generated,
        })
    }

    /// Sweep every conversation with traffic inside the configured window.
    ///
    /// Per-conversation failures are logged and counted, never fatal.
    pub async fn sweep(&self) -> CoreResult<SweepSummary> {
        let cutoff = self.clock.utc() - chrono::TimeDelta::days(self.config.sweep_window_days);
        let conversations = self
            .conversations
            .list_with_messages_since(cutoff)
            .await
            .map_err(|error| Error::internal(error.to_string()))?;

        let mut summary = SweepSummary::default();
        for conversation in conversations {
            summary.total += 1;
            match self.analyze(conversation.id).await {
                Ok(report) => {
                    match report.new_state {
                        HealthState::Cooling => summary.cooling += 1,
                        HealthState::Dormant => summary.dormant += 1,
                        _ => summary.healthy += 1,
                    }
                    if report.nudge_generated {
                        summary.nudges_generated += 1;
                    }
                }
                Err(error) => {
                    warn!(conversation = %conversation.id, %error, "health sweep skipped conversation");
                    summary.failed += 1;
                }
            }
        }

        info!(
            total = summary.total,
            healthy = summary.healthy,
            cooling = summary.cooling,
            dormant = summary.dormant,
            nudges_generated = summary.nudges_generated,
            failed = summary.failed,
            "conversation health sweep finished"
        );
        Ok(summary)
    }

    /// Best-effort nudge generation; failures leave the transition intact.
    async fn generate_nudge(
        &self,
        conversation: &Conversation,
        messages: &[Message],
    ) -> Option<NudgeUpdate> {
        match self.try_generate_nudge(conversation, messages).await {
            Ok(update) => Some(update),
            Err(error) => {
                warn!(
                    conversation = %conversation.id,
                    %error,
                    "nudge generation failed; persisting transition without one"
                );
                None
            }
        }
    }

    async fn try_generate_nudge(
        &self,
        conversation: &Conversation,
        messages: &[Message],
    ) -> CoreResult<NudgeUpdate> {
        let (user_a, user_b) = self
            .conversations
            .participants(conversation.id)
            .await
            .map_err(|error| Error::internal(error.to_string()))?
            .ok_or_else(|| {
                Error::not_found(format!("no match behind conversation {}", conversation.id))
            })?;

        let quiet = quiet_party(messages, user_a, user_b);
        let other = if quiet == user_a { user_b } else { user_a };

        let profiles = self
            .profiles
            .find_many(&[quiet, other])
            .await
            .map_err(|error| Error::internal(error.to_string()))?;
        let profile_of = |user: UserId| -> ResonanceProfile {
            profiles
                .iter()
                .find(|profile| profile.user_id == user)
                .cloned()
                .unwrap_or_else(|| {
                    ResonanceProfile::empty(
                        user,
                        self.clock.utc(),
                        crate::domain::profile_builder::MODEL_VERSION,
                    )
                })
        };

        let user_prompt = build_user_prompt(&profile_of(quiet), &profile_of(other), messages);

        self.limiter.acquire().await;
        let completion = with_deadline(self.deadline.0, "nudge completion", async {
            self.completions
                .complete(NUDGE_SYSTEM_PROMPT, &user_prompt, CompletionParams::default())
                .await
                .map_err(|error| Error::upstream(error.to_string()))
        })
        .await?;

        let text = completion.trim().to_owned();
        if text.is_empty() {
            return Err(Error::upstream("completion returned an empty nudge"));
        }

        debug!(conversation = %conversation.id, target = %quiet, "generated nudge");
        Ok(NudgeUpdate {
            text,
            generated_at: self.clock.utc(),
        })
    }
}

#[cfg(test)]
mod tests;
