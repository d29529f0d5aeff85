//! Behavioural event ingestion: `events.track`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ports::{EventRepository, UserRepository};
use crate::domain::{
    BehavioralEvent, CoreResult, Error, EventType, SessionId,
};

use super::AuthContext;

/// Largest accepted batch per call.
const MAX_BATCH: usize = 100;

/// One client-submitted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEvent {
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_data: Option<Value>,
    pub client_ts: DateTime<Utc>,
}

/// Event ingestion handler.
pub struct EventsRpc {
    events: Arc<dyn EventRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl EventsRpc {
    pub fn new(
        events: Arc<dyn EventRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            events,
            users,
            clock,
        }
    }

    /// Append a batch of events for the caller's session.
    ///
    /// Returns the number of events accepted. Any tracked batch also counts
    /// as user activity, so `last_active_at` is bumped alongside.
    pub async fn track(
        &self,
        ctx: &AuthContext,
        session_id: SessionId,
        events: Vec<TrackedEvent>,
    ) -> CoreResult<usize> {
        let user_id = ctx.require_user()?;
        if events.is_empty() {
            return Ok(0);
        }
        if events.len() > MAX_BATCH {
            return Err(Error::invalid_request(format!(
                "at most {MAX_BATCH} events per call, got {}",
                events.len()
            )));
        }

        let server_ts = self.clock.utc();
        let records: Vec<BehavioralEvent> = events
            .into_iter()
            .map(|event| BehavioralEvent {
                user_id,
                session_id,
                event_type: event.event_type,
                event_data: event.event_data,
                client_ts: event.client_ts,
                server_ts,
            })
            .collect();

        let accepted = self
            .events
            .record_batch(&records)
            .await
            .map_err(|error| Error::internal(error.to_string()))?;

        self.users
            .touch_last_active(user_id, server_ts)
            .await
            .map_err(|error| Error::internal(error.to_string()))?;

        Ok(accepted)
    }
}
