//! Port for behavioural-event reads and appends.

use async_trait::async_trait;

use crate::domain::{BehavioralEvent, EventType, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by event repository adapters.
    pub enum EventRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "event repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "event repository query failed: {message}",
    }
}

/// Port for the append-only behavioural event log.
///
/// Events are immutable once recorded; reads are always ordered by client
/// timestamp ascending so aggregators can pair start/stop markers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Append a batch of events. Returns the number accepted.
    async fn record_batch(
        &self,
        events: &[BehavioralEvent],
    ) -> Result<usize, EventRepositoryError>;

    /// The most recent event of `event_type` for the user, by client
    /// timestamp.
    async fn latest_of_type(
        &self,
        user_id: UserId,
        event_type: &EventType,
    ) -> Result<Option<BehavioralEvent>, EventRepositoryError>;

    /// All events for the user whose type is in `event_types`, ascending by
    /// client timestamp, bounded to `limit`.
    async fn list_for_user(
        &self,
        user_id: UserId,
        event_types: &[EventType],
        limit: usize,
    ) -> Result<Vec<BehavioralEvent>, EventRepositoryError>;
}

/// Fixture implementation for tests that never read events.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEventRepository;

#[async_trait]
impl EventRepository for FixtureEventRepository {
    async fn record_batch(
        &self,
        events: &[BehavioralEvent],
    ) -> Result<usize, EventRepositoryError> {
        Ok(events.len())
    }

    async fn latest_of_type(
        &self,
        _user_id: UserId,
        _event_type: &EventType,
    ) -> Result<Option<BehavioralEvent>, EventRepositoryError> {
        Ok(None)
    }

    async fn list_for_user(
        &self,
        _user_id: UserId,
        _event_types: &[EventType],
        _limit: usize,
    ) -> Result<Vec<BehavioralEvent>, EventRepositoryError> {
        Ok(Vec::new())
    }
}
