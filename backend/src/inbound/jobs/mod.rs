//! Scheduled and event-triggered job handlers.
//!
//! The external scheduler owns cron firing and event delivery; this module
//! exposes the registrations it needs plus the handlers it invokes. Retries
//! live here, not in the engines, so synchronous RPC callers never pay for
//! them.

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::domain::runtime::Sleeper;
use crate::domain::{CoreResult, Error};

mod account;
mod rebuild;
mod sweep;

pub use account::{AccountCleanupJob, AccountDeletedEvent};
pub use rebuild::{DailyRebuildJob, RebuildSummary, VoiceNoteRebuildJob, VoiceNoteUploadedEvent};
pub use sweep::HealthSweepJob;

/// Event published when a profile rebuild lands; consumed by downstream
/// listeners the scheduler fans out to.
pub const PROFILE_REBUILT_EVENT: &str = "resonate/profile-rebuilt";

/// One scheduler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSpec {
    /// Stable registration id.
    pub id: &'static str,
    /// Cron schedule in the scheduler's five-field syntax, if any.
    pub cron: Option<&'static str>,
    /// Event trigger name, if any.
    pub event: Option<&'static str>,
}

/// Every registration the core expects the scheduler to install.
pub fn job_specs() -> [JobSpec; 4] {
    [
        JobSpec {
            id: "profiles/daily-rebuild",
            cron: Some("0 3 * * *"),
            event: None,
        },
        JobSpec {
            id: "profiles/voice-note-rebuild",
            cron: None,
            event: Some("resonate/voice-note-uploaded"),
        },
        JobSpec {
            id: "conversations/health-sweep",
            cron: Some("0 */4 * * *"),
            event: None,
        },
        JobSpec {
            id: "accounts/deletion-cleanup",
            cron: None,
            event: Some("resonate/account-deleted"),
        },
    ]
}

/// Re-run `operation` on retryable failures, up to `max_attempts` total.
///
/// Backoff doubles per attempt starting at one second; non-retryable errors
/// surface immediately.
pub(crate) async fn with_retries<T, F, Fut>(
    max_attempts: u32,
    sleeper: &Arc<dyn Sleeper>,
    label: &str,
    mut operation: F,
) -> CoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < max_attempts => {
                warn!(label, attempt, %error, "retrying failed job step");
                let backoff = std::time::Duration::from_secs(1 << (attempt - 1).min(5));
                sleeper.sleep(backoff).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

pub(crate) fn internal(error: impl std::fmt::Display) -> Error {
    Error::internal(error.to_string())
}
