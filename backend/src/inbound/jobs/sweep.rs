//! Scheduled conversation health sweep.

use std::sync::Arc;

use crate::domain::conversation_health::{HealthMonitor, SweepSummary};
use crate::domain::runtime::Sleeper;
use crate::domain::CoreResult;

use super::with_retries;

/// Four-hourly sweep wrapper adding the scheduler-facing retry policy.
pub struct HealthSweepJob {
    monitor: Arc<HealthMonitor>,
    sleeper: Arc<dyn Sleeper>,
    retries: u32,
}

impl HealthSweepJob {
    pub fn new(monitor: Arc<HealthMonitor>, sleeper: Arc<dyn Sleeper>, retries: u32) -> Self {
        Self {
            monitor,
            sleeper,
            retries,
        }
    }

    /// Run one sweep, retrying only wholesale transient failures; individual
    /// conversations are already handled inside the monitor.
    pub async fn run(&self) -> CoreResult<SweepSummary> {
        with_retries(self.retries, &self.sleeper, "health sweep", || {
            self.monitor.sweep()
        })
        .await
    }
}
