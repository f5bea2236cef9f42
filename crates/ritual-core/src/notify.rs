//! Reminder scheduling contract.
//!
//! Delivery is platform territory; this module owns the contract and the
//! trigger arithmetic. Scheduling is fire-and-forget, always keyed by the
//! routine id, so re-scheduling under the same identifier replaces the
//! pending entry and every routine has at most one reminder outstanding.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::routine::Routine;

/// Everything a scheduler needs to arm one reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRequest {
    /// Routine id; doubles as the scheduler key.
    pub identifier: String,
    pub name: Option<String>,
    pub interval_days: u32,
    pub last_done: Option<DateTime<Utc>>,
}

impl ReminderRequest {
    pub fn for_routine(routine: &Routine) -> Self {
        Self {
            identifier: routine.id.clone(),
            name: Some(routine.name.clone()),
            interval_days: routine.interval_days,
            last_done: routine.last_done,
        }
    }

    /// The single trigger instant: last completion (or `now` if never
    /// completed) plus the interval, truncated to minute granularity.
    pub fn trigger_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let due = self.last_done.unwrap_or(now) + Duration::days(i64::from(self.interval_days));
        due.with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(due)
    }
}

/// Fire-and-forget reminder scheduling, keyed by routine identifier.
pub trait ReminderScheduler: Send + Sync {
    /// Arm (or replace) the pending reminder for `request.identifier`.
    fn schedule(&self, request: ReminderRequest);

    /// Drop any pending or already-delivered reminder for `identifier`.
    fn cancel(&self, identifier: &str);
}

/// In-memory scheduler.
///
/// Backs tests and headless embeddings; the map-per-identifier layout is
/// what gives the replace-on-reschedule guarantee.
#[derive(Debug, Default)]
pub struct MemoryScheduler {
    pending: Mutex<HashMap<String, ReminderRequest>>,
}

impl MemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self, identifier: &str) -> Option<ReminderRequest> {
        self.lock().get(identifier).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ReminderRequest>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReminderScheduler for MemoryScheduler {
    fn schedule(&self, request: ReminderRequest) {
        debug!(identifier = %request.identifier, interval_days = request.interval_days, "reminder armed");
        self.lock().insert(request.identifier.clone(), request);
    }

    fn cancel(&self, identifier: &str) {
        debug!(identifier = %identifier, "reminder cancelled");
        self.lock().remove(identifier);
    }
}
