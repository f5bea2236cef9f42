//! Routine and completion-log model types.

pub mod urgency;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Fallback glyph for routines created without an emoji.
pub const DEFAULT_EMOJI: &str = "📌";

/// A recurring task with a fixed day interval.
///
/// `last_done` is `None` for a routine that has never been completed.
/// `interval_days` is clamped to at least 1 at every construction and
/// edit path; downstream arithmetic divides by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    /// Unique identifier, immutable after creation.
    pub id: String,
    pub name: String,
    /// Single-glyph display string, never empty once persisted.
    pub emoji: String,
    pub interval_days: u32,
    #[serde(default)]
    pub last_done: Option<DateTime<Utc>>,
}

impl Routine {
    /// Create a new routine that has never been completed.
    ///
    /// The interval is clamped to at least one day and an empty emoji
    /// falls back to [`DEFAULT_EMOJI`].
    pub fn new(name: &str, interval_days: u32, emoji: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            emoji: sanitize_emoji(emoji).unwrap_or_else(|| DEFAULT_EMOJI.to_string()),
            interval_days: interval_days.max(1),
            last_done: None,
        }
    }
}

/// One completion event for a routine. Append-only: a log is never
/// mutated, and is destroyed only when its parent routine is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionLog {
    pub id: String,
    /// Foreign key to the routine, by value rather than ownership.
    pub routine_id: String,
    pub completed_at: DateTime<Utc>,
}

impl CompletionLog {
    pub fn new(routine_id: &str, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            routine_id: routine_id.to_string(),
            completed_at,
        }
    }
}

/// Unit shown in the edit form for a routine's interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyUnit {
    Day,
    Week,
    Month,
}

impl FrequencyUnit {
    /// Days represented by one unit.
    pub fn multiplier(self) -> u32 {
        match self {
            FrequencyUnit::Day => 1,
            FrequencyUnit::Week => 7,
            FrequencyUnit::Month => 30,
        }
    }

    /// Split an interval into `(unit, value)` for display.
    ///
    /// Divisible by 30 reads as months, else divisible by 7 as weeks,
    /// else as raw days. The split is lossy on purpose: 30 days always
    /// reads back as "1 month", never "30 days".
    pub fn decompose(interval_days: u32) -> (FrequencyUnit, u32) {
        if interval_days % 30 == 0 {
            (FrequencyUnit::Month, interval_days / 30)
        } else if interval_days % 7 == 0 {
            (FrequencyUnit::Week, interval_days / 7)
        } else {
            (FrequencyUnit::Day, interval_days)
        }
    }
}

impl Default for FrequencyUnit {
    fn default() -> Self {
        FrequencyUnit::Day
    }
}

/// Trim whitespace and keep exactly the first remaining character.
///
/// Returns `None` when nothing remains; callers keep their previous
/// value in that case so an empty emoji is never committed.
pub fn sanitize_emoji(input: &str) -> Option<String> {
    input.trim().chars().next().map(|c| c.to_string())
}

/// Guard for the create path: non-empty trimmed name, interval >= 1.
pub fn validate_new_routine(name: &str, interval_days: u32) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if interval_days < 1 {
        return Err(ValidationError::InvalidInterval(interval_days));
    }
    Ok(())
}
