//! Routine detail state machine.
//!
//! Holds one routine, its completion logs, and the derived urgency
//! fields; owns the edit form and the delete confirmation. Marking done
//! is optimistic: memory updates immediately and is not rolled back if
//! persistence later fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::notify::ReminderRequest;
use crate::routine::urgency::UrgencySummary;
use crate::routine::{sanitize_emoji, CompletionLog, FrequencyUnit, Routine};

/// Snapshot of the routine's editable fields.
///
/// The interval is shown as `(unit, value)` via the lossy decomposition
/// rule; saving composes it back as `value * unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditForm {
    pub name: String,
    pub emoji: String,
    pub frequency_unit: FrequencyUnit,
    pub frequency_value: u32,
}

impl EditForm {
    fn from_routine(routine: &Routine) -> Self {
        let (frequency_unit, frequency_value) = FrequencyUnit::decompose(routine.interval_days);
        Self {
            name: routine.name.clone(),
            emoji: routine.emoji.clone(),
            frequency_unit,
            frequency_value,
        }
    }

    fn interval_days(&self) -> u32 {
        self.frequency_value
            .saturating_mul(self.frequency_unit.multiplier())
            .max(1)
    }
}

/// Per-routine detail state.
pub struct DetailState {
    pub routine: Routine,
    /// Newest first, as loaded from the store.
    pub logs: Vec<CompletionLog>,
    pub urgency: UrgencySummary,
    pub edit: Option<EditForm>,
    pub confirming_delete: bool,
    /// One-shot signal: the caller dismisses the view, then acknowledges
    /// with [`DetailAction::DismissHandled`].
    pub should_dismiss_after_delete: bool,
}

impl DetailState {
    pub fn new(routine: Routine, clock: &dyn Clock) -> Self {
        let urgency = UrgencySummary::compute(
            routine.interval_days,
            routine.last_done,
            &[],
            clock.now(),
        );
        Self {
            routine,
            logs: Vec::new(),
            urgency,
            edit: None,
            confirming_delete: false,
            should_dismiss_after_delete: false,
        }
    }

    fn recompute(&mut self, now: DateTime<Utc>) {
        self.urgency = UrgencySummary::compute(
            self.routine.interval_days,
            self.routine.last_done,
            &self.logs,
            now,
        );
    }
}

#[derive(Debug, Clone)]
pub enum DetailAction {
    /// The view became visible; load this routine's logs.
    Appeared,
    LogsLoaded {
        logs: Vec<CompletionLog>,
        now: DateTime<Utc>,
    },
    LogsLoadFailed {
        message: String,
    },
    MarkDone,
    SetEditSheet(bool),
    EditNameChanged(String),
    EditEmojiChanged(String),
    EditUnitChanged(FrequencyUnit),
    EditValueChanged(u32),
    EditSaved,
    SetDeleteConfirmation(bool),
    DeleteConfirmed,
    /// The store confirmed the delete.
    Deleted,
    DismissHandled,
    SaveFailed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailEffect {
    LoadLogs {
        routine_id: String,
    },
    /// Persist `last_done`, append the log, reload logs, schedule the
    /// next reminder. One composite store round-trip.
    PersistCompletion {
        routine: Routine,
        log: CompletionLog,
    },
    /// Persist name/emoji/interval. Never touches `last_done` or logs.
    PersistRoutine {
        routine: Routine,
    },
    ScheduleReminder {
        request: ReminderRequest,
    },
    /// Delete the routine and all its logs.
    DeleteRoutine {
        routine_id: String,
    },
    CancelReminder {
        identifier: String,
    },
}

/// Apply one action; returns the effects to execute.
pub fn reduce(
    state: &mut DetailState,
    action: DetailAction,
    clock: &dyn Clock,
) -> Vec<DetailEffect> {
    match action {
        DetailAction::Appeared => vec![DetailEffect::LoadLogs {
            routine_id: state.routine.id.clone(),
        }],
        DetailAction::LogsLoaded { logs, now } => {
            state.logs = logs;
            state.recompute(now);
            Vec::new()
        }
        DetailAction::LogsLoadFailed { message } => {
            // Stale-but-available: whatever was on screen stays.
            debug!(%message, routine = %state.routine.id, "log load failed");
            Vec::new()
        }
        DetailAction::MarkDone => {
            let now = clock.now();
            state.routine.last_done = Some(now);
            state.recompute(now);
            let log = CompletionLog::new(&state.routine.id, now);
            vec![DetailEffect::PersistCompletion {
                routine: state.routine.clone(),
                log,
            }]
        }
        DetailAction::SetEditSheet(open) => {
            state.edit = open.then(|| EditForm::from_routine(&state.routine));
            Vec::new()
        }
        DetailAction::EditNameChanged(name) => {
            if let Some(form) = &mut state.edit {
                form.name = name;
            }
            Vec::new()
        }
        DetailAction::EditEmojiChanged(input) => {
            if let Some(form) = &mut state.edit {
                // Empty input keeps the previous glyph.
                if let Some(emoji) = sanitize_emoji(&input) {
                    form.emoji = emoji;
                }
            }
            Vec::new()
        }
        DetailAction::EditUnitChanged(unit) => {
            if let Some(form) = &mut state.edit {
                form.frequency_unit = unit;
            }
            Vec::new()
        }
        DetailAction::EditValueChanged(value) => {
            if let Some(form) = &mut state.edit {
                form.frequency_value = value;
            }
            Vec::new()
        }
        DetailAction::EditSaved => {
            let Some(form) = state.edit.clone() else {
                return Vec::new();
            };
            let name = form.name.trim();
            if name.is_empty() {
                // Silently ignored; the sheet stays open.
                debug!(routine = %state.routine.id, "edit save rejected: empty name");
                return Vec::new();
            }
            state.routine.name = name.to_string();
            state.routine.emoji = form.emoji.clone();
            state.routine.interval_days = form.interval_days();
            state.recompute(clock.now());
            state.edit = None;
            vec![
                DetailEffect::PersistRoutine {
                    routine: state.routine.clone(),
                },
                DetailEffect::ScheduleReminder {
                    request: ReminderRequest::for_routine(&state.routine),
                },
            ]
        }
        DetailAction::SetDeleteConfirmation(confirming) => {
            state.confirming_delete = confirming;
            Vec::new()
        }
        DetailAction::DeleteConfirmed => {
            state.confirming_delete = false;
            vec![
                DetailEffect::DeleteRoutine {
                    routine_id: state.routine.id.clone(),
                },
                DetailEffect::CancelReminder {
                    identifier: state.routine.id.clone(),
                },
            ]
        }
        DetailAction::Deleted => {
            state.should_dismiss_after_delete = true;
            state.edit = None;
            Vec::new()
        }
        DetailAction::DismissHandled => {
            state.should_dismiss_after_delete = false;
            Vec::new()
        }
        DetailAction::SaveFailed { message } => {
            // Optimistic state stays as-is; the failure is only logged.
            debug!(%message, routine = %state.routine.id, "persist failed");
            Vec::new()
        }
    }
}
