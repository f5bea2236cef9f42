//! Effect execution.
//!
//! The reducers describe work; this module performs it against the real
//! collaborators and feeds the result back as a follow-up action. Store
//! failures are logged and swallowed here (no retries, no rollback of
//! optimistic state), matching the machines' failure policy.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::notify::{ReminderRequest, ReminderScheduler};
use crate::state::detail::{self, DetailAction, DetailEffect, DetailState};
use crate::state::list::{self, ListAction, ListEffect, ListState};
use crate::storage::{Config, Database};

/// Executes state-machine effects against the store, the reminder
/// scheduler, and the clock.
pub struct EffectRunner<'a> {
    db: &'a Database,
    reminders: &'a dyn ReminderScheduler,
    clock: &'a dyn Clock,
    config: &'a Config,
}

impl<'a> EffectRunner<'a> {
    pub fn new(
        db: &'a Database,
        reminders: &'a dyn ReminderScheduler,
        clock: &'a dyn Clock,
        config: &'a Config,
    ) -> Self {
        Self {
            db,
            reminders,
            clock,
            config,
        }
    }

    /// Execute one list effect, returning the follow-up action if any.
    pub fn run_list(&self, effect: ListEffect) -> Option<ListAction> {
        match effect {
            ListEffect::LoadRoutines { generation } => match self.db.list_routines() {
                Ok(routines) => Some(ListAction::Loaded {
                    generation,
                    routines,
                    now: self.clock.now(),
                }),
                Err(e) => {
                    warn!(error = %e, "routine list load failed");
                    Some(ListAction::LoadFailed {
                        generation,
                        message: e.to_string(),
                    })
                }
            },
            ListEffect::SaveRoutine { routine } => match self.db.insert_routine(&routine) {
                Ok(()) => Some(ListAction::Created {
                    routine,
                    now: self.clock.now(),
                }),
                Err(e) => {
                    warn!(error = %e, routine = %routine.id, "routine create failed");
                    Some(ListAction::CreateFailed {
                        message: e.to_string(),
                    })
                }
            },
            ListEffect::DeleteRoutines { ids } => {
                for id in &ids {
                    // Cascade is ours to enforce: logs first, then the routine.
                    if let Err(e) = self
                        .db
                        .delete_logs_for_routine(id)
                        .and_then(|()| self.db.delete_routine(id))
                    {
                        // The optimistic removal stands even when the store
                        // disagrees; best-effort by design.
                        warn!(error = %e, routine = %id, "routine delete failed");
                    }
                }
                None
            }
            ListEffect::ScheduleReminder { request } => {
                self.schedule(request);
                None
            }
        }
    }

    /// Execute one detail effect, returning the follow-up action if any.
    pub fn run_detail(&self, effect: DetailEffect) -> Option<DetailAction> {
        match effect {
            DetailEffect::LoadLogs { routine_id } => match self.db.logs_for_routine(&routine_id) {
                Ok(logs) => Some(DetailAction::LogsLoaded {
                    logs,
                    now: self.clock.now(),
                }),
                Err(e) => {
                    warn!(error = %e, routine = %routine_id, "log load failed");
                    Some(DetailAction::LogsLoadFailed {
                        message: e.to_string(),
                    })
                }
            },
            DetailEffect::PersistCompletion { routine, log } => {
                if let Err(e) = self
                    .db
                    .set_last_done(&routine.id, log.completed_at)
                    .and_then(|()| self.db.insert_log(&log))
                {
                    warn!(error = %e, routine = %routine.id, "completion persist failed");
                    return Some(DetailAction::SaveFailed {
                        message: e.to_string(),
                    });
                }
                self.schedule(ReminderRequest::for_routine(&routine));
                match self.db.logs_for_routine(&routine.id) {
                    Ok(logs) => Some(DetailAction::LogsLoaded {
                        logs,
                        now: self.clock.now(),
                    }),
                    Err(e) => {
                        warn!(error = %e, routine = %routine.id, "log reload failed");
                        Some(DetailAction::LogsLoadFailed {
                            message: e.to_string(),
                        })
                    }
                }
            }
            DetailEffect::PersistRoutine { routine } => {
                if let Err(e) = self.db.update_routine(&routine) {
                    warn!(error = %e, routine = %routine.id, "routine update failed");
                    return Some(DetailAction::SaveFailed {
                        message: e.to_string(),
                    });
                }
                None
            }
            DetailEffect::ScheduleReminder { request } => {
                self.schedule(request);
                None
            }
            DetailEffect::DeleteRoutine { routine_id } => {
                match self
                    .db
                    .delete_logs_for_routine(&routine_id)
                    .and_then(|()| self.db.delete_routine(&routine_id))
                {
                    Ok(()) => Some(DetailAction::Deleted),
                    Err(e) => {
                        warn!(error = %e, routine = %routine_id, "routine delete failed");
                        None
                    }
                }
            }
            DetailEffect::CancelReminder { identifier } => {
                self.reminders.cancel(&identifier);
                None
            }
        }
    }

    fn schedule(&self, request: ReminderRequest) {
        if self.config.reminders.enabled {
            self.reminders.schedule(request);
        } else {
            debug!(identifier = %request.identifier, "reminders disabled, skipping");
        }
    }
}

/// Dispatch one list action and drain every follow-up it produces.
///
/// Actions are processed strictly in submission order, which is the
/// whole concurrency model: one transition at a time, effects reporting
/// back as further transitions.
pub fn dispatch_list(state: &mut ListState, action: ListAction, runner: &EffectRunner) {
    let mut queue = VecDeque::from([action]);
    while let Some(action) = queue.pop_front() {
        for effect in list::reduce(state, action) {
            if let Some(follow_up) = runner.run_list(effect) {
                queue.push_back(follow_up);
            }
        }
    }
}

/// Dispatch one detail action and drain every follow-up it produces.
pub fn dispatch_detail(state: &mut DetailState, action: DetailAction, runner: &EffectRunner) {
    let mut queue = VecDeque::from([action]);
    while let Some(action) = queue.pop_front() {
        for effect in detail::reduce(state, action, runner.clock) {
            if let Some(follow_up) = runner.run_detail(effect) {
                queue.push_back(follow_up);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::notify::MemoryScheduler;
    use crate::routine::{CompletionLog, FrequencyUnit, Routine};
    use chrono::{DateTime, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 24, 8, 0, 0).unwrap()
    }

    struct Harness {
        db: Database,
        reminders: MemoryScheduler,
        clock: FixedClock,
        config: Config,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                db: Database::open_memory().unwrap(),
                reminders: MemoryScheduler::new(),
                clock: FixedClock(now()),
                config: Config::default(),
            }
        }

        fn runner(&self) -> EffectRunner<'_> {
            EffectRunner::new(&self.db, &self.reminders, &self.clock, &self.config)
        }

        fn log_count(&self, routine_id: &str) -> i64 {
            self.db
                .conn()
                .query_row(
                    "SELECT COUNT(*) FROM completion_logs WHERE routine_id = ?1",
                    rusqlite::params![routine_id],
                    |row| row.get(0),
                )
                .unwrap()
        }

        fn routine_count(&self) -> i64 {
            self.db
                .conn()
                .query_row("SELECT COUNT(*) FROM routines", [], |row| row.get(0))
                .unwrap()
        }
    }

    #[test]
    fn create_flow_persists_and_schedules() {
        let h = Harness::new();
        let mut state = ListState::new(&h.config);

        // "Every 3 weeks" composed by the caller before the request.
        dispatch_list(
            &mut state,
            ListAction::CreateRequested {
                name: "Read".to_string(),
                interval_days: 3 * FrequencyUnit::Week.multiplier(),
                emoji: "📖".to_string(),
            },
            &h.runner(),
        );

        assert_eq!(state.rows.len(), 1);
        let stored = h.db.get_routine(&state.rows[0].routine.id).unwrap().unwrap();
        assert_eq!(stored.interval_days, 21);
        assert!(stored.last_done.is_none());
        assert_eq!(h.reminders.pending_count(), 1);
        assert!(h.reminders.pending(&stored.id).is_some());
    }

    #[test]
    fn list_load_projects_stored_routines() {
        let h = Harness::new();
        h.db.insert_routine(&Routine::new("Water plants", 3, "🌱")).unwrap();
        h.db.insert_routine(&Routine::new("Journal", 1, "📓")).unwrap();

        let mut state = ListState::new(&h.config);
        dispatch_list(&mut state, ListAction::Appeared, &h.runner());

        assert_eq!(state.rows.len(), 2);
        assert_eq!(state.phase, crate::state::list::ListPhase::Loaded);
    }

    #[test]
    fn mark_done_end_to_end() {
        let h = Harness::new();
        let routine = Routine::new("Stretch", 2, "🧘");
        h.db.insert_routine(&routine).unwrap();

        let mut state = DetailState::new(routine.clone(), &h.clock);
        dispatch_detail(&mut state, DetailAction::MarkDone, &h.runner());

        // Store: last_done set, exactly one log stamped now.
        let stored = h.db.get_routine(&routine.id).unwrap().unwrap();
        assert_eq!(stored.last_done, Some(now()));
        assert_eq!(h.log_count(&routine.id), 1);

        // State: log list reloaded via the follow-up action.
        assert_eq!(state.logs.len(), 1);
        assert_eq!(state.logs[0].completed_at, now());
        assert!(state.urgency.is_done_today);

        // Exactly one reminder, keyed by the routine, due in two days.
        assert_eq!(h.reminders.pending_count(), 1);
        let request = h.reminders.pending(&routine.id).unwrap();
        assert_eq!(request.last_done, Some(now()));
        assert_eq!(
            request.trigger_at(now()),
            Utc.with_ymd_and_hms(2026, 2, 26, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn detail_delete_cascades_and_dismisses() {
        let h = Harness::new();
        let routine = Routine::new("Read", 7, "📖");
        h.db.insert_routine(&routine).unwrap();
        h.db.insert_log(&CompletionLog::new(&routine.id, now())).unwrap();
        h.db.insert_log(&CompletionLog::new(&routine.id, now())).unwrap();
        h.reminders.schedule(crate::notify::ReminderRequest::for_routine(&routine));

        let mut state = DetailState::new(routine.clone(), &h.clock);
        dispatch_detail(&mut state, DetailAction::DeleteConfirmed, &h.runner());

        assert_eq!(h.routine_count(), 0);
        assert_eq!(h.log_count(&routine.id), 0);
        assert!(h.reminders.pending(&routine.id).is_none());
        assert!(state.should_dismiss_after_delete);
    }

    #[test]
    fn list_delete_cascades_in_store() {
        let h = Harness::new();
        let routine = Routine::new("Read", 7, "📖");
        h.db.insert_routine(&routine).unwrap();
        h.db.insert_log(&CompletionLog::new(&routine.id, now())).unwrap();

        let mut state = ListState::new(&h.config);
        dispatch_list(&mut state, ListAction::Appeared, &h.runner());
        dispatch_list(
            &mut state,
            ListAction::DeleteRequested {
                ids: vec![routine.id.clone()],
            },
            &h.runner(),
        );

        assert!(state.rows.is_empty());
        assert_eq!(h.routine_count(), 0);
        assert_eq!(h.log_count(&routine.id), 0);
    }

    #[test]
    fn disabled_reminders_are_never_scheduled() {
        let mut h = Harness::new();
        h.config.reminders.enabled = false;

        let mut state = ListState::new(&h.config);
        dispatch_list(
            &mut state,
            ListAction::CreateRequested {
                name: "Read".to_string(),
                interval_days: 7,
                emoji: "📖".to_string(),
            },
            &h.runner(),
        );

        assert_eq!(state.rows.len(), 1);
        assert_eq!(h.reminders.pending_count(), 0);
    }

    #[test]
    fn edit_save_reschedules_under_the_same_identifier() {
        let h = Harness::new();
        let routine = Routine::new("Read", 7, "📖");
        h.db.insert_routine(&routine).unwrap();
        h.reminders.schedule(crate::notify::ReminderRequest::for_routine(&routine));

        let mut state = DetailState::new(routine.clone(), &h.clock);
        dispatch_detail(&mut state, DetailAction::SetEditSheet(true), &h.runner());
        dispatch_detail(
            &mut state,
            DetailAction::EditValueChanged(2),
            &h.runner(),
        );
        dispatch_detail(&mut state, DetailAction::EditSaved, &h.runner());

        let stored = h.db.get_routine(&routine.id).unwrap().unwrap();
        assert_eq!(stored.interval_days, 14);

        assert_eq!(h.reminders.pending_count(), 1);
        assert_eq!(h.reminders.pending(&routine.id).unwrap().interval_days, 14);
    }
}
