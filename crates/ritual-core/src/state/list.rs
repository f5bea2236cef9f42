//! Routine list state machine.
//!
//! Loads all routines, projects them into display rows via the urgency
//! engine, and applies create/delete mutations. Deletes are optimistic:
//! rows disappear before the store confirms and are not restored if the
//! store write later fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::notify::ReminderRequest;
use crate::routine::urgency::{self, UrgencySummary};
use crate::routine::{sanitize_emoji, validate_new_routine, Routine};
use crate::storage::Config;

/// Load lifecycle of the list.
///
/// `LoadFailed` keeps whatever rows were loaded before: stale data stays
/// visible rather than blanking the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListPhase {
    Idle,
    Loading,
    Loaded,
    LoadFailed,
}

impl Default for ListPhase {
    fn default() -> Self {
        ListPhase::Idle
    }
}

/// One display row: the routine plus its derived urgency fields.
///
/// The list never loads logs, so `is_done_today` here is derived from
/// `last_done` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineRow {
    pub routine: Routine,
    pub urgency: UrgencySummary,
}

impl RoutineRow {
    fn project(routine: Routine, now: DateTime<Utc>) -> Self {
        let urgency =
            UrgencySummary::compute(routine.interval_days, routine.last_done, &[], now);
        Self { routine, urgency }
    }
}

/// In-memory projection of the routine list.
pub struct ListState {
    pub phase: ListPhase,
    pub rows: Vec<RoutineRow>,
    /// Bumped on every load request; a result stamped with an older
    /// generation lost the race to a newer `Appeared` and is discarded.
    load_generation: u64,
    default_emoji: String,
}

impl ListState {
    pub fn new(config: &Config) -> Self {
        Self {
            phase: ListPhase::Idle,
            rows: Vec::new(),
            load_generation: 0,
            default_emoji: config.default_emoji.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ListAction {
    /// The list became visible; (re)load from the store.
    Appeared,
    Loaded {
        generation: u64,
        routines: Vec<Routine>,
        now: DateTime<Utc>,
    },
    LoadFailed {
        generation: u64,
        message: String,
    },
    CreateRequested {
        name: String,
        interval_days: u32,
        emoji: String,
    },
    /// The store accepted the new routine.
    Created {
        routine: Routine,
        now: DateTime<Utc>,
    },
    CreateFailed {
        message: String,
    },
    DeleteRequested {
        ids: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListEffect {
    LoadRoutines { generation: u64 },
    SaveRoutine { routine: Routine },
    /// Delete the routines and all their logs.
    DeleteRoutines { ids: Vec<String> },
    ScheduleReminder { request: ReminderRequest },
}

/// Apply one action; returns the effects to execute.
pub fn reduce(state: &mut ListState, action: ListAction) -> Vec<ListEffect> {
    match action {
        ListAction::Appeared => {
            state.load_generation += 1;
            state.phase = ListPhase::Loading;
            vec![ListEffect::LoadRoutines {
                generation: state.load_generation,
            }]
        }
        ListAction::Loaded {
            generation,
            routines,
            now,
        } => {
            if generation != state.load_generation {
                debug!(generation, current = state.load_generation, "stale load discarded");
                return Vec::new();
            }
            state.rows = routines
                .into_iter()
                .map(|r| RoutineRow::project(r, now))
                .collect();
            sort_rows(&mut state.rows);
            state.phase = ListPhase::Loaded;
            Vec::new()
        }
        ListAction::LoadFailed { generation, message } => {
            if generation != state.load_generation {
                return Vec::new();
            }
            // Prior rows stay untouched; the failure is only logged.
            debug!(%message, "routine list load failed");
            state.phase = ListPhase::LoadFailed;
            Vec::new()
        }
        ListAction::CreateRequested {
            name,
            interval_days,
            emoji,
        } => {
            if let Err(err) = validate_new_routine(&name, interval_days) {
                debug!(error = %err, "create request rejected");
                return Vec::new();
            }
            let emoji =
                sanitize_emoji(&emoji).unwrap_or_else(|| state.default_emoji.clone());
            let routine = Routine::new(name.trim(), interval_days, &emoji);
            vec![ListEffect::SaveRoutine { routine }]
        }
        ListAction::Created { routine, now } => {
            let request = ReminderRequest::for_routine(&routine);
            state.rows.push(RoutineRow::project(routine, now));
            sort_rows(&mut state.rows);
            vec![ListEffect::ScheduleReminder { request }]
        }
        ListAction::CreateFailed { message } => {
            // No in-memory state was touched on the request path.
            debug!(%message, "routine create failed");
            Vec::new()
        }
        ListAction::DeleteRequested { ids } => {
            // Optimistic: rows vanish now, the store catches up later.
            state.rows.retain(|row| !ids.contains(&row.routine.id));
            vec![ListEffect::DeleteRoutines { ids }]
        }
    }
}

/// Stable sort; ties after overdue/tier/name keep their relative order.
fn sort_rows(rows: &mut [RoutineRow]) {
    rows.sort_by(|a, b| {
        urgency::list_order(&a.urgency, &a.routine.name, &b.urgency, &b.routine.name)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::urgency::UrgencyTier;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 24, 8, 0, 0).unwrap()
    }

    fn state() -> ListState {
        ListState::new(&Config::default())
    }

    fn loaded(state: &mut ListState, routines: Vec<Routine>) {
        let effects = reduce(state, ListAction::Appeared);
        let generation = match effects[0] {
            ListEffect::LoadRoutines { generation } => generation,
            _ => panic!("expected load effect"),
        };
        reduce(
            state,
            ListAction::Loaded {
                generation,
                routines,
                now: now(),
            },
        );
    }

    #[test]
    fn appeared_requests_a_load() {
        let mut state = state();
        let effects = reduce(&mut state, ListAction::Appeared);
        assert_eq!(effects, vec![ListEffect::LoadRoutines { generation: 1 }]);
        assert_eq!(state.phase, ListPhase::Loading);
    }

    #[test]
    fn loaded_projects_and_sorts_rows() {
        let mut state = state();
        let mut overdue = Routine::new("Zebra care", 1, "🦓");
        overdue.last_done = Some(now() - Duration::days(5));
        let fresh = Routine::new("Aquarium", 10, "🐠");

        loaded(&mut state, vec![fresh, overdue]);

        assert_eq!(state.phase, ListPhase::Loaded);
        assert_eq!(state.rows.len(), 2);
        // Overdue routine ranks first despite later name.
        assert_eq!(state.rows[0].routine.name, "Zebra care");
        assert_eq!(state.rows[0].urgency.overdue_days, 4);
        assert_eq!(state.rows[1].urgency.tier, UrgencyTier::Low);
    }

    #[test]
    fn stale_load_result_is_discarded() {
        let mut state = state();
        reduce(&mut state, ListAction::Appeared);
        reduce(&mut state, ListAction::Appeared); // supersedes the first

        reduce(
            &mut state,
            ListAction::Loaded {
                generation: 1,
                routines: vec![Routine::new("Old", 1, "🕰")],
                now: now(),
            },
        );
        assert!(state.rows.is_empty());
        assert_eq!(state.phase, ListPhase::Loading);

        reduce(
            &mut state,
            ListAction::Loaded {
                generation: 2,
                routines: vec![Routine::new("New", 1, "✨")],
                now: now(),
            },
        );
        assert_eq!(state.rows.len(), 1);
        assert_eq!(state.rows[0].routine.name, "New");
    }

    #[test]
    fn load_failure_keeps_prior_rows() {
        let mut state = state();
        loaded(&mut state, vec![Routine::new("Keep me", 3, "🟢")]);

        reduce(&mut state, ListAction::Appeared);
        reduce(
            &mut state,
            ListAction::LoadFailed {
                generation: 2,
                message: "disk on fire".to_string(),
            },
        );

        assert_eq!(state.phase, ListPhase::LoadFailed);
        assert_eq!(state.rows.len(), 1);
        assert_eq!(state.rows[0].routine.name, "Keep me");
    }

    #[test]
    fn create_with_blank_name_is_a_silent_noop() {
        let mut state = state();
        let effects = reduce(
            &mut state,
            ListAction::CreateRequested {
                name: "   ".to_string(),
                interval_days: 3,
                emoji: "🌱".to_string(),
            },
        );
        assert!(effects.is_empty());
        assert!(state.rows.is_empty());
    }

    #[test]
    fn create_with_zero_interval_is_rejected() {
        let mut state = state();
        let effects = reduce(
            &mut state,
            ListAction::CreateRequested {
                name: "Read".to_string(),
                interval_days: 0,
                emoji: "📖".to_string(),
            },
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn create_emits_save_with_fresh_routine() {
        let mut state = state();
        let effects = reduce(
            &mut state,
            ListAction::CreateRequested {
                name: "  Read  ".to_string(),
                interval_days: 21,
                emoji: "".to_string(),
            },
        );
        let routine = match &effects[0] {
            ListEffect::SaveRoutine { routine } => routine.clone(),
            other => panic!("expected save effect, got {other:?}"),
        };
        assert_eq!(routine.name, "Read");
        assert_eq!(routine.interval_days, 21);
        assert_eq!(routine.emoji, Config::default().default_emoji);
        assert!(routine.last_done.is_none());
        // Not in the list until the store confirms.
        assert!(state.rows.is_empty());
    }

    #[test]
    fn created_appends_row_and_schedules_reminder() {
        let mut state = state();
        let routine = Routine::new("Read", 21, "📖");
        let effects = reduce(
            &mut state,
            ListAction::Created {
                routine: routine.clone(),
                now: now(),
            },
        );

        assert_eq!(state.rows.len(), 1);
        match &effects[0] {
            ListEffect::ScheduleReminder { request } => {
                assert_eq!(request.identifier, routine.id);
                assert_eq!(request.interval_days, 21);
                assert!(request.last_done.is_none());
            }
            other => panic!("expected reminder effect, got {other:?}"),
        }
    }

    #[test]
    fn delete_removes_rows_optimistically() {
        let mut state = state();
        let stays = Routine::new("Stays", 3, "🟢");
        let goes = Routine::new("Goes", 3, "🔴");
        loaded(&mut state, vec![stays.clone(), goes.clone()]);

        let effects = reduce(
            &mut state,
            ListAction::DeleteRequested {
                ids: vec![goes.id.clone()],
            },
        );

        assert_eq!(state.rows.len(), 1);
        assert_eq!(state.rows[0].routine.id, stays.id);
        assert_eq!(
            effects,
            vec![ListEffect::DeleteRoutines {
                ids: vec![goes.id]
            }]
        );
    }
}
