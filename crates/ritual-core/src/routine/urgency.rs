//! Urgency and due-date engine.
//!
//! Pure functions over `(interval_days, last_done, logs, now)`. All day
//! arithmetic counts calendar-day boundaries crossed in UTC, not elapsed
//! hours: a completion at 23:50 is one day old ten minutes later.
//!
//! The engine assumes `interval_days >= 1`; constructors and edit paths
//! clamp before anything reaches it.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::CompletionLog;

/// How close a routine is to (or past) its due date.
///
/// Tiers map to a traffic-light color at the presentation boundary; the
/// engine itself never deals in colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyTier {
    Low,
    Medium,
    High,
}

/// Signed count of calendar-day boundaries crossed between `from` and `to`.
///
/// Negative when `from` lies on a later day than `to`.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to.date_naive() - from.date_naive()).num_days()
}

/// Days since the last completion.
///
/// A routine that was never completed reports 0: the baseline is "due
/// now", not "infinitely overdue".
pub fn days_since_last(last_done: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match last_done {
        Some(last) => days_between(last, now),
        None => 0,
    }
}

/// The instant the routine next comes due: last completion (or `now` if
/// never completed) plus the interval.
pub fn due_date(
    interval_days: u32,
    last_done: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    last_done.unwrap_or(now) + Duration::days(i64::from(interval_days))
}

/// Whole days elapsed past the due date, floored at zero.
pub fn overdue_days(
    interval_days: u32,
    last_done: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> i64 {
    days_between(due_date(interval_days, last_done, now), now).max(0)
}

/// Whether the routine was completed on the same calendar day as `now`.
///
/// Either signal suffices: `last_done` falling on today, or any log
/// stamped today. The two can diverge, so this is an OR on purpose.
pub fn is_done_today(
    last_done: Option<DateTime<Utc>>,
    logs: &[CompletionLog],
    now: DateTime<Utc>,
) -> bool {
    let today = now.date_naive();
    if last_done.is_some_and(|last| last.date_naive() == today) {
        return true;
    }
    logs.iter().any(|log| log.completed_at.date_naive() == today)
}

/// Classify progress through the interval into a tier.
pub fn urgency_tier(days_since: i64, interval_days: u32) -> UrgencyTier {
    let progress = days_since as f64 / f64::from(interval_days);
    if progress < 0.75 {
        UrgencyTier::Low
    } else if progress < 0.90 {
        UrgencyTier::Medium
    } else {
        UrgencyTier::High
    }
}

/// All derived display fields for one routine, computed in one pass.
///
/// Never persisted; recomputed from the routine and its loaded logs on
/// every refresh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UrgencySummary {
    pub days_since_last: i64,
    pub overdue_days: i64,
    pub due_date: DateTime<Utc>,
    pub is_done_today: bool,
    pub tier: UrgencyTier,
}

impl UrgencySummary {
    pub fn compute(
        interval_days: u32,
        last_done: Option<DateTime<Utc>>,
        logs: &[CompletionLog],
        now: DateTime<Utc>,
    ) -> Self {
        let days_since = days_since_last(last_done, now);
        Self {
            days_since_last: days_since,
            overdue_days: overdue_days(interval_days, last_done, now),
            due_date: due_date(interval_days, last_done, now),
            is_done_today: is_done_today(last_done, logs, now),
            tier: urgency_tier(days_since, interval_days),
        }
    }
}

/// List ordering: most overdue first, then higher tier, then name
/// (case-insensitive). Callers must apply this with a stable sort so
/// full ties keep their original relative order.
pub fn list_order(
    a: &UrgencySummary,
    a_name: &str,
    b: &UrgencySummary,
    b_name: &str,
) -> Ordering {
    b.overdue_days
        .cmp(&a.overdue_days)
        .then(b.tier.cmp(&a.tier))
        .then_with(|| a_name.to_lowercase().cmp(&b_name.to_lowercase()))
}
