//! # Ritual Core Library
//!
//! This library provides the core business logic for Ritual, a personal
//! routine tracker: users define recurring tasks, mark them done, and get
//! a local reminder when a routine comes due. The crate is UI-agnostic;
//! any rendering shell drives it through the state machines and renders
//! whatever they hold.
//!
//! ## Architecture
//!
//! - **Urgency Engine**: pure day-granularity date arithmetic that turns
//!   a routine's interval and last completion into "days since", "overdue
//!   days", a due date, and an urgency tier
//! - **State Machines**: reducer-style list and detail machines; each
//!   transition may describe effects (store reads/writes, reminder
//!   scheduling) that the caller executes and feeds back as actions
//! - **Storage**: SQLite-based routine and completion-log persistence,
//!   TOML-based configuration
//! - **Reminders**: a fire-and-forget scheduler contract keyed by routine
//!   identifier, with at most one pending reminder per routine
//!
//! ## Key Components
//!
//! - [`Routine`] / [`CompletionLog`]: the persisted model
//! - [`UrgencySummary`]: derived per-routine display fields
//! - [`ListState`] / [`DetailState`]: the two state machines
//! - [`EffectRunner`]: executes effects against the real collaborators
//! - [`Database`]: routine and log persistence

pub mod clock;
pub mod error;
pub mod notify;
pub mod routine;
pub mod state;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use notify::{MemoryScheduler, ReminderRequest, ReminderScheduler};
pub use routine::urgency::{UrgencySummary, UrgencyTier};
pub use routine::{CompletionLog, FrequencyUnit, Routine};
pub use state::detail::{DetailAction, DetailEffect, DetailState, EditForm};
pub use state::list::{ListAction, ListEffect, ListPhase, ListState, RoutineRow};
pub use state::runner::{dispatch_detail, dispatch_list, EffectRunner};
pub use storage::{Config, Database};
