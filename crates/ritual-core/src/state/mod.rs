//! Reducer-style state machines.
//!
//! Each machine is a plain state struct plus a `reduce` function that
//! applies one action and returns the effects the caller should execute.
//! Effects report back by submitting follow-up actions, so all mutation
//! happens inside the sequential reducer and nothing needs locking.

pub mod detail;
pub mod list;
pub mod runner;

pub use detail::{DetailAction, DetailEffect, DetailState, EditForm};
pub use list::{ListAction, ListEffect, ListPhase, ListState, RoutineRow};
pub use runner::{dispatch_detail, dispatch_list, EffectRunner};
