//! Reconciliation layer between the in-memory time-sheet grid and its system
//! of record.
//!
//! `timegrid-model` owns the grid itself; this crate owns everything that
//! touches the wire:
//! - the [`TimesheetStore`] trait the application's persistence layer implements
//! - the sequential batch executor with per-operation outcome collection
//! - the [`EditSession`] that seeds, edits, saves, and refreshes one grid

mod save;
mod session;
mod store;

pub use save::{OperationFailure, SaveOutcome, SaveReport};
pub use session::{EditSession, SessionError};
pub use store::{StoreError, TimesheetStore};
