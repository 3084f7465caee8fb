//! `timegrid-model` defines the core in-memory time-sheet grid structures.
//!
//! The crate is intentionally self-contained and I/O-free so it can be reused by:
//! - the reconciliation layer (`timegrid-sync`)
//! - IPC/HTTP boundaries via `serde` (JSON-safe schema)

mod cell;
mod diff;
mod ledger;
mod matrix;
mod project;
mod record;
mod view;

pub use cell::{parse_hours, Cell, DAY_HOUR_CEILING};
pub use diff::{CellIntent, CellSlot, MissingAssignees, SaveOperation, SavePlan};
pub use ledger::DeletionLedger;
pub use matrix::{CeilingExceeded, Column, SeedError, SeedReport, TimeMatrix};
pub use project::GridProjection;
pub use record::{TimeRecord, WorkType};
pub use view::{ViewMode, ViewWindow};

/// Server-side identifier of a work-hour record.
pub type RecordId = uuid::Uuid;

/// Identifier of a work-type (grid column) an equipment unit logs hours against.
pub type WorkTypeId = uuid::Uuid;

/// Identifier of an operator/driver.
pub type OperatorId = uuid::Uuid;

/// Identifier of an equipment unit.
pub type EquipmentId = uuid::Uuid;
