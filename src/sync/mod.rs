//! Schema reconciliation: diff live tables against the configured languages
//! and converge them.
//!
//! # Architecture
//!
//! - `snapshot`: the live column list of one table
//! - `ledger`: persisted record of the language codes each field was expanded with
//! - `dialect`: backend-specific statement rendering
//! - `plan`: pure construction of the ordered statements for one field
//! - `prompt`: confirmation and default-language selection
//! - `command`: the per-field state machine driving a whole run

mod command;
mod dialect;
mod ledger;
mod plan;
mod prompt;
mod snapshot;

pub use command::{
    FieldOutcome, FieldState, SkipReason, SyncCommand, SyncOptions, SyncReport, UnknownColumn,
};
pub use dialect::{Dialect, SqlRenderer};
pub use ledger::{detect_obsolete, ColumnLedger};
pub use plan::{plan_field, FieldContext, MigrationPlan, PlannedStatement, StatementKind};
pub use prompt::{
    ask_for_confirmation, choose_default_language, resolve_default_language, Prompter,
    ScriptedPrompter, StdinPrompter,
};
pub use snapshot::SchemaSnapshot;
