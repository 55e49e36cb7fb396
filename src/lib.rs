//! Per-language model fields and the `sync-db` schema reconciliation command.

pub mod config;
pub mod db;
pub mod error;
pub mod i18n;
pub mod model;
pub mod sync;

pub use error::{PolyfieldError, Result};
