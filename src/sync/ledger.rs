//! Persisted side-table of the language codes each field was expanded with.
//!
//! Recovering a language code by splitting a column name is ambiguous once
//! field names contain underscores, so every run records which codes exist
//! for each `(table, field)`. Later runs read the ledger to find columns of
//! languages that have since been removed from configuration.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::model::naming::real_fieldname;
use crate::model::Model;
use crate::sync::SchemaSnapshot;

/// table → canonical field → language codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnLedger {
    tables: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl ColumnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a ledger; a missing file yields an empty ledger.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No column ledger yet");
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn codes(&self, table: &str, field: &str) -> Option<&[String]> {
        self.tables
            .get(table)
            .and_then(|fields| fields.get(field))
            .map(Vec::as_slice)
    }

    /// Fields recorded for a table.
    pub fn fields(&self, table: &str) -> Vec<&str> {
        self.tables
            .get(table)
            .map(|fields| fields.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn record(&mut self, table: &str, field: &str, codes: Vec<String>) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(field.to_string(), codes);
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Language codes that still have a column for `field` but are no longer configured.
///
/// Uses the ledger when it knows the field; otherwise falls back to matching
/// `<field>_<code>[-<region>]` against the snapshot, skipping columns that
/// are declared fields or translated names of the model.
pub fn detect_obsolete(
    model: &Model,
    field: &str,
    configured: &[&str],
    snapshot: &SchemaSnapshot,
    ledger: Option<&ColumnLedger>,
) -> Vec<String> {
    if let Some(codes) = ledger.and_then(|l| l.codes(&model.table, field)) {
        return codes
            .iter()
            .filter(|code| !configured.contains(&code.as_str()))
            .filter(|code| snapshot.has_column(&real_fieldname(field, code)))
            .cloned()
            .collect();
    }

    let pattern = format!(
        r"^{}_([A-Za-z]{{2,3}}(?:-[A-Za-z0-9]{{2,8}})?)$",
        regex::escape(field)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };

    snapshot
        .columns()
        .iter()
        .filter(|column| model.field(&column.name).is_none() && !model.is_translatable(&column.name))
        .filter_map(|column| re.captures(&column.name))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|code| !configured.contains(&code.as_str()))
        .collect()
}
