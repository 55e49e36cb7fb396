//! Live column list of one table, fetched fresh for every field.

use crate::db::ColumnInfo;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSnapshot {
    columns: Vec<ColumnInfo>,
}

impl SchemaSnapshot {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        Self { columns }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Whether the column exists and is NOT NULL.
    pub fn is_required(&self, name: &str) -> bool {
        self.column(name).is_some_and(|c| !c.is_nullable)
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
