//! Read-only accessors for canonical translated field names.
//!
//! Reading `title` on a record resolves, in order:
//! 1. `title_<current>` for the exact current language code
//! 2. `title_<base>` for the current code's base subtag (`en-US` → `en`)
//! 3. `title_<default>` for the default language
//!
//! The first two steps skip empty values; the last one returns whatever is
//! stored, or nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::i18n::base_subtag;
use crate::model::naming::real_fieldname;

/// Resolution function for one canonical field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedAccessor {
    field: String,
    default_language: String,
}

impl TranslatedAccessor {
    pub fn new(field: impl Into<String>, default_language: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            default_language: default_language.into(),
        }
    }

    /// Canonical field name this accessor reads.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Resolve the value for `current_language` using `lookup` to read columns.
    ///
    /// Pure: `lookup` is only called with per-language column names.
    pub fn resolve<'a, F>(&self, current_language: &str, lookup: F) -> Option<&'a Value>
    where
        F: Fn(&str) -> Option<&'a Value>,
    {
        let read = |code: &str| lookup(&real_fieldname(&self.field, code));

        if let Some(value) = read(current_language).filter(|v| !is_empty_value(v)) {
            return Some(value);
        }

        let base = base_subtag(current_language);
        if base != current_language {
            if let Some(value) = read(base).filter(|v| !is_empty_value(v)) {
                return Some(value);
            }
        }

        read(&self.default_language).filter(|v| !v.is_null())
    }
}

/// Whether a stored value counts as missing for fallback purposes.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// A row: column name → value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw column value.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub(crate) fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.values.insert(column.into(), value);
    }

    /// Value of a canonical translated field in `current_language`.
    pub fn translated(&self, accessor: &TranslatedAccessor, current_language: &str) -> Option<&Value> {
        accessor.resolve(current_language, |column| self.get(column))
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
