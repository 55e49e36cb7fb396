//! Field declarations as read from a model manifest.

use serde::{Deserialize, Deserializer, Serialize};

use crate::db::Backend;

/// A key that is present deserializes to `Some`, even when its value is null.
fn provided_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Storage kind of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Char,
    Text,
    Integer,
    BigInteger,
    Boolean,
    Float,
    Decimal,
    Date,
    DateTime,
    Json,
}

/// A scalar field declaration.
///
/// Per-language clones carry `canonical_name` and `language`; a declared
/// field has neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_digits: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u32>,

    /// Accepts absent values
    #[serde(default)]
    pub null: bool,

    /// Accepts empty values in forms
    #[serde(default)]
    pub blank: bool,

    /// Explicit default value, if any. `"default": null` is a provided
    /// default of null, not an absent one.
    #[serde(
        default,
        deserialize_with = "provided_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose_name: Option<String>,

    /// Explicit column type, overriding the one derived from `field_type`
    #[serde(default, rename = "db_type", skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,

    /// Name of the translatable field this one was expanded from
    #[serde(skip)]
    pub canonical_name: Option<String>,

    /// Language code of a per-language field
    #[serde(skip)]
    pub language: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            max_length: None,
            max_digits: None,
            decimal_places: None,
            null: false,
            blank: false,
            default: None,
            verbose_name: None,
            column_type: None,
            canonical_name: None,
            language: None,
        }
    }

    /// Shorthand for a `varchar(max_length)` field.
    pub fn char(name: impl Into<String>, max_length: u32) -> Self {
        Self::new(name, FieldType::Char).with_max_length(max_length)
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_null(mut self, null: bool) -> Self {
        self.null = null;
        self
    }

    pub fn with_default(mut self, default: impl Into<serde_json::Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }

    pub fn with_column_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = Some(column_type.into());
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Whether this field was produced by translation expansion.
    pub fn is_translation(&self) -> bool {
        self.canonical_name.is_some()
    }

    /// Verbose name, defaulting to the field name with underscores as spaces.
    pub fn display_name(&self) -> String {
        self.verbose_name
            .clone()
            .unwrap_or_else(|| self.name.replace('_', " "))
    }

    /// Column type for a backend, or a backend-neutral type when `backend` is `None`.
    pub fn db_type(&self, backend: Option<Backend>) -> String {
        if let Some(column_type) = &self.column_type {
            return column_type.clone();
        }

        let max_length = self.max_length.unwrap_or(255);
        let max_digits = self.max_digits.unwrap_or(10);
        let decimal_places = self.decimal_places.unwrap_or(2);

        match (self.field_type, backend) {
            (FieldType::Char, _) => format!("varchar({})", max_length),
            (FieldType::Text, Some(Backend::MySql)) => "longtext".to_string(),
            (FieldType::Text, _) => "text".to_string(),
            (FieldType::Integer, _) => "integer".to_string(),
            (FieldType::BigInteger, _) => "bigint".to_string(),
            (FieldType::Boolean, Some(Backend::MySql | Backend::Sqlite)) => "bool".to_string(),
            (FieldType::Boolean, _) => "boolean".to_string(),
            (FieldType::Float, Some(Backend::Sqlite)) => "real".to_string(),
            (FieldType::Float, _) => "double precision".to_string(),
            (FieldType::Decimal, Some(Backend::Sqlite)) => "decimal".to_string(),
            (FieldType::Decimal, _) => format!("numeric({}, {})", max_digits, decimal_places),
            (FieldType::Date, _) => "date".to_string(),
            (FieldType::DateTime, Some(Backend::Postgres)) => {
                "timestamp with time zone".to_string()
            }
            (FieldType::DateTime, Some(Backend::MySql)) => "datetime(6)".to_string(),
            (FieldType::DateTime, Some(Backend::Sqlite)) => "datetime".to_string(),
            (FieldType::DateTime, None | Some(Backend::Other)) => "timestamp".to_string(),
            (FieldType::Json, Some(Backend::Postgres)) => "jsonb".to_string(),
            (FieldType::Json, Some(Backend::Sqlite)) => "text".to_string(),
            (FieldType::Json, _) => "json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_db_type() {
        let field = FieldDef::char("title", 200);
        assert_eq!(field.db_type(None), "varchar(200)");
        assert_eq!(field.db_type(Some(Backend::MySql)), "varchar(200)");
    }

    #[test]
    fn test_backend_specific_types() {
        let text = FieldDef::new("body", FieldType::Text);
        assert_eq!(text.db_type(Some(Backend::MySql)), "longtext");
        assert_eq!(text.db_type(Some(Backend::Postgres)), "text");

        let stamp = FieldDef::new("published", FieldType::DateTime);
        assert_eq!(
            stamp.db_type(Some(Backend::Postgres)),
            "timestamp with time zone"
        );
        assert_eq!(stamp.db_type(Some(Backend::MySql)), "datetime(6)");
        assert_eq!(stamp.db_type(None), "timestamp");
        assert_eq!(stamp.db_type(Some(Backend::Other)), "timestamp");
    }

    #[test]
    fn test_explicit_column_type_wins() {
        let field = FieldDef::new("slug", FieldType::Char).with_column_type("citext");
        assert_eq!(field.db_type(Some(Backend::Postgres)), "citext");
        assert_eq!(field.db_type(None), "citext");
    }

    #[test]
    fn test_deserialize_minimal() {
        let field: FieldDef =
            serde_json::from_str(r#"{"name": "title", "type": "char", "max_length": 50}"#)
                .expect("Should deserialize");
        assert_eq!(field.name, "title");
        assert_eq!(field.field_type, FieldType::Char);
        assert!(!field.null);
        assert!(!field.blank);
        assert!(!field.has_default());
        assert!(!field.is_translation());
    }

    #[test]
    fn test_deserialize_default_and_db_type() {
        let field: FieldDef = serde_json::from_str(
            r#"{"name": "status", "type": "text", "default": "draft", "db_type": "varchar(20)"}"#,
        )
        .expect("Should deserialize");
        assert_eq!(field.default, Some(serde_json::json!("draft")));
        assert_eq!(field.column_type.as_deref(), Some("varchar(20)"));
    }

    #[test]
    fn test_explicit_null_default_is_provided() {
        let field: FieldDef =
            serde_json::from_str(r#"{"name": "note", "type": "text", "null": true, "default": null}"#)
                .expect("Should deserialize");
        assert!(field.has_default());
        assert_eq!(field.default, Some(serde_json::Value::Null));

        let field: FieldDef = serde_json::from_str(r#"{"name": "note", "type": "text"}"#)
            .expect("Should deserialize");
        assert!(!field.has_default());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(FieldDef::char("short_title", 10).display_name(), "short title");
        assert_eq!(
            FieldDef::char("title", 10)
                .with_verbose_name("Headline")
                .display_name(),
            "Headline"
        );
    }
}
