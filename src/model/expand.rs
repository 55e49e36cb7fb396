//! Declaration-time expansion of translatable fields.
//!
//! A [`ModelDecl`] lists plain field declarations plus an optional
//! `translate` sequence. [`Model::build`] replaces every translated field with
//! one clone per configured language and keeps the canonical name only as a
//! read-only [`TranslatedAccessor`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PolyfieldError, Result};
use crate::i18n::LanguageSettings;
use crate::model::accessor::{Record, TranslatedAccessor};
use crate::model::naming::{canonical_fieldname, real_fieldname};
use crate::model::FieldDef;

/// The `translate` entry of a model declaration.
///
/// Only an ordered sequence is accepted; the other shapes exist so that a
/// malformed manifest yields a configuration error instead of a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslateDecl {
    Sequence(Vec<String>),
    Name(String),
    Mapping(serde_json::Map<String, serde_json::Value>),
}

impl TranslateDecl {
    fn ordered_names(&self, model: &str) -> Result<&[String]> {
        match self {
            TranslateDecl::Sequence(names) => Ok(names),
            TranslateDecl::Name(_) | TranslateDecl::Mapping(_) => {
                Err(PolyfieldError::configuration(format!(
                    "The translate declaration of model {} must be an ordered sequence of field names",
                    model
                )))
            }
        }
    }
}

/// A model as declared by the application author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDecl {
    #[serde(default)]
    pub app: String,

    pub name: String,

    /// Table name; defaults to `<app>_<name>` in lowercase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    /// Names of parent models, which must be declared earlier
    #[serde(default)]
    pub parents: Vec<String>,

    #[serde(default)]
    pub fields: Vec<FieldDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate: Option<TranslateDecl>,
}

impl ModelDecl {
    pub fn new(app: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            name: name.into(),
            table: None,
            is_abstract: false,
            parents: Vec::new(),
            fields: Vec::new(),
            translate: None,
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn translate<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.translate = Some(TranslateDecl::Sequence(
            names.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parents.push(name.into());
        self
    }

    pub fn abstract_model(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    fn table_name(&self) -> String {
        match &self.table {
            Some(table) => table.clone(),
            None if self.app.is_empty() => self.name.to_lowercase(),
            None => format!("{}_{}", self.app, self.name).to_lowercase(),
        }
    }
}

/// An expanded model: only real columns remain as fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub app: String,
    pub name: String,
    pub table: String,
    pub is_abstract: bool,
    pub parents: Vec<String>,
    fields: Vec<FieldDef>,
    translatable_fields: Vec<String>,
    language_columns: BTreeMap<String, Vec<String>>,
    default_language: String,
}

impl Model {
    /// Expand a declaration.
    ///
    /// `parents` must hold the already-built models named in `decl.parents`,
    /// in the same order.
    ///
    /// # Arguments
    ///
    /// * `decl` - The model declaration with its fields and `translate` list
    /// * `settings` - Configured languages and the default language
    /// * `parents` - Built parent models whose translatable fields are inherited
    ///
    /// # Returns
    ///
    /// The model with one field per language for every translatable field.
    /// Only the default language's field keeps the original nullability
    /// unless the field has a default value.
    ///
    /// # Errors
    ///
    /// Fails when a translatable field is not declared, when a generated
    /// column collides with an existing field, or when `translate` names a
    /// field twice.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let decl = ModelDecl::new("news", "Article")
    ///     .field(FieldDef::char("title", 200))
    ///     .translate(["title"]);
    /// let model = Model::build(&decl, &settings, &[])?;
    /// assert!(model.field("title_en").is_some());
    /// ```
    pub fn build(decl: &ModelDecl, settings: &LanguageSettings, parents: &[&Model]) -> Result<Self> {
        let default_language = settings.fallback_language().to_string();
        if !settings.languages.contains(&default_language) {
            warn!(
                model = %decl.name,
                default_language = %default_language,
                "Default language is not among the configured languages"
            );
        }

        // Abstract parents contribute their columns and translated fields
        let mut fields: Vec<FieldDef> = Vec::new();
        let mut translatable_fields: Vec<String> = Vec::new();
        let mut language_columns = BTreeMap::new();
        for parent in parents.iter().filter(|p| p.is_abstract) {
            for field in &parent.fields {
                if !fields.iter().any(|f: &FieldDef| f.name == field.name) {
                    fields.push(field.clone());
                }
            }
            push_unique(&mut translatable_fields, &parent.translatable_fields);
            for (name, codes) in &parent.language_columns {
                language_columns.insert(name.clone(), codes.clone());
            }
        }

        let translate: &[String] = match &decl.translate {
            Some(translate) => translate.ordered_names(&decl.name)?,
            None => &[],
        };

        for (i, name) in translate.iter().enumerate() {
            if translate[..i].contains(name) {
                return Err(PolyfieldError::configuration(format!(
                    "Field {} is listed twice in the translate declaration of model {}",
                    name, decl.name
                )));
            }
            if !decl.fields.iter().any(|f| &f.name == name) {
                return Err(PolyfieldError::configuration(format!(
                    "There is no field {} in model {}, as specified in the translate declaration",
                    name, decl.name
                )));
            }
        }

        for field in &decl.fields {
            if !translate.contains(&field.name) {
                fields.push(field.clone());
                continue;
            }

            for lang in settings.languages.entries() {
                let lang_field = expand_field(field, &lang.code, &default_language);
                if decl.fields.iter().any(|f| f.name == lang_field.name)
                    || fields.iter().any(|f| f.name == lang_field.name)
                {
                    return Err(PolyfieldError::configuration(format!(
                        "Translated field {} of model {} collides with declared field {}",
                        field.name, decl.name, lang_field.name
                    )));
                }
                fields.push(lang_field);
            }

            language_columns.insert(
                field.name.clone(),
                settings
                    .languages
                    .codes()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            );
        }
        push_unique(&mut translatable_fields, translate);

        debug!(
            model = %decl.name,
            translated = translatable_fields.len(),
            columns = fields.len(),
            "Expanded model"
        );

        Ok(Self {
            app: decl.app.clone(),
            name: decl.name.clone(),
            table: decl.table_name(),
            is_abstract: decl.is_abstract,
            parents: decl.parents.clone(),
            fields,
            translatable_fields,
            language_columns,
            default_language,
        })
    }

    /// `app.model` in lowercase, as shown to operators.
    pub fn full_name(&self) -> String {
        if self.app.is_empty() {
            self.name.to_lowercase()
        } else {
            format!("{}.{}", self.app, self.name).to_lowercase()
        }
    }

    /// Real column-backed fields, in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Canonical names of translated fields whose columns live in this table.
    pub fn translatable_fields(&self) -> &[String] {
        &self.translatable_fields
    }

    pub fn is_translatable(&self, name: &str) -> bool {
        self.translatable_fields.iter().any(|f| f == name)
    }

    /// Canonical name → language codes it was expanded with.
    pub fn language_columns(&self) -> &BTreeMap<String, Vec<String>> {
        &self.language_columns
    }

    /// Per-language fields of one canonical name, in language order.
    pub fn translations_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldDef> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.is_translation() && canonical_fieldname(f) == name)
    }

    /// Default language the model was expanded with.
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn accessor(&self, name: &str) -> Option<TranslatedAccessor> {
        self.is_translatable(name)
            .then(|| TranslatedAccessor::new(name, &self.default_language))
    }

    /// Canonical name → accessor for every translated field.
    pub fn accessors(&self) -> BTreeMap<String, TranslatedAccessor> {
        self.translatable_fields
            .iter()
            .map(|name| TranslatedAccessor::new(name, &self.default_language))
            .map(|accessor| (accessor.field().to_string(), accessor))
            .collect()
    }

    /// Assign a column value on a record of this model.
    ///
    /// Canonical translated names are read-only and unknown columns are rejected.
    pub fn set_value(&self, record: &mut Record, column: &str, value: serde_json::Value) -> Result<()> {
        if self.is_translatable(column) {
            return Err(PolyfieldError::ReadOnlyField {
                model: self.name.clone(),
                field: column.to_string(),
            });
        }
        if self.field(column).is_none() {
            return Err(PolyfieldError::unknown_field(&self.name, column));
        }
        record.insert(column, value);
        Ok(())
    }
}

/// Clone `field` for one language, applying the relaxation rule.
fn expand_field(field: &FieldDef, code: &str, default_language: &str) -> FieldDef {
    let mut lang_field = field.clone();
    lang_field.name = real_fieldname(&field.name, code);
    lang_field.canonical_name = Some(field.name.clone());
    lang_field.language = Some(code.to_string());
    lang_field.verbose_name = Some(format!("{} {}", field.display_name(), code));

    if code != default_language {
        // An explicit default keeps the column NOT NULL, blank is always relaxed
        if !lang_field.null && !lang_field.has_default() {
            lang_field.null = true;
        }
        lang_field.blank = true;
    }

    lang_field
}

fn push_unique(target: &mut Vec<String>, names: &[String]) {
    for name in names {
        if !target.contains(name) {
            target.push(name.clone());
        }
    }
}
