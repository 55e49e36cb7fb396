//! The `<field>_<code>` naming contract shared by expansion and reconciliation.

use crate::i18n::LanguageSet;
use crate::model::FieldDef;

/// Column name of a per-language field.
///
/// The code is used exactly as configured: `("title", "pt-BR")` yields
/// `"title_pt-BR"`.
pub fn real_fieldname(field: &str, code: &str) -> String {
    format!("{}_{}", field, code)
}

/// Per-language column names for every configured language, in order.
pub fn real_fieldnames(field: &str, languages: &LanguageSet) -> Vec<String> {
    languages
        .entries()
        .iter()
        .map(|lang| real_fieldname(field, &lang.code))
        .collect()
}

/// The user-facing name of a field: `title` for both `title_en` and `title`.
pub fn canonical_fieldname(field: &FieldDef) -> &str {
    field.canonical_name.as_deref().unwrap_or(&field.name)
}
