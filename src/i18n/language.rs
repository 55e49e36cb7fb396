//! Language entry: one configured `(code, display_name)` pair.
//!
//! Codes are kept exactly as configured. `en`, `en-US` and `pt_BR` are all
//! valid and never normalized, because the code becomes part of a column name.

use serde::{Deserialize, Serialize};

/// A configured language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    /// Language code as configured (e.g., "en", "fr", "pt-BR")
    pub code: String,

    /// Display name shown to operators (e.g., "English", "Français")
    pub name: String,
}

impl LanguageEntry {
    /// Create a new language entry.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Parse a single `code:Name` item. A bare `code` uses the code as its name.
    ///
    /// Returns `None` for an empty item or an empty code.
    pub fn parse(item: &str) -> Option<Self> {
        let item = item.trim();
        if item.is_empty() {
            return None;
        }

        let (code, name) = match item.split_once(':') {
            Some((code, name)) => (code.trim(), name.trim()),
            None => (item, item),
        };

        if code.is_empty() {
            return None;
        }

        let name = if name.is_empty() { code } else { name };
        Some(Self::new(code, name))
    }

    /// Base subtag of this entry's code.
    pub fn base_subtag(&self) -> &str {
        base_subtag(&self.code)
    }
}

/// Return the primary subtag of a language code.
///
/// `"en-US"` and `"en_US"` both yield `"en"`; a code without a region is
/// returned unchanged.
pub fn base_subtag(code: &str) -> &str {
    code.split(['-', '_']).next().unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== parse Tests ====================

    #[test]
    fn test_parse_code_and_name() {
        let entry = LanguageEntry::parse("fr:Français").expect("Should parse");
        assert_eq!(entry.code, "fr");
        assert_eq!(entry.name, "Français");
    }

    #[test]
    fn test_parse_bare_code_uses_code_as_name() {
        let entry = LanguageEntry::parse(" de ").expect("Should parse");
        assert_eq!(entry.code, "de");
        assert_eq!(entry.name, "de");
    }

    #[test]
    fn test_parse_keeps_case_and_region() {
        let entry = LanguageEntry::parse("pt-BR:Português").expect("Should parse");
        assert_eq!(entry.code, "pt-BR");
    }

    #[test]
    fn test_parse_empty_item() {
        assert!(LanguageEntry::parse("").is_none());
        assert!(LanguageEntry::parse("   ").is_none());
        assert!(LanguageEntry::parse(":English").is_none());
    }

    #[test]
    fn test_parse_empty_name_falls_back_to_code() {
        let entry = LanguageEntry::parse("es:").expect("Should parse");
        assert_eq!(entry.name, "es");
    }

    // ==================== base_subtag Tests ====================

    #[test]
    fn test_base_subtag() {
        assert_eq!(base_subtag("en-US"), "en");
        assert_eq!(base_subtag("pt_BR"), "pt");
        assert_eq!(base_subtag("fr"), "fr");
        assert_eq!(base_subtag(""), "");
    }

    #[test]
    fn test_entry_base_subtag() {
        let entry = LanguageEntry::new("zh-Hant", "Chinese (Traditional)");
        assert_eq!(entry.base_subtag(), "zh");
    }
}
