//! Language set: the ordered collection of configured languages.
//!
//! Unlike a process-wide singleton, a `LanguageSet` is loaded once at startup
//! and passed explicitly to the expansion and reconciliation steps. It is
//! treated as immutable for the lifetime of a run.

use crate::error::{PolyfieldError, Result};
use crate::i18n::LanguageEntry;

/// Ordered, duplicate-free set of configured languages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSet {
    languages: Vec<LanguageEntry>,
}

impl LanguageSet {
    /// Build a language set from entries, preserving their order.
    ///
    /// # Errors
    /// Returns a configuration error if the set is empty or a code repeats.
    pub fn new(languages: Vec<LanguageEntry>) -> Result<Self> {
        if languages.is_empty() {
            return Err(PolyfieldError::configuration(
                "At least one language must be configured",
            ));
        }

        for (i, lang) in languages.iter().enumerate() {
            if languages[..i].iter().any(|other| other.code == lang.code) {
                return Err(PolyfieldError::configuration(format!(
                    "Language code '{}' is configured more than once",
                    lang.code
                )));
            }
        }

        Ok(Self { languages })
    }

    /// Parse the `code:Name,code:Name` configuration syntax.
    pub fn parse(list: &str) -> Result<Self> {
        let languages = list.split(',').filter_map(LanguageEntry::parse).collect();
        Self::new(languages)
    }

    /// Get a language entry by its code (exact, case-sensitive match).
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageEntry> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Check if a code is configured.
    pub fn contains(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }

    /// Position of a code in configuration order.
    pub fn position(&self, code: &str) -> Option<usize> {
        self.languages.iter().position(|lang| lang.code == code)
    }

    /// All entries, in configuration order.
    pub fn entries(&self) -> &[LanguageEntry] {
        &self.languages
    }

    /// All codes, in configuration order.
    pub fn codes(&self) -> Vec<&str> {
        self.languages.iter().map(|lang| lang.code.as_str()).collect()
    }

    /// First configured entry.
    pub fn first(&self) -> &LanguageEntry {
        // new() guarantees at least one entry
        &self.languages[0]
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

/// Language configuration consumed by both components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSettings {
    /// Configured languages, in order
    pub languages: LanguageSet,

    /// Explicit default language override, if configured
    pub default_override: Option<String>,

    /// The process' base language setting
    pub base_language: String,
}

impl LanguageSettings {
    pub fn new(languages: LanguageSet, base_language: impl Into<String>) -> Self {
        Self {
            languages,
            default_override: None,
            base_language: base_language.into(),
        }
    }

    /// Set an explicit default language override.
    pub fn with_default_override(mut self, code: impl Into<String>) -> Self {
        self.default_override = Some(code.into());
        self
    }

    /// The default (fallback) language: explicit override, else base language.
    pub fn fallback_language(&self) -> &str {
        self.default_override
            .as_deref()
            .unwrap_or(&self.base_language)
    }

    /// Name of the setting that holds the effective default language.
    pub fn default_setting_name(&self) -> &'static str {
        if self.default_override.is_some() {
            crate::config::DEFAULT_LANGUAGE_VAR
        } else {
            crate::config::BASE_LANGUAGE_VAR
        }
    }
}
