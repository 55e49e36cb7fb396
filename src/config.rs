use anyhow::{Context, Result};

use crate::i18n::{LanguageSet, LanguageSettings};

/// Language list override
pub const LANGUAGES_VAR: &str = "POLYFIELD_LANGUAGES";
/// Base language list setting
pub const BASE_LANGUAGES_VAR: &str = "LANGUAGES";
/// Default language override
pub const DEFAULT_LANGUAGE_VAR: &str = "POLYFIELD_DEFAULT_LANGUAGE";
/// Base language setting
pub const BASE_LANGUAGE_VAR: &str = "LANGUAGE_CODE";
/// Placeholder written into required default-language columns
pub const PLACEHOLDER_VAR: &str = "POLYFIELD_PLACEHOLDER";

pub const DEFAULT_PLACEHOLDER: &str = "WITHOUT VALUE";

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Models
    pub models_file: String,
    pub ledger_file: String,

    // Languages
    pub languages: LanguageSettings,

    // Reconciliation
    pub placeholder: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL not set")?,

            models_file: std::env::var("POLYFIELD_MODELS")
                .unwrap_or_else(|_| "models.json".to_string()),
            ledger_file: std::env::var("POLYFIELD_LEDGER")
                .unwrap_or_else(|_| "polyfield_columns.json".to_string()),

            languages: language_settings_from_env()?,

            placeholder: std::env::var(PLACEHOLDER_VAR)
                .unwrap_or_else(|_| DEFAULT_PLACEHOLDER.to_string()),
        })
    }
}

/// Load the language settings alone (used by tooling that has no database).
pub fn language_settings_from_env() -> Result<LanguageSettings> {
    // Override first, then the base setting, then a single English entry
    let list = std::env::var(LANGUAGES_VAR)
        .or_else(|_| std::env::var(BASE_LANGUAGES_VAR))
        .unwrap_or_else(|_| "en:English".to_string());
    let languages = LanguageSet::parse(&list)
        .with_context(|| format!("Invalid language list: {}", list))?;

    let base_language =
        std::env::var(BASE_LANGUAGE_VAR).unwrap_or_else(|_| "en".to_string());

    let mut settings = LanguageSettings::new(languages, base_language);
    if let Ok(code) = std::env::var(DEFAULT_LANGUAGE_VAR) {
        if !code.trim().is_empty() {
            settings = settings.with_default_override(code.trim());
        }
    }

    Ok(settings)
}
