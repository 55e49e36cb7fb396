//! Language configuration shared by the expansion engine and the
//! reconciliation command.
//!
//! # Architecture
//!
//! - `language`: a single configured `(code, display_name)` entry and code helpers
//! - `registry`: the ordered language set and the default-language settings
//!
//! # Example
//!
//! ```rust,ignore
//! use polyfield::i18n::{LanguageSet, LanguageSettings};
//!
//! let languages = LanguageSet::parse("en:English,fr:Français")?;
//! let settings = LanguageSettings::new(languages, "en");
//! assert_eq!(settings.fallback_language(), "en");
//! ```

mod language;
mod registry;

pub use language::{base_subtag, LanguageEntry};
pub use registry::{LanguageSet, LanguageSettings};
