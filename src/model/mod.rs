//! Field Expansion Engine.
//!
//! Turns model declarations with a `translate` list into models holding one
//! real column per configured language, plus read-only accessors that resolve
//! the canonical field name against the current language.
//!
//! ```rust,ignore
//! use polyfield::model::{FieldDef, Model, ModelDecl};
//!
//! let decl = ModelDecl::new("news", "Article")
//!     .field(FieldDef::char("title", 200))
//!     .translate(["title"]);
//! let model = Model::build(&decl, &settings, &[])?;
//! assert!(model.field("title_en").is_some());
//! ```

mod accessor;
mod expand;
mod field;
pub mod naming;
mod registry;

pub use accessor::{is_empty_value, Record, TranslatedAccessor};
pub use expand::{Model, ModelDecl, TranslateDecl};
pub use field::{FieldDef, FieldType};
pub use registry::{Manifest, ModelRegistry};
