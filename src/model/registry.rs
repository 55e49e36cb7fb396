//! Model registry: every model of a manifest, expanded in declaration order.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PolyfieldError, Result};
use crate::i18n::LanguageSettings;
use crate::model::{Model, ModelDecl};

/// JSON manifest describing the application's models.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub models: Vec<ModelDecl>,
}

/// All expanded models, in manifest order.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<Model>,
}

impl ModelRegistry {
    /// Expand every declaration. Parents must be declared before their children.
    pub fn from_manifest(manifest: &Manifest, settings: &LanguageSettings) -> Result<Self> {
        let mut registry = Self::default();
        for decl in &manifest.models {
            registry.register(decl, settings)?;
        }
        Ok(registry)
    }

    /// Read and expand a manifest file.
    pub fn load(path: impl AsRef<Path>, settings: &LanguageSettings) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&content)?;
        let registry = Self::from_manifest(&manifest, settings)?;

        info!(
            path = %path.display(),
            models = registry.models.len(),
            "Loaded model manifest"
        );
        Ok(registry)
    }

    /// Expand and add one declaration.
    pub fn register(&mut self, decl: &ModelDecl, settings: &LanguageSettings) -> Result<&Model> {
        if self.get(&decl.name).is_some() {
            return Err(PolyfieldError::configuration(format!(
                "Model {} is declared more than once",
                decl.name
            )));
        }

        let parents = decl
            .parents
            .iter()
            .map(|name| {
                self.get(name).ok_or_else(|| {
                    PolyfieldError::configuration(format!(
                        "Model {} declares parent {} which is not declared before it",
                        decl.name, name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let model = Model::build(decl, settings, &parents)?;
        self.models.push(model);
        Ok(&self.models[self.models.len() - 1])
    }

    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Models backed by a table of their own.
    pub fn concrete_models(&self) -> impl Iterator<Item = &Model> {
        self.models.iter().filter(|m| !m.is_abstract)
    }

    /// Translated field names of `model`, including those of its ancestors.
    ///
    /// With `column_in_current_table`, only abstract ancestors contribute,
    /// since a concrete parent keeps its columns in its own table.
    pub fn all_translatable_fields(&self, model: &Model, column_in_current_table: bool) -> Vec<String> {
        let mut fields = Vec::new();
        self.collect_translatable(model, column_in_current_table, &mut fields);
        fields
    }

    fn collect_translatable(&self, model: &Model, column_in_current_table: bool, out: &mut Vec<String>) {
        for name in model.translatable_fields() {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        for parent in model.parents.iter().filter_map(|name| self.get(name)) {
            if !column_in_current_table || parent.is_abstract {
                self.collect_translatable(parent, column_in_current_table, out);
            }
        }
    }
}
