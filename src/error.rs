//! Error types shared by the expansion engine and the reconciliation command.

use thiserror::Error;

/// Result type used across the library.
pub type Result<T> = std::result::Result<T, PolyfieldError>;

/// Library errors.
#[derive(Error, Debug)]
pub enum PolyfieldError {
    /// Malformed model or language configuration. Fatal.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A column or ledger entry refers to a field the model no longer declares.
    #[error("Unknown field '{field}' in model '{model}'")]
    UnknownField { model: String, field: String },

    /// A canonical translated name was assigned directly.
    #[error("Field '{field}' of model '{model}' is a translated accessor and cannot be assigned")]
    ReadOnlyField { model: String, field: String },

    /// A generated statement was rejected by the backend.
    #[error("SQL failed on {backend}: {sql}: {message}")]
    BackendIncompatibility {
        backend: String,
        sql: String,
        message: String,
    },

    /// Connection or introspection failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (manifest, ledger, prompts)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest or ledger could not be (de)serialized.
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl PolyfieldError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an unknown field error.
    pub fn unknown_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            model: model.into(),
            field: field.into(),
        }
    }
}
