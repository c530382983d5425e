//! Error types for the migration pipeline

use designkit_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MigrationError {
    #[error("Document root must be an object")]
    InvalidRoot,

    /// Legacy theme with no forward-compatible mapping
    #[error("Unsupported theme: {0}")]
    UnsupportedTheme(String),

    #[error("Migration {name} failed: {message}")]
    Failed { name: &'static str, message: String },

    #[error("Failed to load migrated document: {0}")]
    Load(String),
}

impl From<ModelError> for MigrationError {
    fn from(err: ModelError) -> Self {
        MigrationError::Load(err.to_string())
    }
}
