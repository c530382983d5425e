//! Error types for the document model

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("Node {id} is missing field `{field}`")]
    MissingField { id: String, field: &'static str },

    #[error("Invalid level rank: {0}")]
    InvalidLevel(u8),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Json(e.to_string())
    }
}
