//! Lenient loading of persisted documents
//!
//! Historical files can contain entries that no longer decode. Loading keeps
//! every entry it can read and reports the rest instead of failing.

use crate::board::Board;
use crate::document::Document;
use crate::error::ModelError;
use crate::ids::ComponentType;
use crate::node::Node;
use crate::theme::system_default_theme;
use serde_json::Value;

/// Entries dropped while loading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub skipped: Vec<SkippedEntry>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    /// `boards.<key>` or `byId.<key>`
    pub path: String,
    pub reason: String,
}

impl Document {
    /// Decode a persisted document, skipping entries that fail to decode.
    ///
    /// Only a non-object root is an error.
    pub fn from_value(value: Value) -> Result<(Document, LoadReport), ModelError> {
        let Value::Object(mut root) = value else {
            return Err(ModelError::InvalidDocument(
                "document root must be an object".to_string(),
            ));
        };

        let mut report = LoadReport::default();
        let mut doc = Document::empty(0);

        doc.schema_version = root
            .get("version")
            .or_else(|| root.get("schemaVersion"))
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0);

        doc.theme = match root.remove("customTheme") {
            Some(Value::Null) | None => system_default_theme(),
            Some(theme) => theme,
        };

        if let Some(Value::Object(boards)) = root.remove("boards") {
            for (key, raw) in boards {
                match serde_json::from_value::<Board>(raw) {
                    Ok(board) if board.component_type.as_str() == key => {
                        doc.boards.insert(ComponentType::new(key), board);
                    }
                    Ok(board) => report.skip(
                        format!("boards.{key}"),
                        format!("board key does not match component type {}", board.component_type),
                    ),
                    Err(e) => report.skip(format!("boards.{key}"), e.to_string()),
                }
            }
        }

        if let Some(Value::Object(nodes)) = root.remove("byId") {
            for (key, raw) in nodes {
                match serde_json::from_value::<Node>(raw) {
                    Ok(node) if node.id().as_str() == key => doc.insert_node(node),
                    Ok(node) => report.skip(
                        format!("byId.{key}"),
                        format!("registry key does not match node id {}", node.id()),
                    ),
                    Err(e) => report.skip(format!("byId.{key}"), e.to_string()),
                }
            }
        }

        Ok((doc, report))
    }
}

impl LoadReport {
    fn skip(&mut self, path: String, reason: String) {
        tracing::warn!(%path, %reason, "skipping malformed entry");
        self.skipped.push(SkippedEntry { path, reason });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_malformed_node_is_skipped() {
        let value = json!({
            "version": 5,
            "boards": {},
            "byId": {
                "variant-text-default": {
                    "id": "variant-text-default",
                    "componentType": "text",
                    "isChild": false,
                    "fromSchema": true
                },
                "child-text-9": null,
                "child-text-10": { "id": 42 }
            }
        });

        let (doc, report) = Document::from_value(value).unwrap();
        assert!(doc.contains("variant-text-default"));
        assert_eq!(doc.registry.len(), 1);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped.iter().any(|s| s.path == "byId.child-text-9"));
    }

    #[test]
    fn test_missing_theme_gets_default() {
        let (doc, report) = Document::from_value(json!({ "version": 2 })).unwrap();
        assert_eq!(doc.schema_version, 2);
        assert_eq!(doc.theme, system_default_theme());
        assert!(report.is_clean());
    }

    #[test]
    fn test_non_object_root_fails() {
        assert!(Document::from_value(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_mismatched_board_key_is_skipped() {
        let (doc, report) = Document::from_value(json!({
            "boards": { "card": { "componentType": "button" } }
        }))
        .unwrap();
        assert!(doc.boards.is_empty());
        assert_eq!(report.skipped[0].path, "boards.card");
    }
}
