//! Accessors for the persisted JSON shape
//!
//! Migrations run before the document is decoded, so they work on the raw
//! `serde_json` tree and must tolerate any field being absent or mistyped.

use crate::report::MigrationContext;
use serde_json::{Map, Value};

pub type Object = Map<String, Value>;

pub const VERSION: &str = "version";
pub const LEGACY_VERSION: &str = "schemaVersion";
pub const THEME: &str = "customTheme";
pub const BOARDS: &str = "boards";
pub const BY_ID: &str = "byId";

/// Declared schema version, 0 when absent or unreadable
pub fn version_of(root: &Object) -> u32 {
    root.get(VERSION)
        .or_else(|| root.get(LEGACY_VERSION))
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

pub fn set_version(root: &mut Object, version: u32) {
    root.remove(LEGACY_VERSION);
    root.insert(VERSION.to_string(), Value::from(version));
}

pub fn section<'r>(root: &'r Object, key: &str) -> Option<&'r Object> {
    root.get(key).and_then(Value::as_object)
}

pub fn section_mut<'r>(root: &'r mut Object, key: &str) -> Option<&'r mut Object> {
    root.get_mut(key).and_then(Value::as_object_mut)
}

/// Run `f` on every object entry of `root[section]`. Entries of any other
/// shape are reported and left as they are.
pub fn for_each_entry(
    root: &mut Object,
    section: &str,
    ctx: &mut MigrationContext<'_>,
    mut f: impl FnMut(&str, &mut Object, &mut MigrationContext<'_>),
) {
    let Some(entries) = section_mut(root, section) else {
        return;
    };
    for (key, entry) in entries.iter_mut() {
        match entry.as_object_mut() {
            Some(object) => f(key, object, ctx),
            None => ctx.skip(format!("{section}.{key}"), "entry is not an object"),
        }
    }
}

pub fn str_field<'o>(object: &'o Object, key: &str) -> Option<&'o str> {
    object.get(key).and_then(Value::as_str)
}

/// Ids listed under `key`, or `None` when the field is not a list of strings
pub fn id_list(object: &Object, key: &str) -> Option<Vec<String>> {
    object
        .get(key)?
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Insert `default` under `key` when the key is missing or null.
/// Returns false when the key holds a value of another type than `default`.
pub fn default_field(object: &mut Object, key: &str, default: Value) -> bool {
    match object.get(key) {
        None | Some(Value::Null) => {
            object.insert(key.to_string(), default);
            true
        }
        Some(existing) => same_type(existing, &default),
    }
}

fn same_type(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_version_falls_back_to_legacy_key() {
        assert_eq!(version_of(&object(json!({ "schemaVersion": 3 }))), 3);
        assert_eq!(version_of(&object(json!({ "version": "2" }))), 0);
        assert_eq!(version_of(&object(json!({}))), 0);
    }

    #[test]
    fn test_set_version_drops_legacy_key() {
        let mut root = object(json!({ "schemaVersion": 1 }));
        set_version(&mut root, 2);
        assert_eq!(Value::Object(root), json!({ "version": 2 }));
    }

    #[test]
    fn test_default_field_reports_type_mismatch() {
        let mut node = object(json!({ "children": "oops", "label": null }));
        assert!(!default_field(&mut node, "children", json!([])));
        assert!(default_field(&mut node, "label", json!("")));
        assert!(default_field(&mut node, "properties", json!({})));
        assert_eq!(node["label"], "");
        assert_eq!(node["children"], "oops");
    }

    #[test]
    fn test_id_list_rejects_mixed_entries() {
        let node = object(json!({ "a": ["x", "y"], "b": ["x", 3] }));
        assert_eq!(id_list(&node, "a"), Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(id_list(&node, "b"), None);
        assert_eq!(id_list(&node, "c"), None);
    }
}
