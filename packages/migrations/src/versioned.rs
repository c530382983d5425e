//! Numbered migrations
//!
//! Each one upgrades the persisted shape by one step and records its own
//! version number when done. The pipeline never advances `version` itself.

use crate::error::MigrationError;
use crate::raw::{
    default_field, for_each_entry, id_list, section, section_mut, set_version, str_field, Object,
    BOARDS, BY_ID, THEME,
};
use crate::report::MigrationContext;
use designkit_model::{system_default_theme, ComponentType, NodeId, NodeKind, HIDDEN_PROPERTY};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;

pub type MigrationFn = fn(&mut Object, &mut MigrationContext<'_>) -> Result<(), MigrationError>;

/// Migration that runs when the document's version is below `version`
#[derive(Clone, Copy)]
pub struct VersionedMigration {
    pub version: u32,
    pub name: &'static str,
    pub apply: MigrationFn,
}

impl fmt::Debug for VersionedMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedMigration")
            .field("version", &self.version)
            .field("name", &self.name)
            .finish()
    }
}

/// Theme presets that map onto the system default theme
const SYSTEM_PRESETS: &[&str] = &["system", "default"];

/// Theme presets that were dropped without a replacement
const OBSOLETE_PRESETS: &[&str] = &["classic", "flat-2015", "material-v1"];

pub fn builtin() -> Vec<VersionedMigration> {
    vec![
        VersionedMigration {
            version: 1,
            name: "baseline",
            apply: baseline,
        },
        VersionedMigration {
            version: 2,
            name: "visibility-to-hidden",
            apply: visibility_to_hidden,
        },
        VersionedMigration {
            version: 3,
            name: "recompute-theme",
            apply: recompute_theme,
        },
        VersionedMigration {
            version: 4,
            name: "derivation-links",
            apply: derivation_links,
        },
        VersionedMigration {
            version: 5,
            name: "dense-board-order",
            apply: dense_board_order,
        },
    ]
}

/// Fill in every field later code expects. Leaves `version` alone.
pub fn baseline(root: &mut Object, ctx: &mut MigrationContext<'_>) -> Result<(), MigrationError> {
    default_field(root, THEME, system_default_theme());

    for key in [BOARDS, BY_ID] {
        if !default_field(root, key, json!({})) {
            ctx.skip(key, "section is not an object, replaced with an empty one");
            root.insert(key.to_string(), json!({}));
        }
    }

    for_each_entry(root, BOARDS, ctx, |key, board, ctx| {
        let label = ctx
            .catalog
            .get(key)
            .map(|schema| schema.label.clone())
            .unwrap_or_else(|| key.to_string());
        let defaults = [
            ("componentType", Value::String(key.to_string())),
            ("label", Value::String(label)),
            ("order", json!(0)),
            ("theme", json!("default")),
            ("properties", json!({})),
            ("variants", json!([])),
        ];
        for (field, default) in defaults {
            if !default_field(board, field, default) {
                ctx.skip(format!("boards.{key}"), format!("{field} has the wrong type"));
            }
        }
    });

    for_each_entry(root, BY_ID, ctx, |key, node, ctx| {
        for (field, default) in [("properties", json!({})), ("children", json!([]))] {
            if !default_field(node, field, default) {
                ctx.skip(format!("byId.{key}"), format!("{field} has the wrong type"));
            }
        }
    });

    Ok(())
}

/// `visible: false` becomes a `hidden` property override
pub fn visibility_to_hidden(root: &mut Object, ctx: &mut MigrationContext<'_>) -> Result<(), MigrationError> {
    for_each_entry(root, BY_ID, ctx, |key, node, ctx| {
        let Some(visible) = node.remove("visible") else {
            return;
        };
        if visible != Value::Bool(false) {
            return;
        }
        if !default_field(node, "properties", json!({})) {
            node.insert("visible".to_string(), visible);
            ctx.skip(format!("byId.{key}"), "properties has the wrong type");
            return;
        }
        if let Some(properties) = node.get_mut("properties").and_then(Value::as_object_mut) {
            properties.insert(HIDDEN_PROPERTY.to_string(), Value::Bool(true));
        }
    });

    set_version(root, 2);
    Ok(())
}

/// Run the stored theme through the injected theme computer
pub fn recompute_theme(root: &mut Object, ctx: &mut MigrationContext<'_>) -> Result<(), MigrationError> {
    let theme = match root.remove(THEME) {
        None | Some(Value::Null) => system_default_theme(),
        Some(Value::String(preset)) if SYSTEM_PRESETS.contains(&preset.as_str()) => system_default_theme(),
        Some(Value::String(preset)) => return Err(MigrationError::UnsupportedTheme(preset)),
        Some(Value::Object(theme)) => {
            if let Some(preset) = theme.get("preset").and_then(Value::as_str) {
                if OBSOLETE_PRESETS.contains(&preset) {
                    return Err(MigrationError::UnsupportedTheme(preset.to_string()));
                }
            }
            Value::Object(theme)
        }
        Some(other) => return Err(MigrationError::UnsupportedTheme(other.to_string())),
    };

    root.insert(THEME.to_string(), ctx.theme_computer.compute(&theme));
    set_version(root, 3);
    Ok(())
}

/// Variant or instance, from `isChild` or else the id prefix
fn is_child(id: &str, node: &Object) -> Option<bool> {
    node.get("isChild")
        .and_then(Value::as_bool)
        .or_else(|| NodeId::from(id).prefix_kind().map(|kind| kind == NodeKind::Instance))
}

/// Make every derivation link explicit.
///
/// Default variants are marked schema-provided, user variants without a
/// template point at their board's default variant, and instances without an
/// owner take the owner of the nearest ancestor that has one.
pub fn derivation_links(root: &mut Object, ctx: &mut MigrationContext<'_>) -> Result<(), MigrationError> {
    let mut parents: HashMap<String, String> = HashMap::new();
    let mut kinds: HashMap<String, bool> = HashMap::new();
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut present: HashSet<String> = HashSet::new();

    if let Some(nodes) = section(root, BY_ID) {
        for (id, node) in nodes {
            let Some(node) = node.as_object() else {
                continue;
            };
            present.insert(id.clone());
            if let Some(child_kind) = is_child(id, node) {
                kinds.insert(id.clone(), child_kind);
            }
            if let Some(owner) = str_field(node, "ownerVariant") {
                owners.insert(id.clone(), owner.to_string());
            }
            for child in id_list(node, "children").unwrap_or_default() {
                parents.entry(child).or_insert_with(|| id.clone());
            }
        }
    }

    let owner_of = |id: &str| -> Option<String> {
        let mut seen = HashSet::new();
        let mut cursor = parents.get(id)?;
        while seen.insert(cursor.clone()) {
            if kinds.get(cursor) == Some(&false) {
                return Some(cursor.clone());
            }
            if let Some(owner) = owners.get(cursor) {
                return Some(owner.clone());
            }
            cursor = parents.get(cursor)?;
        }
        None
    };

    for_each_entry(root, BY_ID, ctx, |id, node, ctx| {
        let path = format!("byId.{id}");
        let Some(child_kind) = kinds.get(id).copied() else {
            ctx.skip(path, "cannot tell a variant from an instance");
            return;
        };
        node.insert("isChild".to_string(), Value::Bool(child_kind));
        let Some(component_type) = str_field(node, "componentType").map(ComponentType::new) else {
            ctx.skip(path, "componentType is missing");
            return;
        };

        if child_kind {
            if str_field(node, "ownerVariant").is_none() {
                match owner_of(id) {
                    Some(owner) => {
                        node.insert("ownerVariant".to_string(), Value::String(owner));
                    }
                    None => ctx.skip(path.clone(), "instance has no owner variant"),
                }
            }
            if str_field(node, "derivesFrom").is_none() {
                ctx.skip(path, "instance has no template");
            }
            return;
        }

        let default = NodeId::default_variant(&component_type);
        if id == default.as_str() {
            node.insert("fromSchema".to_string(), Value::Bool(true));
            node.remove("derivesFrom");
            return;
        }
        node.insert("fromSchema".to_string(), Value::Bool(false));
        if str_field(node, "derivesFrom").is_none() {
            if present.contains(default.as_str()) {
                node.insert("derivesFrom".to_string(), Value::String(default.to_string()));
            } else {
                ctx.skip(path, "user variant has no template");
            }
        }
    });

    set_version(root, 4);
    Ok(())
}

pub fn dense_board_order(root: &mut Object, _ctx: &mut MigrationContext<'_>) -> Result<(), MigrationError> {
    densify_board_order(root);
    set_version(root, 5);
    Ok(())
}

/// Rewrite board orders to `0..N-1`, keeping the relative order and breaking
/// ties by component type
pub(crate) fn densify_board_order(root: &mut Object) {
    let Some(boards) = section_mut(root, BOARDS) else {
        return;
    };

    let mut ordered: Vec<(u64, String)> = boards
        .iter()
        .filter_map(|(key, board)| {
            let board = board.as_object()?;
            let order = board.get("order").and_then(Value::as_u64).unwrap_or(u64::MAX);
            Some((order, key.clone()))
        })
        .collect();
    ordered.sort();

    for (position, (_, key)) in ordered.iter().enumerate() {
        if let Some(board) = boards.get_mut(key).and_then(Value::as_object_mut) {
            board.insert("order".to_string(), json!(position));
        }
    }
}
