//! Schema fixes
//!
//! Repairs for catalog drift that never got a version number. They run on
//! every load, after the numbered migrations, and leave an already repaired
//! document untouched.

use crate::error::MigrationError;
use crate::raw::{id_list, section, section_mut, str_field, Object, BOARDS, BY_ID};
use crate::report::MigrationContext;
use crate::versioned::{densify_board_order, MigrationFn};
use designkit_model::{ComponentType, NodeId};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Clone, Copy)]
pub struct SchemaFix {
    pub name: &'static str,
    pub apply: MigrationFn,
}

impl fmt::Debug for SchemaFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaFix").field("name", &self.name).finish()
    }
}

pub fn builtin() -> Vec<SchemaFix> {
    vec![
        SchemaFix {
            name: "rename-component-types",
            apply: rename_component_types,
        },
        SchemaFix {
            name: "remove-retired-components",
            apply: remove_retired_components,
        },
    ]
}

/// Move everything filed under a renamed component type to its current name
pub fn rename_component_types(root: &mut Object, ctx: &mut MigrationContext<'_>) -> Result<(), MigrationError> {
    let renames: Vec<(ComponentType, ComponentType)> = ctx
        .catalog
        .renamed()
        .iter()
        .map(|(from, to)| (from.clone(), to.clone()))
        .collect();

    for (from, to) in &renames {
        rename(root, from, to, ctx);
    }
    Ok(())
}

fn rename(root: &mut Object, from: &ComponentType, to: &ComponentType, ctx: &mut MigrationContext<'_>) {
    let mut ids: HashMap<String, String> = HashMap::new();
    let mut typed = 0;
    let mut conflicts = Vec::new();

    if let Some(nodes) = section(root, BY_ID) {
        for (id, node) in nodes {
            let Some(node) = node.as_object() else {
                continue;
            };
            if str_field(node, "componentType") != Some(from.as_str()) {
                continue;
            }
            typed += 1;
            if let Some(renamed) = NodeId::from(id.as_str()).renamespaced(from, to) {
                if nodes.contains_key(renamed.as_str()) {
                    conflicts.push(id.clone());
                } else {
                    ids.insert(id.clone(), renamed.to_string());
                }
            }
        }
    }

    let boards = section(root, BOARDS);
    let has_board = boards.map(|b| b.contains_key(from.as_str())).unwrap_or(false);
    let target_taken = boards.map(|b| b.contains_key(to.as_str())).unwrap_or(false);
    if typed == 0 && !has_board {
        return;
    }
    if has_board && target_taken {
        ctx.skip(format!("boards.{from}"), format!("cannot rename to {to}: board already exists"));
        return;
    }
    if !conflicts.is_empty() {
        for id in conflicts {
            ctx.skip(format!("byId.{id}"), format!("cannot rename to {to}: id already taken"));
        }
        return;
    }

    if let Some(boards) = section_mut(root, BOARDS) {
        if let Some(mut board) = boards.remove(from.as_str()) {
            if let Some(board) = board.as_object_mut() {
                board.insert("componentType".to_string(), Value::String(to.to_string()));
            }
            boards.insert(to.to_string(), board);
        }
        for board in boards.values_mut().filter_map(Value::as_object_mut) {
            remap_list(board, "variants", &ids);
        }
    }

    if let Some(nodes) = section_mut(root, BY_ID) {
        for (old, new) in &ids {
            if let Some(node) = nodes.remove(old) {
                nodes.insert(new.clone(), node);
            }
        }
        for node in nodes.values_mut().filter_map(Value::as_object_mut) {
            if str_field(node, "componentType") == Some(from.as_str()) {
                node.insert("componentType".to_string(), Value::String(to.to_string()));
            }
            for field in ["id", "derivesFrom", "ownerVariant"] {
                remap_field(node, field, &ids);
            }
            remap_list(node, "children", &ids);
        }
    }

    tracing::info!(%from, %to, nodes = typed, ids = ids.len(), "renamed component type");
}

fn remap_field(object: &mut Object, key: &str, ids: &HashMap<String, String>) {
    let Some(Value::String(id)) = object.get_mut(key) else {
        return;
    };
    if let Some(renamed) = ids.get(id.as_str()) {
        *id = renamed.clone();
    }
}

fn remap_list(object: &mut Object, key: &str, ids: &HashMap<String, String>) {
    let Some(Value::Array(list)) = object.get_mut(key) else {
        return;
    };
    for entry in list.iter_mut() {
        if let Value::String(id) = entry {
            if let Some(renamed) = ids.get(id.as_str()) {
                *id = renamed.clone();
            }
        }
    }
}

/// Drop boards and nodes of retired component types, together with every
/// node that can no longer resolve its template, owner or parent
pub fn remove_retired_components(root: &mut Object, ctx: &mut MigrationContext<'_>) -> Result<(), MigrationError> {
    let retired = ctx.catalog.retired();
    if retired.is_empty() {
        return Ok(());
    }
    let is_retired = |component_type: Option<&str>| {
        component_type
            .map(|c| retired.contains(c))
            .unwrap_or(false)
    };

    let mut dead_boards = Vec::new();
    let mut doomed: HashSet<String> = HashSet::new();
    if let Some(boards) = section(root, BOARDS) {
        for (key, board) in boards {
            let typed_retired = board
                .as_object()
                .map(|b| is_retired(str_field(b, "componentType")))
                .unwrap_or(false);
            if retired.contains(key.as_str()) || typed_retired {
                dead_boards.push(key.clone());
                if let Some(variants) = board.as_object().and_then(|b| id_list(b, "variants")) {
                    doomed.extend(variants);
                }
            }
        }
    }

    if let Some(nodes) = section(root, BY_ID) {
        // (id, ids it depends on)
        let mut links: Vec<(String, Vec<String>)> = Vec::new();
        let mut parents: HashMap<String, String> = HashMap::new();
        for (id, node) in nodes {
            let Some(node) = node.as_object() else {
                continue;
            };
            if is_retired(str_field(node, "componentType")) {
                doomed.insert(id.clone());
            }
            for child in id_list(node, "children").unwrap_or_default() {
                parents.insert(child, id.clone());
            }
            let refs = ["derivesFrom", "ownerVariant"]
                .iter()
                .filter_map(|field| str_field(node, field).map(str::to_string))
                .collect();
            links.push((id.clone(), refs));
        }
        for (id, refs) in &mut links {
            if let Some(parent) = parents.get(id.as_str()) {
                refs.push(parent.clone());
            }
        }

        let mut changed = !doomed.is_empty();
        while changed {
            changed = false;
            for (id, refs) in &links {
                if !doomed.contains(id) && refs.iter().any(|r| doomed.contains(r)) {
                    doomed.insert(id.clone());
                    changed = true;
                }
            }
        }
    }

    if dead_boards.is_empty() && doomed.is_empty() {
        return Ok(());
    }

    if let Some(nodes) = section_mut(root, BY_ID) {
        nodes.retain(|id, _| !doomed.contains(id));
        for node in nodes.values_mut().filter_map(Value::as_object_mut) {
            strip_list(node, "children", &doomed);
        }
    }
    if let Some(boards) = section_mut(root, BOARDS) {
        boards.retain(|key, _| !dead_boards.contains(key));
        for board in boards.values_mut().filter_map(Value::as_object_mut) {
            strip_list(board, "variants", &doomed);
        }
    }
    if !dead_boards.is_empty() {
        densify_board_order(root);
    }

    tracing::info!(
        boards = dead_boards.len(),
        nodes = doomed.len(),
        "removed retired components"
    );
    Ok(())
}

fn strip_list(object: &mut Object, key: &str, doomed: &HashSet<String>) {
    if let Some(Value::Array(list)) = object.get_mut(key) {
        list.retain(|entry| entry.as_str().map(|id| !doomed.contains(id)).unwrap_or(true));
    }
}
