//! # Document
//!
//! The whole workspace: theme, boards and the node registry.
//!
//! A `Document` is a value. Cloning it shares structure with the original,
//! and every edit goes through a clone, so whoever holds the previous value
//! keeps seeing it unchanged.

use crate::board::Board;
use crate::error::ModelError;
use crate::ids::{ComponentType, NodeId, NodeKind};
use crate::node::{Node, HIDDEN_PROPERTY};
use crate::theme::{system_default_theme, Theme, ThemeRef};
use im::OrdMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Governs which migrations still have to run
    #[serde(rename = "version", alias = "schemaVersion", default)]
    pub schema_version: u32,

    #[serde(rename = "customTheme", default = "system_default_theme")]
    pub theme: Theme,

    #[serde(default)]
    pub boards: OrdMap<ComponentType, Board>,

    #[serde(rename = "byId", default)]
    pub registry: OrdMap<NodeId, Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::empty(0)
    }
}

impl Document {
    /// Empty document declared at `schema_version`
    pub fn empty(schema_version: u32) -> Self {
        Self {
            schema_version,
            theme: system_default_theme(),
            boards: OrdMap::new(),
            registry: OrdMap::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.registry.get(id)
    }

    /// Look up a node that must exist
    pub fn require_node(&self, id: &str) -> Result<&Node, ModelError> {
        self.registry
            .get(id)
            .ok_or_else(|| ModelError::NodeNotFound(id.to_string()))
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.registry.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.registry.contains_key(id)
    }

    pub fn insert_node(&mut self, node: Node) {
        self.registry.insert(node.id().clone(), node);
    }

    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        self.registry.remove(id)
    }

    pub fn board(&self, component_type: &str) -> Option<&Board> {
        self.boards.get(component_type)
    }

    pub fn board_mut(&mut self, component_type: &str) -> Option<&mut Board> {
        self.boards.get_mut(component_type)
    }

    /// Boards sorted by display order
    pub fn boards_in_order(&self) -> Vec<&Board> {
        let mut boards: Vec<&Board> = self.boards.values().collect();
        boards.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.component_type.cmp(&b.component_type))
        });
        boards
    }

    /// Default variant of a component type, if its board exists
    pub fn default_variant(&self, component_type: &str) -> Option<&NodeId> {
        self.board(component_type)?.variants.iter().find(|id| {
            self.node(id.as_str())
                .map(Node::is_default_variant)
                .unwrap_or(false)
        })
    }

    /// `id` followed by all of its owned descendants, in pre-order.
    ///
    /// Dangling child ids are skipped.
    pub fn subtree(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![NodeId::new(id)];

        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(node) = self.node(current.as_str()) else {
                continue;
            };
            stack.extend(node.children().iter().rev().cloned());
            out.push(current);
        }

        out
    }

    /// Nodes `id` inherits from: `id` itself, then each `derives_from` link
    /// in turn. Stops at the first missing node or repeated id.
    pub fn lineage(&self, id: &str) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = self.node(id);
        while let Some(node) = cursor {
            if !seen.insert(node.id()) {
                break;
            }
            out.push(node);
            cursor = node.derives_from().and_then(|t| self.node(t.as_str()));
        }
        out
    }

    /// Effective value of property `key` on `id`: the node's own value, or
    /// the nearest one along its derivation chain
    pub fn resolved_property(&self, id: &str, key: &str) -> Option<&Value> {
        self.lineage(id)
            .into_iter()
            .find_map(|node| node.data().properties.get(key))
    }

    /// Effective theme override of `id`, resolved like properties
    pub fn resolved_theme(&self, id: &str) -> Option<&ThemeRef> {
        self.lineage(id)
            .into_iter()
            .find_map(|node| node.data().theme.as_ref())
    }

    /// Whether `id` is suppressed by its own or an inherited `hidden` override
    pub fn is_hidden(&self, id: &str) -> bool {
        self.resolved_property(id, HIDDEN_PROPERTY) == Some(&Value::Bool(true))
    }

    /// Parent whose child list contains `id`
    pub fn parent_of(&self, id: &str) -> Option<&NodeId> {
        self.registry
            .iter()
            .find(|(_, node)| node.children().iter().any(|c| c.as_str() == id))
            .map(|(parent_id, _)| parent_id)
    }

    /// Allocate an unused id of `kind` under `component_type`.
    ///
    /// Discriminators are the smallest positive integer not yet taken, so id
    /// allocation depends only on the document contents.
    pub fn allocate_id(&self, kind: NodeKind, component_type: &ComponentType) -> NodeId {
        let mut n: u64 = 1;
        loop {
            let candidate = NodeId::compose(kind, component_type, &n.to_string());
            if !self.contains(candidate.as_str()) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Strict decode: any malformed entry fails the whole document
    pub fn from_json(source: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(source)?)
    }
}
