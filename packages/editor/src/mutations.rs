//! # Mutations
//!
//! Closed set of editing operations on a design document.
//!
//! ## Semantics
//!
//! Every mutation names one target (a node or a board). The rule table decides
//! whether the operation is allowed for that target's entity kind and how far
//! it propagates. The engine then applies the edit to the target and to every
//! mirror the scope reaches.
//!
//! ### Outcomes
//! - Unknown node or board → `Err`
//! - Operation denied by the rule table → `Outcome::Noop`, document unchanged
//! - Index out of range, missing destination → `Outcome::Noop`
//! - Otherwise → `Outcome::Applied` with the new document
//!
//! ### Insert
//! - Instantiates the template's whole subtree under the parent
//! - Every mirror of the parent receives a copy at the counterpart position,
//!   deriving from the new child rather than from the template
//!
//! ### Remove
//! - Schema-defined instances are hidden, never deleted
//! - Anything else is deleted together with every node mirroring it
//!
//! ### Move
//! - Fails closed: a missing destination or a schema-defined node changing
//!   parent leaves the document untouched

use crate::propagation::{LocalEdit, Propagator};
use crate::rules::{rule, EntityKind, OperationKind, Rule};
use designkit_model::{ComponentType, Document, Level, NodeId, SchemaCatalog, ThemeRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Editing operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    /// Create the board and default variant of a catalog component
    AddComponent { component_type: ComponentType },

    /// Create a user variant mirroring the board's default variant
    AddVariant { component_type: ComponentType },

    /// Place an instance of `template_id` at `index` of `parent_id`
    InsertInstance {
        parent_id: NodeId,
        index: usize,
        template_id: NodeId,
    },

    Remove { node_id: NodeId },

    RemoveBoard { component_type: ComponentType },

    Duplicate { node_id: NodeId },

    MoveNode {
        node_id: NodeId,
        new_parent_id: NodeId,
        index: usize,
    },

    ReorderChild { node_id: NodeId, new_index: usize },

    ReorderVariant { variant_id: NodeId, new_index: usize },

    ReorderBoard {
        component_type: ComponentType,
        new_index: usize,
    },

    SetProperty {
        node_id: NodeId,
        key: String,
        value: Value,
    },

    RemoveProperty { node_id: NodeId, key: String },

    /// `None` clears the node's theme override
    SetTheme {
        node_id: NodeId,
        theme: Option<ThemeRef>,
    },

    SetLabel { node_id: NodeId, label: String },

    SetBoardProperty {
        component_type: ComponentType,
        key: String,
        value: Value,
    },

    SetBoardTheme {
        component_type: ComponentType,
        theme: ThemeRef,
    },

    SetBoardLabel {
        component_type: ComponentType,
        label: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("Would create cycle: {0}")]
    CycleDetected(String),

    #[error("{child} (level {}) cannot be placed inside {parent} (level {})", .child_level.rank(), .parent_level.rank())]
    LevelViolation {
        parent: String,
        parent_level: Level,
        child: String,
        child_level: Level,
    },

    #[error("Unknown component type: {0}")]
    UnknownComponent(String),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

/// Why a mutation left the document unchanged
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NoopReason {
    Denied {
        operation: OperationKind,
        entity: EntityKind,
    },
    IndexOutOfRange { index: usize, len: usize },
    MissingDestination { id: String },
    /// Schema-defined nodes keep their parent
    SchemaDefinedMove { node_id: NodeId },
    /// Schema-defined children of a mirror follow their template's order
    SchemaOrderLocked { node_id: NodeId },
    /// Node is not attached to any parent
    Detached { node_id: NodeId },
    /// The default variant stays first on its board
    DefaultVariantPinned { variant_id: NodeId },
    AlreadyExists { component_type: ComponentType },
}

impl fmt::Display for NoopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoopReason::Denied { operation, entity } => {
                write!(f, "{operation} is not allowed on a {entity}")
            }
            NoopReason::IndexOutOfRange { index, len } => {
                write!(f, "index {index} is out of range for length {len}")
            }
            NoopReason::MissingDestination { id } => write!(f, "destination {id} does not exist"),
            NoopReason::SchemaDefinedMove { node_id } => {
                write!(f, "{node_id} is schema-defined and cannot change parent")
            }
            NoopReason::SchemaOrderLocked { node_id } => {
                write!(f, "{node_id} is schema-defined and follows its template's order")
            }
            NoopReason::Detached { node_id } => write!(f, "{node_id} has no parent"),
            NoopReason::DefaultVariantPinned { variant_id } => {
                write!(f, "{variant_id} must stay first on its board")
            }
            NoopReason::AlreadyExists { component_type } => {
                write!(f, "board {component_type} already exists")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    Applied,
    Noop { reason: NoopReason },
}

/// Ids created by a mutation, for callers that need to refer to them next
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedNodes {
    /// Node the mutation created directly
    pub root: Option<NodeId>,
    /// Descendants of `root`, keyed by child-index path (`"0"`, `"0.1"`, ...)
    pub by_path: BTreeMap<String, NodeId>,
    /// Roots of the copies created in mirrors
    pub mirrors: Vec<NodeId>,
    pub boards: Vec<ComponentType>,
}

impl CreatedNodes {
    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.mirrors.is_empty() && self.boards.is_empty()
    }

    /// Descendant of the created root at `path`
    pub fn at(&self, path: &str) -> Option<&NodeId> {
        self.by_path.get(path)
    }

    /// Record `root` and the position path of each of its descendants
    pub(crate) fn record_tree(&mut self, doc: &Document, root: &NodeId) {
        self.root = Some(root.clone());
        let mut stack: Vec<(String, NodeId)> = Vec::new();
        if let Some(node) = doc.node(root.as_str()) {
            for (i, child) in node.children().iter().enumerate().rev() {
                stack.push((i.to_string(), child.clone()));
            }
        }
        while let Some((path, id)) = stack.pop() {
            if let Some(node) = doc.node(id.as_str()) {
                for (i, child) in node.children().iter().enumerate().rev() {
                    stack.push((format!("{path}.{i}"), child.clone()));
                }
            }
            self.by_path.insert(path, id);
        }
    }
}

/// Result of applying one mutation
#[derive(Debug, Clone)]
pub struct MutationResult {
    pub document: Document,
    pub outcome: Outcome,
    pub created: CreatedNodes,
}

impl MutationResult {
    fn noop(doc: &Document, reason: NoopReason) -> Self {
        Self {
            document: doc.clone(),
            outcome: Outcome::Noop { reason },
            created: CreatedNodes::default(),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }

    pub fn is_noop(&self) -> bool {
        !self.is_applied()
    }
}

/// Internal result of running one handler
pub(crate) enum Step {
    Applied,
    Noop(NoopReason),
}

impl Mutation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Mutation::AddComponent { .. } | Mutation::AddVariant { .. } => OperationKind::Create,
            Mutation::InsertInstance { .. } => OperationKind::Insert,
            Mutation::Remove { .. } | Mutation::RemoveBoard { .. } => OperationKind::Delete,
            Mutation::Duplicate { .. } => OperationKind::Duplicate,
            Mutation::MoveNode { .. } => OperationKind::Move,
            Mutation::ReorderChild { .. }
            | Mutation::ReorderVariant { .. }
            | Mutation::ReorderBoard { .. } => OperationKind::Reorder,
            Mutation::SetProperty { .. }
            | Mutation::RemoveProperty { .. }
            | Mutation::SetBoardProperty { .. } => OperationKind::SetProperty,
            Mutation::SetTheme { .. } | Mutation::SetBoardTheme { .. } => OperationKind::SetTheme,
            Mutation::SetLabel { .. } | Mutation::SetBoardLabel { .. } => OperationKind::SetLabel,
        }
    }

    /// Entity kind of the mutation's target
    pub fn target_kind(&self, doc: &Document) -> Result<EntityKind, MutationError> {
        let node_id = match self {
            Mutation::AddComponent { .. }
            | Mutation::AddVariant { .. }
            | Mutation::RemoveBoard { .. }
            | Mutation::ReorderBoard { .. }
            | Mutation::SetBoardProperty { .. }
            | Mutation::SetBoardTheme { .. }
            | Mutation::SetBoardLabel { .. } => return Ok(EntityKind::Board),
            Mutation::InsertInstance { parent_id, .. } => parent_id,
            Mutation::ReorderVariant { variant_id, .. } => variant_id,
            Mutation::Remove { node_id }
            | Mutation::Duplicate { node_id }
            | Mutation::MoveNode { node_id, .. }
            | Mutation::ReorderChild { node_id, .. }
            | Mutation::SetProperty { node_id, .. }
            | Mutation::RemoveProperty { node_id, .. }
            | Mutation::SetTheme { node_id, .. }
            | Mutation::SetLabel { node_id, .. } => node_id,
        };

        doc.node(node_id.as_str())
            .map(EntityKind::of)
            .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))
    }

    /// Apply to `doc`, returning the new document. `doc` itself is never modified.
    pub fn apply(
        &self,
        doc: &Document,
        catalog: &SchemaCatalog,
    ) -> Result<MutationResult, MutationError> {
        let operation = self.kind();
        let entity = self.target_kind(doc)?;
        let rule = rule(operation, entity);

        if !rule.allowed {
            tracing::debug!(%operation, %entity, "operation denied by rule table");
            return Ok(MutationResult::noop(doc, NoopReason::Denied { operation, entity }));
        }

        let mut engine = Propagator::new(doc.clone(), catalog);
        match self.execute(&mut engine, rule)? {
            Step::Applied => {
                let (document, created) = engine.finish();
                Ok(MutationResult {
                    document,
                    outcome: Outcome::Applied,
                    created,
                })
            }
            Step::Noop(reason) => {
                tracing::debug!(%operation, %reason, "mutation left document unchanged");
                Ok(MutationResult::noop(doc, reason))
            }
        }
    }

    fn execute(&self, engine: &mut Propagator<'_>, rule: Rule) -> Result<Step, MutationError> {
        match self {
            Mutation::AddComponent { component_type } => engine.add_component(component_type),
            Mutation::AddVariant { component_type } => engine.add_variant(component_type),
            Mutation::InsertInstance {
                parent_id,
                index,
                template_id,
            } => engine.insert_instance(parent_id, *index, template_id),
            Mutation::Remove { node_id } => engine.remove(node_id, rule),
            Mutation::RemoveBoard { component_type } => engine.remove_board(component_type),
            Mutation::Duplicate { node_id } => engine.duplicate(node_id),
            Mutation::MoveNode {
                node_id,
                new_parent_id,
                index,
            } => engine.move_node(node_id, new_parent_id, *index, rule.scope),
            Mutation::ReorderChild { node_id, new_index } => {
                engine.reorder_child(node_id, *new_index, rule.scope)
            }
            Mutation::ReorderVariant {
                variant_id,
                new_index,
            } => engine.reorder_variant(variant_id, *new_index),
            Mutation::ReorderBoard {
                component_type,
                new_index,
            } => engine.reorder_board(component_type, *new_index),
            Mutation::SetProperty {
                node_id,
                key,
                value,
            } => engine.edit(
                node_id,
                &LocalEdit::SetProperty {
                    key: key.clone(),
                    value: value.clone(),
                },
                rule.scope,
            ),
            Mutation::RemoveProperty { node_id, key } => {
                engine.edit(node_id, &LocalEdit::RemoveProperty { key: key.clone() }, rule.scope)
            }
            Mutation::SetTheme { node_id, theme } => {
                engine.edit(node_id, &LocalEdit::SetTheme(theme.clone()), rule.scope)
            }
            Mutation::SetLabel { node_id, label } => {
                engine.edit(node_id, &LocalEdit::SetLabel(label.clone()), rule.scope)
            }
            Mutation::SetBoardProperty {
                component_type,
                key,
                value,
            } => engine.update_board(component_type, |board| {
                board.properties.insert(key.clone(), value.clone());
            }),
            Mutation::SetBoardTheme {
                component_type,
                theme,
            } => engine.update_board(component_type, |board| board.theme = theme.clone()),
            Mutation::SetBoardLabel {
                component_type,
                label,
            } => engine.update_board(component_type, |board| board.label = label.clone()),
        }
    }
}

/// Apply `mutation` to `doc`
pub fn apply(
    doc: &Document,
    catalog: &SchemaCatalog,
    mutation: &Mutation,
) -> Result<MutationResult, MutationError> {
    mutation.apply(doc, catalog)
}
