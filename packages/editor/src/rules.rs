//! # Rule Table
//!
//! Static policy for every (operation, entity kind) pair: whether the
//! operation is allowed, how far its effects propagate, and for removal
//! whether the node is deleted or hidden.
//!
//! A disallowed operation is not an error. The engine answers it with a no-op
//! so stale requests from an editor UI are harmless.

use designkit_model::Node;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Create,
    Insert,
    Delete,
    Duplicate,
    Move,
    Reorder,
    SetProperty,
    SetTheme,
    SetLabel,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Create => "create",
            OperationKind::Insert => "insert",
            OperationKind::Delete => "delete",
            OperationKind::Duplicate => "duplicate",
            OperationKind::Move => "move",
            OperationKind::Reorder => "reorder",
            OperationKind::SetProperty => "setProperty",
            OperationKind::SetTheme => "setTheme",
            OperationKind::SetLabel => "setLabel",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Board,
    DefaultVariant,
    UserVariant,
    Instance,
}

impl EntityKind {
    pub fn of(node: &Node) -> Self {
        match node {
            Node::Instance(_) => EntityKind::Instance,
            Node::Variant(_) if node.is_default_variant() => EntityKind::DefaultVariant,
            Node::Variant(_) => EntityKind::UserVariant,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Board => "board",
            EntityKind::DefaultVariant => "default variant",
            EntityKind::UserVariant => "user variant",
            EntityKind::Instance => "instance",
        };
        f.write_str(name)
    }
}

/// How far a mutation's mirrored effects reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropagationScope {
    /// Only the named node
    None,
    /// The named node and every node deriving from it, transitively
    Instances,
    /// The named node's own subtree, plus the mirrors of every node in it
    Descendants,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemovalMode {
    /// Strip from the tree and the registry, cascading to mirrors
    Delete,
    /// Keep the slot, set the display-suppression override
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalBehavior {
    Fixed(RemovalMode),
    BySource {
        schema_defined: RemovalMode,
        manually_added: RemovalMode,
    },
}

impl RemovalBehavior {
    pub fn resolve(self, from_schema: bool) -> RemovalMode {
        match self {
            RemovalBehavior::Fixed(mode) => mode,
            RemovalBehavior::BySource {
                schema_defined,
                manually_added,
            } => {
                if from_schema {
                    schema_defined
                } else {
                    manually_added
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rule {
    pub allowed: bool,
    pub scope: PropagationScope,
    pub removal: Option<RemovalBehavior>,
}

impl Rule {
    const fn allow(scope: PropagationScope) -> Self {
        Self {
            allowed: true,
            scope,
            removal: None,
        }
    }

    const fn remove(scope: PropagationScope, behavior: RemovalBehavior) -> Self {
        Self {
            allowed: true,
            scope,
            removal: Some(behavior),
        }
    }

    const fn deny() -> Self {
        Self {
            allowed: false,
            scope: PropagationScope::None,
            removal: None,
        }
    }
}

/// Policy lookup
pub const fn rule(op: OperationKind, entity: EntityKind) -> Rule {
    use EntityKind as E;
    use OperationKind as Op;
    use PropagationScope as S;

    match (op, entity) {
        (Op::Create, E::Board) => Rule::allow(S::None),
        (Op::Create, _) => Rule::deny(),

        (Op::Insert, E::Board) => Rule::deny(),
        (Op::Insert, _) => Rule::allow(S::Instances),

        (Op::Delete, E::Board) => Rule::remove(S::None, RemovalBehavior::Fixed(RemovalMode::Delete)),
        (Op::Delete, E::DefaultVariant) => Rule::deny(),
        (Op::Delete, E::UserVariant) => {
            Rule::remove(S::Instances, RemovalBehavior::Fixed(RemovalMode::Delete))
        }
        (Op::Delete, E::Instance) => Rule::remove(
            S::Instances,
            RemovalBehavior::BySource {
                schema_defined: RemovalMode::Hide,
                manually_added: RemovalMode::Delete,
            },
        ),

        (Op::Duplicate, E::Board) => Rule::deny(),
        (Op::Duplicate, E::DefaultVariant | E::UserVariant) => Rule::allow(S::None),
        (Op::Duplicate, E::Instance) => Rule::allow(S::Instances),

        (Op::Move, E::Instance) => Rule::allow(S::Instances),
        (Op::Move, _) => Rule::deny(),

        (Op::Reorder, E::Instance) => Rule::allow(S::Instances),
        (Op::Reorder, _) => Rule::allow(S::None),

        (Op::SetProperty, E::Board) => Rule::allow(S::None),
        (Op::SetProperty, _) => Rule::allow(S::Instances),

        (Op::SetTheme, E::Board) => Rule::allow(S::None),
        (Op::SetTheme, E::DefaultVariant | E::UserVariant) => Rule::allow(S::Descendants),
        (Op::SetTheme, E::Instance) => Rule::allow(S::Instances),

        (Op::SetLabel, _) => Rule::allow(S::None),
    }
}
