//! # Propagation Engine
//!
//! Applies an edit to a node and re-derives the matching edit for every node
//! that mirrors it.
//!
//! ## Design
//!
//! An edit is never replayed on a mirror's id. Instead the engine finds the
//! mirror's counterpart of the edited location, e.g. "the child of `M` that
//! derives from the child that was just inserted into `T`", and edits that.
//!
//! ```text
//! variant-button-default ──▶ [child-text-1]            (template)
//!          ▲ derives_from          ▲ derives_from
//! child-button-4          ──▶ [child-text-5]            (mirror)
//! ```
//!
//! Mirror sets are computed breadth-first over the [`DerivationIndex`] with a
//! seen-set, so shared subtrees are visited once and malformed cyclic data
//! terminates.
//!
//! Instances are sparse: a node only stores the properties and theme it sets
//! itself, and everything else resolves through its `derives_from` chain
//! (see [`Document::resolved_property`]). A mirror that carries its own value
//! for the edited field holds a local override. Edits to its template leave
//! it alone, and the mirrors below it keep seeing the override.

use crate::index::DerivationIndex;
use crate::mutations::{CreatedNodes, MutationError, NoopReason, Step};
use crate::rules::PropagationScope;
use designkit_model::{
    Board, ComponentType, Document, Instance, Node, NodeData, NodeId, NodeKind, SchemaCatalog, ThemeRef,
    HIDDEN_PROPERTY,
};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};

/// Edit to a single field of a node
#[derive(Debug, Clone, PartialEq)]
pub enum LocalEdit {
    SetProperty { key: String, value: Value },
    RemoveProperty { key: String },
    SetTheme(Option<ThemeRef>),
    SetLabel(String),
}

impl LocalEdit {
    /// Display-suppression override
    pub fn hide() -> Self {
        LocalEdit::SetProperty {
            key: HIDDEN_PROPERTY.to_string(),
            value: Value::Bool(true),
        }
    }

    /// Whether `node` carries its own value for the field this edit writes
    fn is_set(&self, node: &Node) -> bool {
        let data = node.data();
        match self {
            LocalEdit::SetProperty { key, .. } | LocalEdit::RemoveProperty { key } => {
                data.properties.contains_key(key)
            }
            LocalEdit::SetTheme(_) => data.theme.is_some(),
            LocalEdit::SetLabel(_) => true,
        }
    }

    /// Current value of the field this edit writes
    fn current(&self, node: &Node) -> Option<Value> {
        let data = node.data();
        match self {
            LocalEdit::SetProperty { key, .. } | LocalEdit::RemoveProperty { key } => {
                data.properties.get(key).cloned()
            }
            LocalEdit::SetTheme(_) => data.theme.as_ref().map(|t| Value::String(t.to_string())),
            LocalEdit::SetLabel(_) => Some(Value::String(data.label.clone())),
        }
    }

    fn write(&self, node: &mut Node) {
        let data = node.data_mut();
        match self {
            LocalEdit::SetProperty { key, value } => {
                data.properties.insert(key.clone(), value.clone());
            }
            LocalEdit::RemoveProperty { key } => {
                data.properties.remove(key);
            }
            LocalEdit::SetTheme(theme) => data.theme = theme.clone(),
            LocalEdit::SetLabel(label) => data.label = label.clone(),
        }
    }
}

/// Apply `edit` to `node_id` and to the nodes `scope` reaches
pub fn propagate(
    doc: &Document,
    catalog: &SchemaCatalog,
    node_id: &NodeId,
    scope: PropagationScope,
    edit: &LocalEdit,
) -> Result<Document, MutationError> {
    let mut engine = Propagator::new(doc.clone(), catalog);
    engine.edit(node_id, edit, scope)?;
    Ok(engine.finish().0)
}

/// Working copy of a document for the duration of one mutation
pub struct Propagator<'a> {
    pub(crate) doc: Document,
    pub(crate) index: DerivationIndex,
    pub(crate) catalog: &'a SchemaCatalog,
    pub(crate) created: CreatedNodes,
}

impl<'a> Propagator<'a> {
    pub fn new(doc: Document, catalog: &'a SchemaCatalog) -> Self {
        let index = DerivationIndex::build(&doc);
        Self {
            doc,
            index,
            catalog,
            created: CreatedNodes::default(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn index(&self) -> &DerivationIndex {
        &self.index
    }

    pub fn finish(self) -> (Document, CreatedNodes) {
        (self.doc, self.created)
    }

    pub(crate) fn node(&self, id: &str) -> Result<&Node, MutationError> {
        self.doc
            .node(id)
            .ok_or_else(|| MutationError::NodeNotFound(id.to_string()))
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Result<&mut Node, MutationError> {
        self.doc
            .node_mut(id)
            .ok_or_else(|| MutationError::NodeNotFound(id.to_string()))
    }

    /// Field edit with override-wins propagation
    pub(crate) fn edit(
        &mut self,
        target: &NodeId,
        edit: &LocalEdit,
        scope: PropagationScope,
    ) -> Result<Step, MutationError> {
        let touched = self.apply_local(target, edit, scope)?;
        tracing::debug!(target = %target, ?scope, touched, "applied local edit");
        Ok(Step::Applied)
    }

    /// Write `edit` on `target`, and on the subtree nodes a `Descendants`
    /// scope reaches. Mirrors without their own value inherit the write.
    /// Returns the number of nodes whose effective value changed.
    pub fn apply_local(
        &mut self,
        target: &NodeId,
        edit: &LocalEdit,
        scope: PropagationScope,
    ) -> Result<usize, MutationError> {
        let target_pre = edit.current(self.node(target.as_str())?);

        let roots: Vec<NodeId> = match scope {
            PropagationScope::None | PropagationScope::Instances => vec![target.clone()],
            PropagationScope::Descendants => self
                .doc
                .subtree(target.as_str())
                .into_iter()
                .filter(|id| {
                    id == target
                        || self
                            .doc
                            .node(id.as_str())
                            .map(|node| !edit.is_set(node) || edit.current(node) == target_pre)
                            .unwrap_or(false)
                })
                .collect(),
        };

        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut touched = 0;

        for root in roots {
            if !seen.insert(root.clone()) {
                continue;
            }
            edit.write(self.node_mut(root.as_str())?);
            touched += 1;

            if scope == PropagationScope::None {
                continue;
            }

            let mut queue = VecDeque::from([root]);
            while let Some(template) = queue.pop_front() {
                for mirror in self.index.direct_mirrors(template.as_str()).to_vec() {
                    if !seen.insert(mirror.clone()) {
                        continue;
                    }
                    let Some(node) = self.doc.node(mirror.as_str()) else {
                        continue;
                    };
                    if edit.is_set(node) {
                        tracing::trace!(mirror = %mirror, "keeping local override");
                        continue;
                    }
                    touched += 1;
                    queue.push_back(mirror);
                }
            }
        }

        Ok(touched)
    }

    /// Add `node` to the registry and the index
    pub(crate) fn register(&mut self, node: Node) {
        self.index.link(&node);
        for child in node.children() {
            self.index.set_parent(child, node.id());
        }
        self.doc.insert_node(node);
    }

    /// Insert `child` into `parent`'s child list, clamping `index` to the end
    pub(crate) fn attach(
        &mut self,
        parent: &NodeId,
        index: usize,
        child: &NodeId,
    ) -> Result<usize, MutationError> {
        let children = self.node_mut(parent.as_str())?.children_mut();
        let at = index.min(children.len());
        children.insert(at, child.clone());
        self.index.set_parent(child, parent);
        Ok(at)
    }

    /// Remove `child` from its parent's child list. Returns the former parent
    /// and position.
    pub(crate) fn detach(&mut self, child: &NodeId) -> Result<Option<(NodeId, usize)>, MutationError> {
        let Some(parent) = self.index.parent(child.as_str()).cloned() else {
            return Ok(None);
        };
        self.index.clear_parent(child.as_str());

        let Some(node) = self.doc.node_mut(parent.as_str()) else {
            return Ok(None);
        };
        let children = node.children_mut();
        let Some(position) = children.iter().position(|c| c == child) else {
            return Ok(None);
        };
        children.remove(position);
        Ok(Some((parent, position)))
    }

    pub(crate) fn position_in(&self, parent: &NodeId, child: &NodeId) -> Result<usize, MutationError> {
        self.node(parent.as_str())?
            .children()
            .iter()
            .position(|c| c == child)
            .ok_or_else(|| {
                MutationError::InvalidStructure(format!("{child} is not a child of {parent}"))
            })
    }

    /// Child of `mirror_parent` that derives from `template_child`
    pub(crate) fn counterpart_in(
        &self,
        mirror_parent: &NodeId,
        template_child: &NodeId,
    ) -> Option<(usize, NodeId)> {
        let parent = self.doc.node(mirror_parent.as_str())?;
        parent.children().iter().enumerate().find_map(|(i, id)| {
            let node = self.doc.node(id.as_str())?;
            (node.derives_from() == Some(template_child)).then(|| (i, id.clone()))
        })
    }

    /// Position in `mirror_parent` matching position `pos` of `template_parent`.
    ///
    /// Anchors on the counterpart of the successor, then of the predecessor,
    /// then falls back to the same index.
    pub(crate) fn anchor(
        &self,
        template_parent: &NodeId,
        pos: usize,
        mirror_parent: &NodeId,
    ) -> Result<usize, MutationError> {
        let template_children = self.node(template_parent.as_str())?.children();

        if let Some(next) = template_children.get(pos + 1) {
            if let Some((i, _)) = self.counterpart_in(mirror_parent, next) {
                return Ok(i);
            }
        }
        if let Some(prev) = pos.checked_sub(1).and_then(|p| template_children.get(p)) {
            if let Some((i, _)) = self.counterpart_in(mirror_parent, prev) {
                return Ok(i + 1);
            }
        }

        let len = self.node(mirror_parent.as_str())?.children().len();
        Ok(pos.min(len))
    }

    /// Create an instance of `template` and of its whole subtree, owned by
    /// `owner`. The new root is registered but not attached.
    pub(crate) fn instantiate(
        &mut self,
        template: &NodeId,
        owner: &NodeId,
        from_schema: bool,
        label: Option<&str>,
    ) -> Result<NodeId, MutationError> {
        let source = self.node(template.as_str())?.clone();
        let data = source.data();
        let id = self.doc.allocate_id(NodeKind::Instance, &data.component_type);

        self.register(Node::Instance(Instance {
            id: id.clone(),
            data: NodeData {
                component_type: data.component_type.clone(),
                level: data.level,
                label: label.map(str::to_string).unwrap_or_else(|| data.label.clone()),
                theme: None,
                properties: Default::default(),
                children: Vec::new(),
            },
            owner_variant: owner.clone(),
            derives_from: template.clone(),
            from_schema,
        }));

        for child in source.children() {
            let Some(child_node) = self.doc.node(child.as_str()) else {
                tracing::warn!(template = %template, child = %child, "skipping dangling template child");
                continue;
            };
            let child_from_schema = child_node.from_schema();
            let copy = self.instantiate(child, owner, child_from_schema, None)?;
            self.attach(&id, usize::MAX, &copy)?;
        }

        Ok(id)
    }

    /// Give every mirror of `parent` a copy of its new child `child`,
    /// transitively.
    pub(crate) fn mirror_insert(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), MutationError> {
        let mut seen: HashSet<NodeId> = HashSet::from([parent.clone()]);
        let mut queue = VecDeque::from([(parent.clone(), child.clone())]);

        while let Some((template_parent, template_child)) = queue.pop_front() {
            let pos = self.position_in(&template_parent, &template_child)?;
            let from_schema = self.node(template_child.as_str())?.from_schema();

            for mirror in self.index.direct_mirrors(template_parent.as_str()).to_vec() {
                if !seen.insert(mirror.clone()) {
                    continue;
                }
                let Some(owner) = self.doc.node(mirror.as_str()).map(|m| m.owner().clone()) else {
                    continue;
                };
                let at = self.anchor(&template_parent, pos, &mirror)?;
                let copy = self.instantiate(&template_child, &owner, from_schema, None)?;
                self.attach(&mirror, at, &copy)?;
                tracing::debug!(mirror = %mirror, copy = %copy, "mirrored insert");
                self.created.mirrors.push(copy.clone());
                queue.push_back((mirror, copy));
            }
        }

        Ok(())
    }

    /// Delete `root`, its subtree, and every node mirroring any of them.
    /// Returns the removed ids.
    pub(crate) fn delete_cascade(&mut self, root: &NodeId) -> Result<Vec<NodeId>, MutationError> {
        let mut doomed = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut work = vec![root.clone()];

        while let Some(id) = work.pop() {
            for node in self.doc.subtree(id.as_str()) {
                if seen.insert(node.clone()) {
                    work.extend(self.index.direct_mirrors(node.as_str()).iter().cloned());
                    doomed.push(node);
                }
            }
        }

        for id in &doomed {
            let survives = self
                .index
                .parent(id.as_str())
                .map(|parent| !seen.contains(parent))
                .unwrap_or(false);
            if survives {
                self.detach(id)?;
            }
        }

        for id in &doomed {
            self.index.clear_parent(id.as_str());
            let Some(node) = self.doc.remove_node(id.as_str()) else {
                continue;
            };
            self.index.unlink(&node);
            if let Node::Variant(variant) = &node {
                if let Some(board) = self.doc.board_mut(variant.data.component_type.as_str()) {
                    board.variants.retain(|v| v != id);
                }
            }
        }

        tracing::debug!(root = %root, removed = doomed.len(), "deleted subtree and mirrors");
        Ok(doomed)
    }

    pub(crate) fn update_board(
        &mut self,
        component_type: &ComponentType,
        update: impl FnOnce(&mut Board),
    ) -> Result<Step, MutationError> {
        let board = self
            .doc
            .board_mut(component_type.as_str())
            .ok_or_else(|| MutationError::BoardNotFound(component_type.to_string()))?;
        update(board);
        Ok(Step::Applied)
    }

    /// Reassign board orders to `0..N-1`, keeping their relative order
    pub(crate) fn densify_board_order(&mut self) {
        let ordered: Vec<_> = self
            .doc
            .boards_in_order()
            .into_iter()
            .map(|b| b.component_type.clone())
            .collect();
        for (order, component_type) in ordered.iter().enumerate() {
            if let Some(board) = self.doc.board_mut(component_type.as_str()) {
                board.order = order as u32;
            }
        }
    }

    pub(crate) fn noop(reason: NoopReason) -> Result<Step, MutationError> {
        Ok(Step::Noop(reason))
    }
}
