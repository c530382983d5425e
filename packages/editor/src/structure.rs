//! Structural edits: insert, remove, duplicate, move, reorder

use crate::mutations::{MutationError, NoopReason, Step};
use crate::propagation::{LocalEdit, Propagator};
use crate::rules::{PropagationScope, RemovalMode, Rule};
use designkit_model::{ComponentType, Instance, Node, NodeId, NodeKind, Variant, VariantOrigin};
use std::collections::{HashMap, HashSet, VecDeque};

impl Propagator<'_> {
    pub(crate) fn insert_instance(
        &mut self,
        parent: &NodeId,
        index: usize,
        template: &NodeId,
    ) -> Result<Step, MutationError> {
        let parent_node = self.node(parent.as_str())?;
        let len = parent_node.children().len();
        if index > len {
            return Self::noop(NoopReason::IndexOutOfRange { index, len });
        }
        let parent_level = parent_node.data().level;
        let owner = parent_node.owner().clone();

        let template_level = self.node(template.as_str())?.data().level;
        if !parent_level.can_contain(template_level) {
            return Err(MutationError::LevelViolation {
                parent: parent.to_string(),
                parent_level,
                child: template.to_string(),
                child_level: template_level,
            });
        }
        self.check_acyclic(template, &owner)?;

        let child = self.instantiate(template, &owner, false, None)?;
        self.attach(parent, index, &child)?;
        self.created.record_tree(&self.doc, &child);
        self.mirror_insert(parent, &child)?;

        tracing::debug!(
            parent = %parent,
            child = %child,
            mirrors = self.created.mirrors.len(),
            "inserted instance"
        );
        Ok(Step::Applied)
    }

    /// Refuse to place `template` inside `owner` when `template` already
    /// depends on `owner` or on a variant `owner` derives from.
    fn check_acyclic(&self, template: &NodeId, owner: &NodeId) -> Result<(), MutationError> {
        let mut lineage: HashSet<&NodeId> = HashSet::from([owner]);
        let mut cursor = self.doc.node(owner.as_str()).and_then(Node::derives_from);
        while let Some(ancestor) = cursor {
            if !lineage.insert(ancestor) {
                break;
            }
            cursor = self.doc.node(ancestor.as_str()).and_then(Node::derives_from);
        }

        let mut seen = HashSet::new();
        let mut stack = vec![template.clone()];
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            let Some(node) = self.doc.node(id.as_str()) else {
                continue;
            };
            if lineage.contains(node.owner()) {
                return Err(MutationError::CycleDetected(format!(
                    "{template} depends on {owner}"
                )));
            }
            stack.extend(node.children().iter().cloned());
            stack.extend(node.derives_from().cloned());
        }
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: &NodeId, rule: Rule) -> Result<Step, MutationError> {
        let from_schema = self.node(id.as_str())?.from_schema();
        let mode = rule
            .removal
            .map(|behavior| behavior.resolve(from_schema))
            .unwrap_or(RemovalMode::Delete);

        match mode {
            RemovalMode::Hide => {
                let touched = self.apply_local(id, &LocalEdit::hide(), rule.scope)?;
                tracing::debug!(node = %id, touched, "hid schema-defined node");
            }
            RemovalMode::Delete => {
                self.delete_cascade(id)?;
            }
        }
        Ok(Step::Applied)
    }

    pub(crate) fn remove_board(&mut self, component_type: &ComponentType) -> Result<Step, MutationError> {
        let board = self
            .doc
            .board(component_type.as_str())
            .cloned()
            .ok_or_else(|| MutationError::BoardNotFound(component_type.to_string()))?;

        for variant in board.variants.iter().rev() {
            if self.doc.contains(variant.as_str()) {
                self.delete_cascade(variant)?;
            }
        }
        self.doc.boards.remove(component_type.as_str());
        self.densify_board_order();

        tracing::debug!(board = %component_type, "removed board");
        Ok(Step::Applied)
    }

    pub(crate) fn duplicate(&mut self, id: &NodeId) -> Result<Step, MutationError> {
        match self.node(id.as_str())?.clone() {
            Node::Variant(variant) => self.duplicate_variant(variant),
            Node::Instance(instance) => self.duplicate_instance(instance),
        }
    }

    fn duplicate_variant(&mut self, variant: Variant) -> Result<Step, MutationError> {
        let component_type = variant.data.component_type.clone();
        if self.doc.board(component_type.as_str()).is_none() {
            return Err(MutationError::BoardNotFound(component_type.to_string()));
        }
        let label = format!("{} Copy", variant.data.label);

        let copy = match &variant.origin {
            VariantOrigin::Default => self.create_user_variant(&variant.id, label)?,
            VariantOrigin::User { .. } => {
                let copy = self.clone_subtree(&variant.id, None)?;
                if let Some(node) = self.doc.node_mut(copy.as_str()) {
                    node.data_mut().label = label;
                }
                if let Some(board) = self.doc.board_mut(component_type.as_str()) {
                    board.variants.push(copy.clone());
                }
                copy
            }
        };

        self.created.record_tree(&self.doc, &copy);
        tracing::debug!(source = %variant.id, copy = %copy, "duplicated variant");
        Ok(Step::Applied)
    }

    fn duplicate_instance(&mut self, instance: Instance) -> Result<Step, MutationError> {
        let Some(parent) = self.index.parent(instance.id.as_str()).cloned() else {
            return Self::noop(NoopReason::Detached {
                node_id: instance.id,
            });
        };
        let position = self.position_in(&parent, &instance.id)?;

        let copy = self.clone_subtree(&instance.id, Some(&instance.owner_variant))?;
        if let Some(Node::Instance(root)) = self.doc.node_mut(copy.as_str()) {
            root.from_schema = false;
        }
        self.attach(&parent, position + 1, &copy)?;
        self.created.record_tree(&self.doc, &copy);
        self.mirror_insert(&parent, &copy)?;

        tracing::debug!(source = %instance.id, copy = %copy, "duplicated instance");
        Ok(Step::Applied)
    }

    /// Copy the subtree of `source` under fresh ids. References inside the
    /// subtree are remapped to the copies; references leaving it are kept.
    ///
    /// With `owner == None` the copy's root becomes the owner of every copied
    /// instance. The root is registered but not attached.
    fn clone_subtree(&mut self, source: &NodeId, owner: Option<&NodeId>) -> Result<NodeId, MutationError> {
        let originals = self.doc.subtree(source.as_str());
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();

        // Reserve ids first so later allocations see the earlier ones.
        for original in &originals {
            let node = self.node(original.as_str())?.clone();
            let kind = if original == source { node.kind() } else { NodeKind::Instance };
            let fresh = self.doc.allocate_id(kind, node.component_type());
            let mut placeholder = node;
            match &mut placeholder {
                Node::Variant(v) => v.id = fresh.clone(),
                Node::Instance(i) => i.id = fresh.clone(),
            }
            self.doc.insert_node(placeholder);
            mapping.insert(original.clone(), fresh);
        }

        let root = mapping
            .get(source)
            .cloned()
            .ok_or_else(|| MutationError::NodeNotFound(source.to_string()))?;
        let owner = owner.cloned().unwrap_or_else(|| root.clone());
        let remap = |id: &NodeId| mapping.get(id).cloned().unwrap_or_else(|| id.clone());

        for original in &originals {
            let fresh = remap(original);
            let mut node = self.node(fresh.as_str())?.clone();
            let children: Vec<NodeId> = node.children().iter().map(&remap).collect();
            *node.children_mut() = children;
            if let Node::Instance(i) = &mut node {
                i.derives_from = remap(&i.derives_from);
                i.owner_variant = owner.clone();
            }
            self.register(node);
        }

        Ok(root)
    }

    pub(crate) fn move_node(
        &mut self,
        id: &NodeId,
        new_parent: &NodeId,
        index: usize,
        scope: PropagationScope,
    ) -> Result<Step, MutationError> {
        let node = self.node(id.as_str())?.clone();
        let Some(destination) = self.doc.node(new_parent.as_str()).cloned() else {
            return Self::noop(NoopReason::MissingDestination {
                id: new_parent.to_string(),
            });
        };
        if self.doc.subtree(id.as_str()).contains(new_parent) {
            return Err(MutationError::CycleDetected(format!(
                "{new_parent} is inside {id}"
            )));
        }
        let Some(old_parent) = self.index.parent(id.as_str()).cloned() else {
            return Self::noop(NoopReason::Detached { node_id: id.clone() });
        };

        if &old_parent == new_parent {
            return self.reorder_child(id, index, scope);
        }
        if node.from_schema() {
            return Self::noop(NoopReason::SchemaDefinedMove { node_id: id.clone() });
        }
        let len = destination.children().len();
        if index > len {
            return Self::noop(NoopReason::IndexOutOfRange { index, len });
        }
        let destination_level = destination.data().level;
        let level = node.data().level;
        if !destination_level.can_contain(level) {
            return Err(MutationError::LevelViolation {
                parent: new_parent.to_string(),
                parent_level: destination_level,
                child: id.to_string(),
                child_level: level,
            });
        }

        self.detach(id)?;
        self.attach(new_parent, index, id)?;
        if destination.owner() != node.owner() {
            self.rewrite_owner(id, destination.owner())?;
        }

        if scope != PropagationScope::None {
            self.mirror_move(&old_parent, new_parent, id)?;
        }

        tracing::debug!(node = %id, from = %old_parent, to = %new_parent, "moved node");
        Ok(Step::Applied)
    }

    fn rewrite_owner(&mut self, root: &NodeId, owner: &NodeId) -> Result<(), MutationError> {
        for id in self.doc.subtree(root.as_str()) {
            if let Node::Instance(instance) = self.node_mut(id.as_str())? {
                instance.owner_variant = owner.clone();
            }
        }
        Ok(())
    }

    /// Follow a move of `moved` from `from` to `to` in every mirror.
    ///
    /// A mirror tree containing counterparts of both parents moves its
    /// counterpart. Counterparts with no destination in their tree are
    /// deleted, and destinations with no counterpart get a fresh copy.
    fn mirror_move(&mut self, from: &NodeId, to: &NodeId, moved: &NodeId) -> Result<(), MutationError> {
        let mut queue = VecDeque::from([(from.clone(), to.clone(), moved.clone())]);

        while let Some((from, to, moved)) = queue.pop_front() {
            if !self.doc.contains(moved.as_str()) || !self.doc.contains(to.as_str()) {
                continue;
            }
            let pos = self.position_in(&to, &moved)?;
            let destinations = self.index.direct_mirrors(to.as_str()).to_vec();
            let mut served: HashSet<NodeId> = HashSet::new();

            for mirror in self.index.direct_mirrors(from.as_str()).to_vec() {
                let Some((_, counterpart)) = self.counterpart_in(&mirror, &moved) else {
                    continue;
                };
                let Some(owner) = self.doc.node(mirror.as_str()).map(|m| m.owner().clone()) else {
                    continue;
                };
                let destination = destinations.iter().find(|d| {
                    !served.contains(*d)
                        && self.doc.node(d.as_str()).map(|n| n.owner() == &owner).unwrap_or(false)
                });

                match destination.cloned() {
                    Some(destination) => {
                        self.detach(&counterpart)?;
                        let at = self.anchor(&to, pos, &destination)?;
                        self.attach(&destination, at, &counterpart)?;
                        served.insert(destination.clone());
                        queue.push_back((mirror, destination, counterpart));
                    }
                    None => {
                        self.delete_cascade(&counterpart)?;
                    }
                }
            }

            let from_schema = self.node(moved.as_str())?.from_schema();
            for destination in destinations {
                if served.contains(&destination) {
                    continue;
                }
                let Some(owner) = self.doc.node(destination.as_str()).map(|n| n.owner().clone()) else {
                    continue;
                };
                let at = self.anchor(&to, pos, &destination)?;
                let copy = self.instantiate(&moved, &owner, from_schema, None)?;
                self.attach(&destination, at, &copy)?;
                self.created.mirrors.push(copy.clone());
                self.mirror_insert(&destination, &copy)?;
            }
        }

        Ok(())
    }

    pub(crate) fn reorder_child(
        &mut self,
        id: &NodeId,
        new_index: usize,
        scope: PropagationScope,
    ) -> Result<Step, MutationError> {
        self.node(id.as_str())?;
        let Some(parent) = self.index.parent(id.as_str()).cloned() else {
            return Self::noop(NoopReason::Detached { node_id: id.clone() });
        };
        let len = self.node(parent.as_str())?.children().len();
        if new_index > len {
            return Self::noop(NoopReason::IndexOutOfRange {
                index: new_index,
                len,
            });
        }

        let from = self.position_in(&parent, id)?;
        let to = new_index.min(len - 1);
        if from != to && self.reorders_schema_slots(&parent, from, to)? {
            return Self::noop(NoopReason::SchemaOrderLocked { node_id: id.clone() });
        }
        if from != to {
            let children = self.node_mut(parent.as_str())?.children_mut();
            let moved = children.remove(from);
            children.insert(to, moved);
        }

        if scope != PropagationScope::None {
            self.mirror_reorder(&parent, id)?;
        }
        Ok(Step::Applied)
    }

    /// Whether moving the child at `from` to `to` changes the relative order
    /// of the schema-defined children of `parent`, where `parent` mirrors a
    /// template
    fn reorders_schema_slots(&self, parent: &NodeId, from: usize, to: usize) -> Result<bool, MutationError> {
        let parent_node = self.node(parent.as_str())?;
        if parent_node.derives_from().is_none() {
            return Ok(false);
        }

        let schema_slots = |children: &[NodeId]| -> Vec<NodeId> {
            children
                .iter()
                .filter(|c| self.doc.node(c.as_str()).map(Node::from_schema).unwrap_or(false))
                .cloned()
                .collect()
        };
        let mut children = parent_node.children().to_vec();
        let before = schema_slots(&children);
        let moved = children.remove(from);
        children.insert(to, moved);
        Ok(schema_slots(&children) != before)
    }

    /// Move the counterpart of `child` in every mirror of `parent` to the
    /// position anchored on its new neighbours, transitively.
    fn mirror_reorder(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), MutationError> {
        let mut seen: HashSet<NodeId> = HashSet::from([parent.clone()]);
        let mut queue = VecDeque::from([(parent.clone(), child.clone())]);

        while let Some((template_parent, template_child)) = queue.pop_front() {
            let pos = self.position_in(&template_parent, &template_child)?;
            for mirror in self.index.direct_mirrors(template_parent.as_str()).to_vec() {
                if !seen.insert(mirror.clone()) {
                    continue;
                }
                let Some((_, counterpart)) = self.counterpart_in(&mirror, &template_child) else {
                    continue;
                };
                self.detach(&counterpart)?;
                let at = self.anchor(&template_parent, pos, &mirror)?;
                self.attach(&mirror, at, &counterpart)?;
                queue.push_back((mirror, counterpart));
            }
        }
        Ok(())
    }

    pub(crate) fn reorder_variant(&mut self, id: &NodeId, new_index: usize) -> Result<Step, MutationError> {
        let node = self.node(id.as_str())?;
        if node.is_default_variant() {
            return Self::noop(NoopReason::DefaultVariantPinned { variant_id: id.clone() });
        }
        let Node::Variant(variant) = node else {
            return Self::noop(NoopReason::Detached { node_id: id.clone() });
        };
        let component_type = variant.data.component_type.clone();

        let Some(board) = self.doc.board(component_type.as_str()) else {
            return Self::noop(NoopReason::MissingDestination {
                id: component_type.to_string(),
            });
        };
        let len = board.variants.len();
        let Some(from) = board.variants.iter().position(|v| v == id) else {
            return Self::noop(NoopReason::Detached { node_id: id.clone() });
        };
        let first = board
            .variants
            .first()
            .and_then(|v| self.doc.node(v.as_str()))
            .map(Node::is_default_variant)
            .unwrap_or(false);
        if new_index >= len {
            return Self::noop(NoopReason::IndexOutOfRange { index: new_index, len });
        }
        if first && new_index == 0 {
            return Self::noop(NoopReason::DefaultVariantPinned {
                variant_id: board.variants[0].clone(),
            });
        }

        if let Some(board) = self.doc.board_mut(component_type.as_str()) {
            let moved = board.variants.remove(from);
            board.variants.insert(new_index, moved);
        }
        Ok(Step::Applied)
    }

    /// Move a board to display position `new_index`. Only boards between the
    /// old and new positions shift.
    pub(crate) fn reorder_board(
        &mut self,
        component_type: &ComponentType,
        new_index: usize,
    ) -> Result<Step, MutationError> {
        let mut ordered: Vec<ComponentType> = self
            .doc
            .boards_in_order()
            .into_iter()
            .map(|b| b.component_type.clone())
            .collect();
        let Some(from) = ordered.iter().position(|c| c == component_type) else {
            return Self::noop(NoopReason::MissingDestination {
                id: component_type.to_string(),
            });
        };
        if new_index >= ordered.len() {
            return Self::noop(NoopReason::IndexOutOfRange {
                index: new_index,
                len: ordered.len(),
            });
        }

        let moved = ordered.remove(from);
        ordered.insert(new_index, moved);
        for (order, board_type) in ordered.iter().enumerate() {
            if let Some(board) = self.doc.board_mut(board_type.as_str()) {
                board.order = order as u32;
            }
        }
        Ok(Step::Applied)
    }
}
