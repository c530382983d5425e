//! Catalog-driven creation of boards and variants

use crate::mutations::{MutationError, NoopReason, Step};
use crate::propagation::Propagator;
use designkit_model::{
    Board, ComponentType, Node, NodeData, NodeId, NodeKind, Variant, VariantOrigin,
};

impl Propagator<'_> {
    pub(crate) fn add_component(&mut self, component_type: &ComponentType) -> Result<Step, MutationError> {
        if self.doc.board(component_type.as_str()).is_some() {
            return Self::noop(NoopReason::AlreadyExists {
                component_type: component_type.clone(),
            });
        }

        let mut visiting = Vec::new();
        let root = self.ensure_board(component_type, &mut visiting)?;
        self.created.record_tree(&self.doc, &root);
        Ok(Step::Applied)
    }

    /// Default variant of `component_type`, creating its board (and the
    /// boards of its template children) when missing
    fn ensure_board(
        &mut self,
        component_type: &ComponentType,
        visiting: &mut Vec<ComponentType>,
    ) -> Result<NodeId, MutationError> {
        if let Some(existing) = self.doc.default_variant(component_type.as_str()) {
            return Ok(existing.clone());
        }
        if visiting.contains(component_type) {
            return Err(MutationError::CycleDetected(format!(
                "component {component_type} contains itself"
            )));
        }
        let schema = self
            .catalog
            .get(component_type.as_str())
            .cloned()
            .ok_or_else(|| MutationError::UnknownComponent(component_type.to_string()))?;

        let id = NodeId::default_variant(component_type);
        if self.doc.contains(id.as_str()) {
            return Err(MutationError::InvalidStructure(format!(
                "{id} exists without a board"
            )));
        }

        visiting.push(component_type.clone());
        let mut templates = Vec::with_capacity(schema.template_children.len());
        for child in &schema.template_children {
            let child_level = self
                .catalog
                .get(child.component_type.as_str())
                .map(|s| s.level)
                .ok_or_else(|| MutationError::UnknownComponent(child.component_type.to_string()))?;
            if !schema.level.can_contain(child_level) {
                return Err(MutationError::LevelViolation {
                    parent: component_type.to_string(),
                    parent_level: schema.level,
                    child: child.component_type.to_string(),
                    child_level,
                });
            }
            let template = self.ensure_board(&child.component_type, visiting)?;
            templates.push((template, child.label.clone()));
        }
        visiting.pop();

        let mut data = NodeData::new(component_type.clone(), schema.level, schema.label.clone());
        data.properties = schema.default_properties.clone();
        self.register(Node::Variant(Variant {
            id: id.clone(),
            data,
            origin: VariantOrigin::Default,
        }));

        for (template, label) in templates {
            let child = self.instantiate(&template, &id, true, label.as_deref())?;
            self.attach(&id, usize::MAX, &child)?;
        }

        let order = self.doc.boards.len() as u32;
        let mut board = Board::new(component_type.clone(), schema.label, order);
        board.variants.push(id.clone());
        self.doc.boards.insert(component_type.clone(), board);
        self.created.boards.push(component_type.clone());

        tracing::debug!(board = %component_type, order, "created board");
        Ok(id)
    }

    pub(crate) fn add_variant(&mut self, component_type: &ComponentType) -> Result<Step, MutationError> {
        let board = self
            .doc
            .board(component_type.as_str())
            .ok_or_else(|| MutationError::BoardNotFound(component_type.to_string()))?;
        let label = format!("{} {}", board.label, board.variants.len() + 1);
        let default = self
            .doc
            .default_variant(component_type.as_str())
            .cloned()
            .ok_or_else(|| MutationError::NodeNotFound(NodeId::default_variant(component_type).to_string()))?;

        let variant = self.create_user_variant(&default, label)?;
        self.created.record_tree(&self.doc, &variant);
        Ok(Step::Applied)
    }

    /// New user variant of `template`'s board whose children mirror
    /// `template`'s children. Appended to the board.
    pub(crate) fn create_user_variant(
        &mut self,
        template: &NodeId,
        label: String,
    ) -> Result<NodeId, MutationError> {
        let source = self.node(template.as_str())?.clone();
        let component_type = source.component_type().clone();
        let id = self.doc.allocate_id(NodeKind::Variant, &component_type);

        let mut data = source.data().clone();
        data.label = label;
        data.theme = None;
        data.properties = Default::default();
        data.children = Vec::new();
        self.register(Node::Variant(Variant {
            id: id.clone(),
            data,
            origin: VariantOrigin::User {
                derives_from: template.clone(),
            },
        }));

        for child in source.children() {
            let Some(from_schema) = self.doc.node(child.as_str()).map(Node::from_schema) else {
                continue;
            };
            let copy = self.instantiate(child, &id, from_schema, None)?;
            self.attach(&id, usize::MAX, &copy)?;
        }

        let board = self
            .doc
            .board_mut(component_type.as_str())
            .ok_or_else(|| MutationError::BoardNotFound(component_type.to_string()))?;
        board.variants.push(id.clone());

        tracing::debug!(template = %template, variant = %id, "created user variant");
        Ok(id)
    }
}
