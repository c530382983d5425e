//! Variants and instances

use crate::error::ModelError;
use crate::ids::{ComponentType, NodeId, NodeKind};
use crate::level::Level;
use crate::theme::ThemeRef;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Sparse property overrides. A missing key means "inherit".
pub type Properties = BTreeMap<String, Value>;

/// Display-suppression override written when a schema-defined node is removed
pub const HIDDEN_PROPERTY: &str = "hidden";

/// Fields shared by variants and instances
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub component_type: ComponentType,
    pub level: Level,
    pub label: String,
    pub theme: Option<ThemeRef>,
    pub properties: Properties,
    pub children: Vec<NodeId>,
}

impl NodeData {
    pub fn new(component_type: ComponentType, level: Level, label: impl Into<String>) -> Self {
        Self {
            component_type,
            level,
            label: label.into(),
            theme: None,
            properties: Properties::new(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariantOrigin {
    /// Canonical template provided by the component schema
    Default,
    /// Editable copy of the default variant
    User { derives_from: NodeId },
}

/// Top-level template node of a board
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub id: NodeId,
    pub data: NodeData,
    pub origin: VariantOrigin,
}

/// Placed copy of a variant or of another instance
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub id: NodeId,
    pub data: NodeData,
    /// Variant whose subtree this instance belongs to
    pub owner_variant: NodeId,
    /// Node this instance mirrors
    pub derives_from: NodeId,
    /// Required by its template (hidden, never deleted)
    pub from_schema: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub enum Node {
    Variant(Variant),
    Instance(Instance),
}

impl Node {
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Variant(v) => &v.id,
            Node::Instance(i) => &i.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Variant(_) => NodeKind::Variant,
            Node::Instance(_) => NodeKind::Instance,
        }
    }

    pub fn data(&self) -> &NodeData {
        match self {
            Node::Variant(v) => &v.data,
            Node::Instance(i) => &i.data,
        }
    }

    pub fn data_mut(&mut self) -> &mut NodeData {
        match self {
            Node::Variant(v) => &mut v.data,
            Node::Instance(i) => &mut i.data,
        }
    }

    pub fn component_type(&self) -> &ComponentType {
        &self.data().component_type
    }

    pub fn children(&self) -> &[NodeId] {
        &self.data().children
    }

    pub fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.data_mut().children
    }

    /// Immediate template, `None` for default variants
    pub fn derives_from(&self) -> Option<&NodeId> {
        match self {
            Node::Variant(Variant {
                origin: VariantOrigin::User { derives_from },
                ..
            }) => Some(derives_from),
            Node::Variant(_) => None,
            Node::Instance(i) => Some(&i.derives_from),
        }
    }

    /// Variant that owns this node's subtree (a variant owns itself)
    pub fn owner(&self) -> &NodeId {
        match self {
            Node::Variant(v) => &v.id,
            Node::Instance(i) => &i.owner_variant,
        }
    }

    pub fn from_schema(&self) -> bool {
        match self {
            Node::Variant(v) => v.origin == VariantOrigin::Default,
            Node::Instance(i) => i.from_schema,
        }
    }

    pub fn is_default_variant(&self) -> bool {
        matches!(
            self,
            Node::Variant(Variant {
                origin: VariantOrigin::Default,
                ..
            })
        )
    }

    pub fn is_hidden(&self) -> bool {
        self.data().properties.get(HIDDEN_PROPERTY) == Some(&Value::Bool(true))
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Node::Instance(i) => Some(i),
            Node::Variant(_) => None,
        }
    }

    pub fn as_variant(&self) -> Option<&Variant> {
        match self {
            Node::Variant(v) => Some(v),
            Node::Instance(_) => None,
        }
    }
}

/// Persisted shape of a node
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    id: NodeId,
    component_type: ComponentType,
    #[serde(default)]
    level: Level,
    #[serde(default)]
    label: String,
    #[serde(default)]
    theme: Option<ThemeRef>,
    #[serde(default)]
    properties: Properties,
    #[serde(default)]
    children: Vec<NodeId>,
    is_child: bool,
    #[serde(default)]
    from_schema: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    derives_from: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner_variant: Option<NodeId>,
}

impl TryFrom<RawNode> for Node {
    type Error = ModelError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let data = NodeData {
            component_type: raw.component_type,
            level: raw.level,
            label: raw.label,
            theme: raw.theme,
            properties: raw.properties,
            children: raw.children,
        };

        if raw.is_child {
            let missing = |field| ModelError::MissingField {
                id: raw.id.to_string(),
                field,
            };
            let derives_from = raw.derives_from.clone().ok_or_else(|| missing("derivesFrom"))?;
            let owner_variant = raw.owner_variant.clone().ok_or_else(|| missing("ownerVariant"))?;
            return Ok(Node::Instance(Instance {
                id: raw.id,
                data,
                owner_variant,
                derives_from,
                from_schema: raw.from_schema,
            }));
        }

        let origin = if raw.from_schema {
            VariantOrigin::Default
        } else {
            let derives_from = raw.derives_from.ok_or_else(|| ModelError::MissingField {
                id: raw.id.to_string(),
                field: "derivesFrom",
            })?;
            VariantOrigin::User { derives_from }
        };

        Ok(Node::Variant(Variant {
            id: raw.id,
            data,
            origin,
        }))
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        match node {
            Node::Variant(v) => {
                let (from_schema, derives_from) = match v.origin {
                    VariantOrigin::Default => (true, None),
                    VariantOrigin::User { derives_from } => (false, Some(derives_from)),
                };
                RawNode {
                    id: v.id,
                    component_type: v.data.component_type,
                    level: v.data.level,
                    label: v.data.label,
                    theme: v.data.theme,
                    properties: v.data.properties,
                    children: v.data.children,
                    is_child: false,
                    from_schema,
                    derives_from,
                    owner_variant: None,
                }
            }
            Node::Instance(i) => RawNode {
                id: i.id,
                component_type: i.data.component_type,
                level: i.data.level,
                label: i.data.label,
                theme: i.data.theme,
                properties: i.data.properties,
                children: i.data.children,
                is_child: true,
                from_schema: i.from_schema,
                derives_from: Some(i.derives_from),
                owner_variant: Some(i.owner_variant),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_instance_round_trip_shape() {
        let value = json!({
            "id": "child-icon-1",
            "componentType": "icon",
            "level": 0,
            "label": "Icon",
            "theme": null,
            "properties": {},
            "children": [],
            "isChild": true,
            "fromSchema": true,
            "derivesFrom": "variant-icon-default",
            "ownerVariant": "variant-button-default"
        });

        let node: Node = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(node.kind(), NodeKind::Instance);
        assert_eq!(node.derives_from(), Some(&NodeId::from("variant-icon-default")));
        assert_eq!(node.owner(), &NodeId::from("variant-button-default"));
        assert_eq!(serde_json::to_value(&node).unwrap(), value);
    }

    #[test]
    fn test_default_variant_has_no_template() {
        let node: Node = serde_json::from_value(json!({
            "id": "variant-button-default",
            "componentType": "button",
            "isChild": false,
            "fromSchema": true
        }))
        .unwrap();

        assert!(node.is_default_variant());
        assert!(node.derives_from().is_none());
        assert_eq!(node.owner(), node.id());
    }

    #[test]
    fn test_user_variant_requires_template() {
        let result = serde_json::from_value::<Node>(json!({
            "id": "variant-button-2",
            "componentType": "button",
            "isChild": false,
            "fromSchema": false
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_instance_requires_owner() {
        let result = serde_json::from_value::<Node>(json!({
            "id": "child-text-1",
            "componentType": "text",
            "isChild": true,
            "derivesFrom": "variant-text-default"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_hidden_flag() {
        let mut node: Node = serde_json::from_value(json!({
            "id": "child-text-1",
            "componentType": "text",
            "isChild": true,
            "fromSchema": true,
            "derivesFrom": "variant-text-default",
            "ownerVariant": "variant-button-default"
        }))
        .unwrap();

        assert!(!node.is_hidden());
        node.data_mut()
            .properties
            .insert(HIDDEN_PROPERTY.to_string(), Value::Bool(true));
        assert!(node.is_hidden());
    }
}
