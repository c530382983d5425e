use crate::ids::{ComponentType, NodeId};
use crate::node::Properties;
use crate::theme::ThemeRef;
use serde::{Deserialize, Serialize};

/// Group owning every variant of one component type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub component_type: ComponentType,

    #[serde(default)]
    pub label: String,

    /// Display position among boards (dense `0..N-1`)
    #[serde(default)]
    pub order: u32,

    #[serde(default)]
    pub theme: ThemeRef,

    #[serde(default)]
    pub properties: Properties,

    /// Variant ids, default variant first
    #[serde(default)]
    pub variants: Vec<NodeId>,
}

impl Board {
    pub fn new(component_type: ComponentType, label: impl Into<String>, order: u32) -> Self {
        Self {
            component_type,
            label: label.into(),
            order,
            theme: ThemeRef::default(),
            properties: Properties::new(),
            variants: Vec::new(),
        }
    }

    pub fn contains(&self, variant: &NodeId) -> bool {
        self.variants.contains(variant)
    }
}
