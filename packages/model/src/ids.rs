//! Identifiers
//!
//! Node ids are namespaced strings: `variant-<componentType>-<discriminator>`
//! for variants and `child-<componentType>-<discriminator>` for instances.
//! At runtime the kind of a node comes from the [`Node`](crate::Node) enum;
//! the prefix only matters for persisted data.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

pub const VARIANT_PREFIX: &str = "variant";
pub const INSTANCE_PREFIX: &str = "child";

/// Discriminator of the schema-provided variant of every board
pub const DEFAULT_DISCRIMINATOR: &str = "default";

/// Identifier of a component type (e.g. `button`, `button-bar`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentType(String);

impl ComponentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for ComponentType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Variant,
    Instance,
}

impl NodeKind {
    pub fn prefix(self) -> &'static str {
        match self {
            NodeKind::Variant => VARIANT_PREFIX,
            NodeKind::Instance => INSTANCE_PREFIX,
        }
    }
}

/// Identifier of a variant or an instance
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build a namespaced id for a node of `kind`
    pub fn compose(kind: NodeKind, component_type: &ComponentType, discriminator: &str) -> Self {
        Self(format!("{}-{}-{}", kind.prefix(), component_type, discriminator))
    }

    pub fn variant(component_type: &ComponentType, discriminator: &str) -> Self {
        Self::compose(NodeKind::Variant, component_type, discriminator)
    }

    pub fn instance(component_type: &ComponentType, discriminator: &str) -> Self {
        Self::compose(NodeKind::Instance, component_type, discriminator)
    }

    /// Id of the default variant of a component type
    pub fn default_variant(component_type: &ComponentType) -> Self {
        Self::variant(component_type, DEFAULT_DISCRIMINATOR)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Kind implied by the persisted prefix
    pub fn prefix_kind(&self) -> Option<NodeKind> {
        if self.0.starts_with("variant-") {
            Some(NodeKind::Variant)
        } else if self.0.starts_with("child-") {
            Some(NodeKind::Instance)
        } else {
            None
        }
    }

    /// Discriminator part, if this id is namespaced under `component_type`
    pub fn discriminator(&self, component_type: &ComponentType) -> Option<&str> {
        let kind = self.prefix_kind()?;
        let rest = self.0.strip_prefix(kind.prefix())?.strip_prefix('-')?;
        rest.strip_prefix(component_type.as_str())?.strip_prefix('-')
    }

    /// Same id re-namespaced under another component type.
    ///
    /// Returns `None` when the id is not namespaced under `from`.
    pub fn renamespaced(&self, from: &ComponentType, to: &ComponentType) -> Option<NodeId> {
        let kind = self.prefix_kind()?;
        let discriminator = self.discriminator(from)?;
        Some(NodeId::compose(kind, to, discriminator))
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_ids() {
        let button = ComponentType::from("button");
        assert_eq!(NodeId::default_variant(&button).as_str(), "variant-button-default");
        assert_eq!(NodeId::instance(&button, "3").as_str(), "child-button-3");
    }

    #[test]
    fn test_prefix_kind() {
        assert_eq!(NodeId::from("variant-card-2").prefix_kind(), Some(NodeKind::Variant));
        assert_eq!(NodeId::from("child-card-2").prefix_kind(), Some(NodeKind::Instance));
        assert_eq!(NodeId::from("card-2").prefix_kind(), None);
    }

    #[test]
    fn test_discriminator_with_dashed_component_type() {
        let bar = ComponentType::from("button-bar");
        let id = NodeId::instance(&bar, "7");
        assert_eq!(id.discriminator(&bar), Some("7"));
        assert_eq!(id.discriminator(&ComponentType::from("button")), Some("bar-7"));
        assert_eq!(id.discriminator(&ComponentType::from("card")), None);
    }

    #[test]
    fn test_renamespace() {
        let old = ComponentType::from("buttonGroup");
        let new = ComponentType::from("button-bar");
        let id = NodeId::from("variant-buttonGroup-default");
        assert_eq!(
            id.renamespaced(&old, &new),
            Some(NodeId::from("variant-button-bar-default"))
        );
        assert_eq!(NodeId::from("child-text-1").renamespaced(&old, &new), None);
    }
}
