//! # Component Schema Catalog
//!
//! Describes every component type the tool knows about: its level, the
//! children its default variant is created with, and default property values.
//!
//! The catalog also records schema drift that migrations repair on every
//! load: component types that were renamed, and component types that were
//! retired.

use crate::error::ModelError;
use crate::ids::ComponentType;
use crate::level::Level;
use crate::node::Properties;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

/// Child slot every default variant of a component is created with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateChild {
    pub component_type: ComponentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TemplateChild {
    pub fn new(component_type: &str) -> Self {
        Self {
            component_type: ComponentType::from(component_type),
            label: None,
        }
    }

    pub fn labeled(component_type: &str, label: &str) -> Self {
        Self {
            component_type: ComponentType::from(component_type),
            label: Some(label.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSchema {
    pub component_type: ComponentType,
    pub label: String,
    pub level: Level,
    #[serde(default)]
    pub template_children: Vec<TemplateChild>,
    #[serde(default)]
    pub default_properties: Properties,
}

impl ComponentSchema {
    pub fn new(component_type: &str, label: &str, level: Level) -> Self {
        Self {
            component_type: ComponentType::from(component_type),
            label: label.to_string(),
            level,
            template_children: Vec::new(),
            default_properties: Properties::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TemplateChild>) -> Self {
        self.template_children = children;
        self
    }

    pub fn with_property(mut self, key: &str, value: serde_json::Value) -> Self {
        self.default_properties.insert(key.to_string(), value);
        self
    }
}

/// On-disk catalog shape
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    #[serde(default)]
    components: Vec<ComponentSchema>,
    #[serde(default)]
    renamed: BTreeMap<ComponentType, ComponentType>,
    #[serde(default)]
    retired: BTreeSet<ComponentType>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaCatalog {
    components: BTreeMap<ComponentType, ComponentSchema>,
    renamed: BTreeMap<ComponentType, ComponentType>,
    retired: BTreeSet<ComponentType>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog shipped with the tool
    pub fn builtin() -> Self {
        Self::new()
            .register(ComponentSchema::new("text", "Text", Level::Atom).with_property("content", json!("Text")))
            .register(ComponentSchema::new("icon", "Icon", Level::Atom).with_property("glyph", json!("star")))
            .register(ComponentSchema::new("image", "Image", Level::Atom).with_property("fit", json!("cover")))
            .register(
                ComponentSchema::new("button", "Button", Level::Molecule)
                    .with_children(vec![TemplateChild::labeled("text", "Label")])
                    .with_property("size", json!("medium")),
            )
            .register(
                ComponentSchema::new("input", "Input", Level::Molecule)
                    .with_children(vec![TemplateChild::labeled("text", "Placeholder")]),
            )
            .register(ComponentSchema::new("button-bar", "Button Bar", Level::Organism).with_children(vec![
                TemplateChild::labeled("button", "Primary"),
                TemplateChild::labeled("button", "Secondary"),
            ]))
            .register(ComponentSchema::new("card", "Card", Level::Organism).with_children(vec![
                TemplateChild::new("image"),
                TemplateChild::labeled("text", "Title"),
                TemplateChild::new("button-bar"),
            ]))
            .register(ComponentSchema::new("form", "Form", Level::Organism).with_children(vec![
                TemplateChild::new("input"),
                TemplateChild::labeled("button", "Submit"),
            ]))
            .register(ComponentSchema::new("page-header", "Page Header", Level::Template).with_children(vec![
                TemplateChild::labeled("text", "Heading"),
                TemplateChild::new("button-bar"),
            ]))
            .with_rename("buttonGroup", "button-bar")
            .with_rename("pageHeader", "page-header")
            .with_retired("tooltip")
            .with_retired("marquee")
    }

    pub fn from_json(source: &str) -> Result<Self, ModelError> {
        let file: CatalogFile = serde_json::from_str(source)?;
        let mut catalog = Self::new();
        for schema in file.components {
            catalog = catalog.register(schema);
        }
        catalog.renamed = file.renamed;
        catalog.retired = file.retired;
        Ok(catalog)
    }

    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        let file = CatalogFile {
            components: self.components.values().cloned().collect(),
            renamed: self.renamed.clone(),
            retired: self.retired.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn register(mut self, schema: ComponentSchema) -> Self {
        self.components.insert(schema.component_type.clone(), schema);
        self
    }

    pub fn with_rename(mut self, from: &str, to: &str) -> Self {
        self.renamed.insert(ComponentType::from(from), ComponentType::from(to));
        self
    }

    pub fn with_retired(mut self, component_type: &str) -> Self {
        self.retired.insert(ComponentType::from(component_type));
        self
    }

    pub fn get(&self, component_type: &str) -> Option<&ComponentSchema> {
        self.components.get(component_type)
    }

    pub fn contains(&self, component_type: &str) -> bool {
        self.components.contains_key(component_type)
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentSchema> {
        self.components.values()
    }

    pub fn renamed(&self) -> &BTreeMap<ComponentType, ComponentType> {
        &self.renamed
    }

    pub fn retired(&self) -> &BTreeSet<ComponentType> {
        &self.retired
    }

    pub fn is_retired(&self, component_type: &str) -> bool {
        self.retired.contains(component_type)
    }

    /// Current name of a component type, following rename chains
    pub fn current_name<'a>(&'a self, component_type: &'a ComponentType) -> &'a ComponentType {
        let mut current = component_type;
        let mut hops = 0;
        while let Some(next) = self.renamed.get(current) {
            if hops > self.renamed.len() {
                break;
            }
            current = next;
            hops += 1;
        }
        current
    }
}
