use crate::diagnostic::Diagnostic;
use crate::rules::LintRule;
use designkit_model::{Document, Node};
use std::collections::HashSet;

/// `derives_from` links form a forest rooted at default variants
pub struct DerivationForestRule;

impl LintRule for DerivationForestRule {
    fn name(&self) -> &'static str {
        "derivation-forest"
    }

    fn description(&self) -> &'static str {
        "Derivation chains must end at a default variant of the same component type"
    }

    fn check_document(&self, doc: &Document) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (id, node) in doc.registry.iter() {
            if let Some(template) = node.derives_from().and_then(|t| doc.node(t.as_str())) {
                if template.component_type() != node.component_type() {
                    diagnostics.push(Diagnostic::error(
                        self.name(),
                        format!(
                            "{} node derives from {} of type {}",
                            node.component_type(),
                            template.id(),
                            template.component_type()
                        ),
                        id.as_str(),
                    ));
                }
                if node.as_variant().is_some() && template.as_instance().is_some() {
                    diagnostics.push(Diagnostic::error(
                        self.name(),
                        format!("variant derives from instance {}", template.id()),
                        id.as_str(),
                    ));
                }
            }

            if chain_cycles(doc, node) {
                diagnostics.push(Diagnostic::error(
                    self.name(),
                    "derivation chain loops back on itself",
                    id.as_str(),
                ));
            }
        }

        diagnostics
    }
}

fn chain_cycles(doc: &Document, start: &Node) -> bool {
    let mut seen = HashSet::from([start.id()]);
    let mut cursor = start.derives_from();
    while let Some(id) = cursor {
        if !seen.insert(id) {
            return true;
        }
        cursor = doc.node(id.as_str()).and_then(Node::derives_from);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cycle_is_reported() {
        let doc: Document = serde_json::from_value(json!({
            "byId": {
                "child-text-1": {
                    "id": "child-text-1", "componentType": "text", "isChild": true,
                    "derivesFrom": "child-text-2", "ownerVariant": "variant-a-default"
                },
                "child-text-2": {
                    "id": "child-text-2", "componentType": "text", "isChild": true,
                    "derivesFrom": "child-text-1", "ownerVariant": "variant-b-default"
                }
            }
        }))
        .unwrap();

        let diagnostics = DerivationForestRule.check_document(&doc);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.message.contains("loops")));
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let doc: Document = serde_json::from_value(json!({
            "byId": {
                "variant-text-default": {
                    "id": "variant-text-default", "componentType": "text",
                    "isChild": false, "fromSchema": true
                },
                "child-icon-1": {
                    "id": "child-icon-1", "componentType": "icon", "isChild": true,
                    "derivesFrom": "variant-text-default", "ownerVariant": "variant-text-default"
                }
            }
        }))
        .unwrap();

        let diagnostics = DerivationForestRule.check_document(&doc);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].subject, "child-icon-1");
    }
}
