use crate::diagnostic::Diagnostic;
use crate::rules::LintRule;
use designkit_model::{Document, Node, NodeId};

/// A node's schema-defined children mirror its template's, one for one and in
/// the same order
pub struct SchemaCongruenceRule;

impl LintRule for SchemaCongruenceRule {
    fn name(&self) -> &'static str {
        "schema-congruence"
    }

    fn description(&self) -> &'static str {
        "Schema-defined children must match the template's schema-defined children"
    }

    fn check_node(&self, doc: &Document, node: &Node) -> Vec<Diagnostic> {
        let Some(template) = node.derives_from().and_then(|t| doc.node(t.as_str())) else {
            return Vec::new();
        };

        let expected: Vec<&NodeId> = schema_children(doc, template).map(|n| n.id()).collect();
        let actual: Vec<Option<&NodeId>> = schema_children(doc, node).map(|n| n.derives_from()).collect();

        if expected.len() != actual.len() {
            return vec![Diagnostic::error(
                self.name(),
                format!(
                    "has {} schema-defined children, template {} has {}",
                    actual.len(),
                    template.id(),
                    expected.len()
                ),
                node.id().as_str(),
            )];
        }

        expected
            .iter()
            .zip(&actual)
            .enumerate()
            .filter(|(_, (want, got))| got.as_ref() != Some(*want))
            .map(|(slot, (want, _))| {
                Diagnostic::error(
                    self.name(),
                    format!("schema-defined child {slot} does not mirror {want}"),
                    node.id().as_str(),
                )
            })
            .collect()
    }
}

fn schema_children<'a>(doc: &'a Document, node: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
    node.children()
        .iter()
        .filter_map(move |id| doc.node(id.as_str()))
        .filter(|child| child.from_schema())
}
