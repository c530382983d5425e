use crate::diagnostic::Diagnostic;
use crate::rules::LintRule;
use designkit_model::{Document, Node, NodeId};
use std::collections::HashSet;

/// Every id a node or board refers to must be in the registry
pub struct DanglingReferenceRule;

impl LintRule for DanglingReferenceRule {
    fn name(&self) -> &'static str {
        "dangling-reference"
    }

    fn description(&self) -> &'static str {
        "Child lists, board variant lists and derivation links must point at existing nodes"
    }

    fn check_node(&self, doc: &Document, node: &Node) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if let Some(template) = node.derives_from() {
            if !doc.contains(template.as_str()) {
                diagnostics.push(Diagnostic::error(
                    self.name(),
                    format!("derives from missing node {template}"),
                    node.id().as_str(),
                ));
            }
        }

        if let Node::Instance(instance) = node {
            match doc.node(instance.owner_variant.as_str()) {
                Some(Node::Variant(_)) => {}
                Some(Node::Instance(_)) => diagnostics.push(Diagnostic::error(
                    self.name(),
                    format!("owner {} is not a variant", instance.owner_variant),
                    node.id().as_str(),
                )),
                None => diagnostics.push(Diagnostic::error(
                    self.name(),
                    format!("owner variant {} is missing", instance.owner_variant),
                    node.id().as_str(),
                )),
            }
        }

        diagnostics
    }

    fn check_dangling(&self, referrer: &str, id: &NodeId) -> Vec<Diagnostic> {
        vec![Diagnostic::error(self.name(), format!("refers to missing node {id}"), referrer)
            .with_suggestion(format!("Remove {id} from {referrer}"))]
    }
}

/// Nodes that no board can reach
pub struct OrphanNodeRule;

impl LintRule for OrphanNodeRule {
    fn name(&self) -> &'static str {
        "orphan-node"
    }

    fn description(&self) -> &'static str {
        "Every node should be reachable from a board"
    }

    fn check_document(&self, doc: &Document) -> Vec<Diagnostic> {
        let reachable: HashSet<NodeId> = doc
            .boards
            .values()
            .flat_map(|board| board.variants.iter())
            .flat_map(|variant| doc.subtree(variant.as_str()))
            .collect();

        doc.registry
            .keys()
            .filter(|id| !reachable.contains(*id))
            .map(|id| {
                Diagnostic::warning(self.name(), "not reachable from any board", id.as_str())
            })
            .collect()
    }
}
