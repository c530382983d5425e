use designkit_model::{Board, Document, Instance, Node, NodeId, Variant};
use std::collections::HashSet;

/// Visitor pattern for traversing a document immutably
///
/// The default implementation walks boards in display order, each board's
/// variants in list order, and every variant's subtree depth-first.
/// Override specific visit_* methods to perform custom actions on nodes.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_board(&mut self, doc: &Document, board: &Board) {
        walk_board(self, doc, board);
    }

    fn visit_node(&mut self, doc: &Document, node: &Node, depth: usize) {
        match node {
            Node::Variant(variant) => self.visit_variant(doc, variant),
            Node::Instance(instance) => self.visit_instance(doc, instance, depth),
        }
    }

    fn visit_variant(&mut self, _doc: &Document, _variant: &Variant) {}

    fn visit_instance(&mut self, _doc: &Document, _instance: &Instance, _depth: usize) {}

    /// Called for an id referenced from a board or child list that is not in
    /// the registry
    fn visit_dangling(&mut self, _referrer: &str, _id: &NodeId) {}
}

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    for board in doc.boards_in_order() {
        visitor.visit_board(doc, board);
    }
}

pub fn walk_board<V: Visitor>(visitor: &mut V, doc: &Document, board: &Board) {
    let mut seen = HashSet::new();
    for variant_id in &board.variants {
        match doc.node(variant_id.as_str()) {
            Some(node) => walk_node(visitor, doc, node, 0, &mut seen),
            None => visitor.visit_dangling(board.component_type.as_str(), variant_id),
        }
    }
}

/// Walk `node` and its subtree. Each node is visited at most once.
pub fn walk_node<V: Visitor>(
    visitor: &mut V,
    doc: &Document,
    node: &Node,
    depth: usize,
    seen: &mut HashSet<NodeId>,
) {
    if !seen.insert(node.id().clone()) {
        return;
    }

    visitor.visit_node(doc, node, depth);

    for child_id in node.children() {
        match doc.node(child_id.as_str()) {
            Some(child) => walk_node(visitor, doc, child, depth + 1, seen),
            None => visitor.visit_dangling(node.id().as_str(), child_id),
        }
    }
}
