//! Reverse lookups over the node registry
//!
//! The registry only stores forward references (`derives_from`, child lists).
//! Propagation needs the opposite direction: "who mirrors this node" and
//! "who contains this node". Both are built once per operation and kept in
//! sync by the engine as it edits its working copy.

use designkit_model::{Document, Node, NodeId};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Default)]
pub struct DerivationIndex {
    /// template id → nodes whose `derives_from` is that template
    derived: HashMap<NodeId, Vec<NodeId>>,
    /// child id → parent id
    parents: HashMap<NodeId, NodeId>,
}

impl DerivationIndex {
    pub fn build(doc: &Document) -> Self {
        let mut index = Self::default();
        for (id, node) in doc.registry.iter() {
            index.link(node);
            for child in node.children() {
                index.parents.insert(child.clone(), id.clone());
            }
        }
        index
    }

    /// Nodes deriving directly from `id`, in registry order
    pub fn direct_mirrors(&self, id: &str) -> &[NodeId] {
        self.derived.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every node deriving from `id`, transitively, breadth first.
    ///
    /// Each node appears once even when several chains reach it.
    pub fn mirrors_of(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut queue: VecDeque<&str> = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            for mirror in self.direct_mirrors(current) {
                if seen.insert(mirror.as_str()) {
                    out.push(mirror.clone());
                    queue.push_back(mirror.as_str());
                }
            }
        }

        out
    }

    pub fn parent(&self, id: &str) -> Option<&NodeId> {
        self.parents.get(id)
    }

    pub fn set_parent(&mut self, child: &NodeId, parent: &NodeId) {
        self.parents.insert(child.clone(), parent.clone());
    }

    pub fn clear_parent(&mut self, child: &str) {
        self.parents.remove(child);
    }

    /// Record `node` as a mirror of its template
    pub fn link(&mut self, node: &Node) {
        if let Some(template) = node.derives_from() {
            let mirrors = self.derived.entry(template.clone()).or_default();
            if !mirrors.contains(node.id()) {
                mirrors.push(node.id().clone());
            }
        }
    }

    /// Forget `node` as a mirror and as a template
    pub fn unlink(&mut self, node: &Node) {
        if let Some(template) = node.derives_from() {
            if let Some(mirrors) = self.derived.get_mut(template.as_str()) {
                mirrors.retain(|m| m != node.id());
            }
        }
        self.derived.remove(node.id().as_str());
    }
}
