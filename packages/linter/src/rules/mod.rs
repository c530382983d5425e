mod boards;
mod congruence;
mod derivation;
mod levels;
mod references;

pub use boards::{BoardMembershipRule, DenseBoardOrderRule};
pub use congruence::SchemaCongruenceRule;
pub use derivation::DerivationForestRule;
pub use levels::LevelNestingRule;
pub use references::{DanglingReferenceRule, OrphanNodeRule};

use crate::diagnostic::Diagnostic;
use designkit_model::{Board, Document, Node, NodeId};

/// Trait for implementing lint rules
pub trait LintRule {
    /// Unique identifier for this rule
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Check the document as a whole, once per lint run
    fn check_document(&self, _doc: &Document) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Check a board (called in display order)
    fn check_board(&self, _doc: &Document, _board: &Board) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Check a node reachable from a board
    fn check_node(&self, _doc: &Document, _node: &Node) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Check a board or child list entry that is missing from the registry
    fn check_dangling(&self, _referrer: &str, _id: &NodeId) -> Vec<Diagnostic> {
        Vec::new()
    }
}

/// Registry of all available lint rules
pub struct RuleRegistry {
    rules: Vec<Box<dyn LintRule>>,
}

impl RuleRegistry {
    /// Create a new registry with all built-in rules
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(DanglingReferenceRule),
                Box::new(OrphanNodeRule),
                Box::new(DerivationForestRule),
                Box::new(SchemaCongruenceRule),
                Box::new(BoardMembershipRule),
                Box::new(DenseBoardOrderRule),
                Box::new(LevelNestingRule),
            ],
        }
    }

    /// Get all registered rules
    pub fn rules(&self) -> &[Box<dyn LintRule>] {
        &self.rules
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a custom rule to the registry
    pub fn add_rule(&mut self, rule: Box<dyn LintRule>) {
        self.rules.push(rule);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &format!("{} rules", self.rules.len()))
            .finish()
    }
}
