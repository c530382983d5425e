use crate::diagnostic::Diagnostic;
use crate::rules::RuleRegistry;
use designkit_common::{walk_board, Visitor};
use designkit_model::{Board, Document, Node, NodeId};

/// Options for configuring the linter
#[derive(Debug, Default)]
pub struct LintOptions {
    /// Custom rule registry (uses default if None)
    pub registry: Option<RuleRegistry>,
}

/// Lint a document and return diagnostics
pub fn lint_document(document: &Document, options: LintOptions) -> Vec<Diagnostic> {
    let registry = options.registry.unwrap_or_default();
    let mut visitor = LintVisitor {
        registry: &registry,
        diagnostics: Vec::new(),
    };

    for rule in registry.rules() {
        visitor.diagnostics.extend(rule.check_document(document));
    }

    visitor.visit_document(document);
    visitor.diagnostics
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Runs board and node rules over everything reachable from a board
struct LintVisitor<'a> {
    registry: &'a RuleRegistry,
    diagnostics: Vec<Diagnostic>,
}

impl Visitor for LintVisitor<'_> {
    fn visit_board(&mut self, doc: &Document, board: &Board) {
        for rule in self.registry.rules() {
            self.diagnostics.extend(rule.check_board(doc, board));
        }
        walk_board(self, doc, board);
    }

    fn visit_node(&mut self, doc: &Document, node: &Node, _depth: usize) {
        for rule in self.registry.rules() {
            self.diagnostics.extend(rule.check_node(doc, node));
        }
    }

    fn visit_dangling(&mut self, referrer: &str, id: &NodeId) {
        for rule in self.registry.rules() {
            self.diagnostics.extend(rule.check_dangling(referrer, id));
        }
    }
}
