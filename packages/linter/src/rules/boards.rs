use crate::diagnostic::Diagnostic;
use crate::rules::LintRule;
use designkit_model::{Board, Document, Node};
use std::collections::HashSet;

/// Board variant lists hold each variant of the board's type exactly once,
/// default variant first
pub struct BoardMembershipRule;

impl LintRule for BoardMembershipRule {
    fn name(&self) -> &'static str {
        "board-membership"
    }

    fn description(&self) -> &'static str {
        "Every variant belongs to exactly one board of its component type"
    }

    fn check_document(&self, doc: &Document) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (key, board) in doc.boards.iter() {
            if key != &board.component_type {
                diagnostics.push(Diagnostic::error(
                    self.name(),
                    format!("board is stored under key {key}"),
                    board.component_type.as_str(),
                ));
            }
        }

        for (id, node) in doc.registry.iter() {
            if node.as_variant().is_none() {
                continue;
            }
            let listed = doc
                .board(node.component_type().as_str())
                .map(|board| board.contains(id))
                .unwrap_or(false);
            if !listed {
                diagnostics.push(
                    Diagnostic::error(self.name(), "variant is not listed on its board", id.as_str())
                        .with_suggestion(format!("Add {id} to board {}", node.component_type())),
                );
            }
        }

        diagnostics
    }

    fn check_board(&self, doc: &Document, board: &Board) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let subject = board.component_type.as_str();
        let mut seen = HashSet::new();

        for id in &board.variants {
            if !seen.insert(id) {
                diagnostics.push(Diagnostic::error(
                    self.name(),
                    format!("{id} is listed more than once"),
                    subject,
                ));
            }
            match doc.node(id.as_str()) {
                Some(Node::Instance(_)) => diagnostics.push(Diagnostic::error(
                    self.name(),
                    format!("{id} is an instance, not a variant"),
                    subject,
                )),
                Some(node) if node.component_type() != &board.component_type => {
                    diagnostics.push(Diagnostic::error(
                        self.name(),
                        format!("{id} is a {} variant", node.component_type()),
                        subject,
                    ))
                }
                _ => {}
            }
        }

        let default_first = board
            .variants
            .first()
            .and_then(|id| doc.node(id.as_str()))
            .map(Node::is_default_variant)
            .unwrap_or(false);
        if !default_first {
            diagnostics.push(Diagnostic::warning(
                self.name(),
                "default variant is not listed first",
                subject,
            ));
        }

        diagnostics
    }
}

/// Board orders are a dense `0..N-1` permutation
pub struct DenseBoardOrderRule;

impl LintRule for DenseBoardOrderRule {
    fn name(&self) -> &'static str {
        "dense-board-order"
    }

    fn description(&self) -> &'static str {
        "Board display orders must be 0..N-1 without gaps or duplicates"
    }

    fn check_document(&self, doc: &Document) -> Vec<Diagnostic> {
        doc.boards_in_order()
            .into_iter()
            .enumerate()
            .filter(|(position, board)| board.order as usize != *position)
            .map(|(position, board)| {
                Diagnostic::warning(
                    self.name(),
                    format!("order is {}, expected {position}", board.order),
                    board.component_type.as_str(),
                )
            })
            .collect()
    }
}
