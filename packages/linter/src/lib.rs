//! # DesignKit Linter
//!
//! Structural checks over a whole document: every reference resolves, the
//! derivation graph is a forest rooted at default variants, instances stay
//! congruent with their templates, and boards are well formed.

mod diagnostic;
mod linter;
mod rules;

pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use linter::{has_errors, lint_document, LintOptions};
pub use rules::{
    BoardMembershipRule, DanglingReferenceRule, DenseBoardOrderRule, DerivationForestRule,
    LevelNestingRule, LintRule, OrphanNodeRule, RuleRegistry, SchemaCongruenceRule,
};
