use crate::diagnostic::Diagnostic;
use crate::rules::LintRule;
use designkit_model::{Document, Node};

/// A child's level may not exceed its parent's
pub struct LevelNestingRule;

impl LintRule for LevelNestingRule {
    fn name(&self) -> &'static str {
        "level-nesting"
    }

    fn description(&self) -> &'static str {
        "Components may only contain components of the same or a lower level"
    }

    fn check_node(&self, doc: &Document, node: &Node) -> Vec<Diagnostic> {
        let level = node.data().level;
        node.children()
            .iter()
            .filter_map(|id| doc.node(id.as_str()))
            .filter(|child| !level.can_contain(child.data().level))
            .map(|child| {
                Diagnostic::error(
                    self.name(),
                    format!(
                        "contains {} at level {}, above its own level {}",
                        child.id(),
                        child.data().level.rank(),
                        level.rank()
                    ),
                    node.id().as_str(),
                )
            })
            .collect()
    }
}
