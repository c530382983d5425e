//! # Dispatch Pipeline
//!
//! Owns the current document and routes mutations through the engine.
//!
//! Cross-cutting consumers (audit breadcrumbs, debugger state sync) are
//! [`DispatchSink`]s handed to the dispatcher at construction. Each sink sees
//! the document before and after every mutation and cannot change either.

use crate::mutations::{Mutation, MutationResult, Outcome};
use crate::rules::OperationKind;
use crate::EditorError;
use designkit_common::FileSystem;
use designkit_model::{Document, LoadReport, SchemaCatalog};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Observer of dispatched mutations
pub trait DispatchSink {
    fn record(&mut self, before: &Document, mutation: &Mutation, result: &MutationResult);
}

/// Logs one breadcrumb per mutation through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DispatchSink for TracingSink {
    fn record(&mut self, before: &Document, mutation: &Mutation, result: &MutationResult) {
        match &result.outcome {
            Outcome::Applied => tracing::info!(
                operation = %mutation.kind(),
                nodes_before = before.registry.len(),
                nodes_after = result.document.registry.len(),
                created = result.created.mirrors.len() + usize::from(result.created.root.is_some()),
                "mutation applied"
            ),
            Outcome::Noop { reason } => tracing::info!(
                operation = %mutation.kind(),
                %reason,
                "mutation skipped"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Breadcrumb {
    pub operation: OperationKind,
    pub mutation: Mutation,
    pub outcome: Outcome,
    pub nodes_before: usize,
    pub nodes_after: usize,
}

/// In-memory breadcrumb trail. Clones share the same trail, so the caller can
/// keep one handle and give another to the dispatcher.
#[derive(Debug, Default, Clone)]
pub struct BreadcrumbLog {
    entries: Rc<RefCell<Vec<Breadcrumb>>>,
}

impl BreadcrumbLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Breadcrumb> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl DispatchSink for BreadcrumbLog {
    fn record(&mut self, before: &Document, mutation: &Mutation, result: &MutationResult) {
        self.entries.borrow_mut().push(Breadcrumb {
            operation: mutation.kind(),
            mutation: mutation.clone(),
            outcome: result.outcome.clone(),
            nodes_before: before.registry.len(),
            nodes_after: result.document.registry.len(),
        });
    }
}

/// Applies mutations to a document one at a time
pub struct Dispatcher {
    document: Document,
    catalog: SchemaCatalog,
    sinks: Vec<Box<dyn DispatchSink>>,
}

impl Dispatcher {
    pub fn new(document: Document, catalog: SchemaCatalog) -> Self {
        Self {
            document,
            catalog,
            sinks: Vec::new(),
        }
    }

    pub fn with_sinks(
        document: Document,
        catalog: SchemaCatalog,
        sinks: Vec<Box<dyn DispatchSink>>,
    ) -> Self {
        Self {
            document,
            catalog,
            sinks,
        }
    }

    pub fn with_sink(mut self, sink: impl DispatchSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Load a document from `path`. Entries that fail to decode are skipped
    /// and listed in the returned report.
    pub fn load(
        fs: &dyn FileSystem,
        path: &Path,
        catalog: SchemaCatalog,
    ) -> Result<(Self, LoadReport), EditorError> {
        let value = fs.read_json(path)?;
        let (document, report) = Document::from_value(value)?;
        Ok((Self::new(document, catalog), report))
    }

    pub fn save(&self, fs: &mut dyn FileSystem, path: &Path, pretty: bool) -> Result<(), EditorError> {
        let value = serde_json::to_value(&self.document).map_err(designkit_model::ModelError::from)?;
        fs.write_json(path, &value, pretty)?;
        Ok(())
    }

    /// Apply `mutation` to the current document and notify every sink.
    ///
    /// On error the current document is kept and sinks are not notified.
    pub fn dispatch(&mut self, mutation: Mutation) -> Result<MutationResult, EditorError> {
        let result = mutation.apply(&self.document, &self.catalog)?;
        for sink in &mut self.sinks {
            sink.record(&self.document, &mutation, &result);
        }
        self.document = result.document.clone();
        Ok(result)
    }

    /// Dispatch each mutation in order, stopping at the first error. Returns
    /// how many were applied.
    pub fn dispatch_all(
        &mut self,
        mutations: impl IntoIterator<Item = Mutation>,
    ) -> Result<usize, EditorError> {
        let mut applied = 0;
        for mutation in mutations {
            if self.dispatch(mutation)?.is_applied() {
                applied += 1;
            }
        }
        Ok(applied)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use designkit_common::MockFileSystem;
    use designkit_model::ComponentType;

    #[test]
    fn test_dispatch_notifies_sinks() {
        let log = BreadcrumbLog::new();
        let mut dispatcher = Dispatcher::new(Document::empty(5), SchemaCatalog::builtin())
            .with_sink(log.clone())
            .with_sink(TracingSink);

        dispatcher
            .dispatch(Mutation::AddComponent {
                component_type: ComponentType::from("button"),
            })
            .unwrap();
        dispatcher
            .dispatch(Mutation::AddComponent {
                component_type: ComponentType::from("button"),
            })
            .unwrap();

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, OperationKind::Create);
        assert_eq!(entries[0].nodes_before, 0);
        assert!(entries[0].nodes_after > 0);
        assert!(matches!(entries[1].outcome, Outcome::Noop { .. }));
    }

    #[test]
    fn test_failed_dispatch_keeps_document() {
        let log = BreadcrumbLog::new();
        let mut dispatcher =
            Dispatcher::new(Document::empty(5), SchemaCatalog::builtin()).with_sink(log.clone());

        let result = dispatcher.dispatch(Mutation::AddComponent {
            component_type: ComponentType::from("carousel"),
        });

        assert!(result.is_err());
        assert!(log.is_empty());
        assert!(dispatcher.document().boards.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let mut fs = MockFileSystem::new();
        let path = Path::new("design.json");
        let mut dispatcher = Dispatcher::new(Document::empty(5), SchemaCatalog::builtin());
        dispatcher
            .dispatch(Mutation::AddComponent {
                component_type: ComponentType::from("card"),
            })
            .unwrap();
        dispatcher.save(&mut fs, path, true).unwrap();

        let (loaded, report) = Dispatcher::load(&fs, path, SchemaCatalog::builtin()).unwrap();
        assert!(report.is_clean());
        assert_eq!(loaded.document(), dispatcher.document());
    }
}
