//! # DesignKit Editor
//!
//! Mutation engine for design documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Dispatcher: current document + sinks        │
//! └─────────────────────────────────────────────┘
//!                     ↓ Mutation
//! ┌─────────────────────────────────────────────┐
//! │ rules: (operation, entity kind) → Rule      │
//! │  - allowed?                                 │
//! │  - propagation scope                        │
//! │  - delete or hide                           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ propagation: edit target + every mirror     │
//! │  - insert / remove / duplicate              │
//! │  - move / reorder                           │
//! │  - property, theme and label writes         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//!            MutationResult { document, outcome, created }
//! ```
//!
//! ## Core Principles
//!
//! 1. **Documents are values**: `apply` takes `&Document` and returns a new one
//! 2. **Denied is not failed**: a disallowed operation is a no-op, an unknown
//!    id is an error
//! 3. **Mirrors stay congruent**: every instance of a template keeps the
//!    template's schema-defined children, in the same order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use designkit_editor::{Dispatcher, Mutation, TracingSink};
//! use designkit_model::{Document, SchemaCatalog};
//!
//! let mut dispatcher = Dispatcher::new(Document::empty(5), SchemaCatalog::builtin())
//!     .with_sink(TracingSink);
//!
//! dispatcher.dispatch(Mutation::AddComponent {
//!     component_type: "button-bar".into(),
//! })?;
//!
//! let result = dispatcher.dispatch(Mutation::InsertInstance {
//!     parent_id: "variant-button-default".into(),
//!     index: 0,
//!     template_id: "variant-text-default".into(),
//! })?;
//! println!("{} mirrors updated", result.created.mirrors.len());
//! ```

mod creation;
mod errors;
mod index;
mod mutations;
mod pipeline;
mod propagation;
mod rules;
mod structure;

pub use errors::EditorError;
pub use index::DerivationIndex;
pub use mutations::{apply, CreatedNodes, Mutation, MutationError, MutationResult, NoopReason, Outcome};
pub use pipeline::{Breadcrumb, BreadcrumbLog, DispatchSink, Dispatcher, TracingSink};
pub use propagation::{propagate, LocalEdit, Propagator};
pub use rules::{
    rule, EntityKind, OperationKind, PropagationScope, RemovalBehavior, RemovalMode, Rule,
};
