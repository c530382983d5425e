//! # DesignKit Model
//!
//! In-memory representation of a design document.
//!
//! ## Structure
//!
//! ```text
//! Document
//!  ├─ boards:   component type → Board (ordered list of variant ids)
//!  └─ registry: node id → Node (Variant | Instance)
//!                 Variant  ── children ──▶ Instance ── children ──▶ Instance
//!                    ▲                        │
//!                    └──────── derives_from ──┘
//! ```
//!
//! The registry is the only place nodes live. Everything else (board variant
//! lists, child lists, `derives_from`, `owner_variant`) refers to nodes by id.
//!
//! Both maps are persistent (`im::OrdMap`), so cloning a [`Document`] is cheap
//! and edits made to a clone never show through to the original.

pub mod board;
pub mod catalog;
pub mod document;
pub mod error;
pub mod ids;
pub mod level;
pub mod node;
pub mod persist;
pub mod theme;

pub use board::Board;
pub use catalog::{ComponentSchema, SchemaCatalog, TemplateChild};
pub use document::Document;
pub use error::ModelError;
pub use ids::{ComponentType, NodeId, NodeKind};
pub use level::Level;
pub use node::{Instance, Node, NodeData, Properties, Variant, VariantOrigin, HIDDEN_PROPERTY};
pub use persist::{LoadReport, SkippedEntry};
pub use theme::{system_default_theme, SystemThemeComputer, Theme, ThemeComputer, ThemeRef};
