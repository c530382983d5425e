//! # DesignKit Migrations
//!
//! Upgrades persisted documents to the current schema before they are
//! decoded.
//!
//! ## Pipeline
//!
//! ```text
//! JSON (any version)
//!   → versioned migrations above `version`, ascending
//!       1 baseline              fill missing fields, keep `version`
//!       2 visibility-to-hidden  `visible: false` → `hidden` property
//!       3 recompute-theme       injected ThemeComputer
//!       4 derivation-links      explicit fromSchema / derivesFrom / ownerVariant
//!       5 dense-board-order     board orders 0..N-1
//!   → schema fixes, every run
//!       rename-component-types
//!       remove-retired-components
//!   → JSON at CURRENT_SCHEMA_VERSION
//! ```
//!
//! A malformed node never stops the pipeline: it is left as found and listed
//! in the [`MigrationReport`]. Running the pipeline on its own output changes
//! nothing.

mod error;
mod fixes;
mod pipeline;
mod raw;
mod report;
mod versioned;

pub use error::MigrationError;
pub use fixes::{remove_retired_components, rename_component_types, SchemaFix};
pub use pipeline::{migrate, migrate_document, Migrator, CURRENT_SCHEMA_VERSION};
pub use raw::Object;
pub use report::{MigrationContext, MigrationDiagnostic, MigrationReport};
pub use versioned::{
    baseline, dense_board_order, derivation_links, recompute_theme, visibility_to_hidden, MigrationFn,
    VersionedMigration,
};
