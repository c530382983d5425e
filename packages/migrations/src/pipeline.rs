use crate::error::MigrationError;
use crate::fixes::{self, SchemaFix};
use crate::raw::version_of;
use crate::report::{MigrationContext, MigrationDiagnostic, MigrationReport};
use crate::versioned::{self, VersionedMigration};
use designkit_model::{Document, SchemaCatalog, ThemeComputer};
use serde_json::Value;

/// Version written by the newest built-in migration
pub const CURRENT_SCHEMA_VERSION: u32 = 5;

/// Ordered set of migrations bound to a catalog and a theme computer
pub struct Migrator<'a> {
    catalog: &'a SchemaCatalog,
    theme_computer: &'a dyn ThemeComputer,
    versioned: Vec<VersionedMigration>,
    fixes: Vec<SchemaFix>,
}

impl<'a> Migrator<'a> {
    pub fn new(catalog: &'a SchemaCatalog, theme_computer: &'a dyn ThemeComputer) -> Self {
        Self {
            catalog,
            theme_computer,
            versioned: versioned::builtin(),
            fixes: fixes::builtin(),
        }
    }

    pub fn with_migration(mut self, migration: VersionedMigration) -> Self {
        self.versioned.push(migration);
        self
    }

    pub fn with_fix(mut self, fix: SchemaFix) -> Self {
        self.fixes.push(fix);
        self
    }

    /// Versioned migrations in the order they run
    pub fn migrations(&self) -> Vec<VersionedMigration> {
        let mut ordered = self.versioned.clone();
        ordered.sort_by_key(|m| m.version);
        ordered
    }

    pub fn fixes(&self) -> &[SchemaFix] {
        &self.fixes
    }

    /// Upgrade a persisted document to the current shape.
    ///
    /// Every versioned migration above the document's version runs in version
    /// order, then every schema fix runs. Malformed entries are reported, not
    /// fatal.
    pub fn run(&self, value: Value) -> Result<(Value, MigrationReport), MigrationError> {
        let Value::Object(mut root) = value else {
            return Err(MigrationError::InvalidRoot);
        };

        let mut ctx = MigrationContext::new(self.catalog, self.theme_computer);
        ctx.report.from_version = version_of(&root);

        for migration in self.migrations() {
            if migration.version <= version_of(&root) {
                continue;
            }
            ctx.current = migration.name;
            (migration.apply)(&mut root, &mut ctx)?;
            ctx.report.applied.push(migration.name);
            tracing::info!(
                migration = migration.name,
                version = version_of(&root),
                "applied migration"
            );
        }

        for fix in &self.fixes {
            ctx.current = fix.name;
            (fix.apply)(&mut root, &mut ctx)?;
        }

        ctx.report.to_version = version_of(&root);
        Ok((Value::Object(root), ctx.into_report()))
    }

    /// Migrate and decode. Entries the decoder rejects are added to the
    /// report under the `load` step.
    pub fn load(&self, value: Value) -> Result<(Document, MigrationReport), MigrationError> {
        let (value, mut report) = self.run(value)?;
        let (document, load) = Document::from_value(value)?;

        for skipped in load.skipped {
            if report.diagnostics.iter().any(|d| d.path == skipped.path) {
                continue;
            }
            report.diagnostics.push(MigrationDiagnostic {
                migration: "load",
                path: skipped.path,
                message: skipped.reason,
            });
        }
        Ok((document, report))
    }
}

/// Run the built-in pipeline on a persisted document
pub fn migrate(
    value: Value,
    catalog: &SchemaCatalog,
    theme_computer: &dyn ThemeComputer,
) -> Result<(Value, MigrationReport), MigrationError> {
    Migrator::new(catalog, theme_computer).run(value)
}

/// Run the built-in pipeline and decode the result
pub fn migrate_document(
    value: Value,
    catalog: &SchemaCatalog,
    theme_computer: &dyn ThemeComputer,
) -> Result<(Document, MigrationReport), MigrationError> {
    Migrator::new(catalog, theme_computer).load(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{set_version, Object};
    use designkit_model::SystemThemeComputer;
    use serde_json::json;

    fn tag(root: &mut Object, _ctx: &mut MigrationContext<'_>) -> Result<(), MigrationError> {
        root.insert("tagged".to_string(), json!(true));
        set_version(root, 7);
        Ok(())
    }

    #[test]
    fn test_migrations_sorted_at_run_time() {
        let catalog = SchemaCatalog::builtin();
        let migrator = Migrator::new(&catalog, &SystemThemeComputer).with_migration(VersionedMigration {
            version: 7,
            name: "tag",
            apply: tag,
        });
        let migrator = Migrator {
            versioned: migrator.versioned.into_iter().rev().collect(),
            ..migrator
        };

        let (doc, report) = migrator.run(json!({})).unwrap();
        assert_eq!(
            report.applied,
            vec![
                "baseline",
                "visibility-to-hidden",
                "recompute-theme",
                "derivation-links",
                "dense-board-order",
                "tag"
            ]
        );
        assert_eq!(doc["version"], 7);
        assert_eq!(report.from_version, 0);
        assert_eq!(report.to_version, 7);
    }

    #[test]
    fn test_only_newer_migrations_run() {
        let catalog = SchemaCatalog::builtin();
        let (_, report) = migrate(
            json!({ "version": 3, "boards": {}, "byId": {} }),
            &catalog,
            &SystemThemeComputer,
        )
        .unwrap();

        assert_eq!(report.applied, vec!["derivation-links", "dense-board-order"]);
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        let catalog = SchemaCatalog::builtin();
        let result = migrate(json!("design"), &catalog, &SystemThemeComputer);
        assert_eq!(result.unwrap_err(), MigrationError::InvalidRoot);
    }

    #[test]
    fn test_current_version_matches_last_builtin() {
        let last = versioned::builtin().iter().map(|m| m.version).max();
        assert_eq!(last, Some(CURRENT_SCHEMA_VERSION));
    }
}
