use designkit_model::{SchemaCatalog, ThemeComputer};
use serde::Serialize;
use std::fmt;

/// Entry left untouched because it did not have the expected shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationDiagnostic {
    /// Migration that found the entry
    pub migration: &'static str,
    /// `boards.<key>` or `byId.<key>`
    pub path: String,
    pub message: String,
}

impl fmt::Display for MigrationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.migration, self.path, self.message)
    }
}

/// What one pipeline run did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    /// Names of the migrations that ran, in order
    pub applied: Vec<&'static str>,
    pub diagnostics: Vec<MigrationDiagnostic>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Collaborators and bookkeeping handed to every migration
pub struct MigrationContext<'a> {
    pub catalog: &'a SchemaCatalog,
    pub theme_computer: &'a dyn ThemeComputer,
    pub(crate) current: &'static str,
    pub(crate) report: MigrationReport,
}

impl<'a> MigrationContext<'a> {
    pub fn new(catalog: &'a SchemaCatalog, theme_computer: &'a dyn ThemeComputer) -> Self {
        Self {
            catalog,
            theme_computer,
            current: "",
            report: MigrationReport::default(),
        }
    }

    /// Record an entry the current migration could not handle.
    ///
    /// Each path is reported once per run, by the first migration that
    /// tripped over it.
    pub fn skip(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let path = path.into();
        if self.report.diagnostics.iter().any(|d| d.path == path) {
            return;
        }
        let message = message.into();
        tracing::warn!(migration = self.current, %path, %message, "skipping malformed entry");
        self.report.diagnostics.push(MigrationDiagnostic {
            migration: self.current,
            path,
            message,
        });
    }

    pub fn report(&self) -> &MigrationReport {
        &self.report
    }

    pub(crate) fn into_report(self) -> MigrationReport {
        self.report
    }
}
