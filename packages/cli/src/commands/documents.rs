use crate::config::DEFAULT_CONFIG_NAME;
use anyhow::{Context, Result};
use designkit_common::FileSystem;
use designkit_migrations::{migrate_document, MigrationReport};
use designkit_model::{Document, SchemaCatalog, SystemThemeComputer};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Resolve `input` to the document files it names.
///
/// A directory is searched recursively for `.json` files, skipping the
/// project config.
pub fn find_documents(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(anyhow::anyhow!(
            "Input path does not exist: {}",
            input.display()
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }
        if path.file_name().map(|n| n == DEFAULT_CONFIG_NAME).unwrap_or(false) {
            continue;
        }
        files.push(path.to_path_buf());
    }
    Ok(files)
}

/// Read a persisted document and bring it to the current schema
pub fn load_document(
    fs: &dyn FileSystem,
    path: &Path,
    catalog: &SchemaCatalog,
) -> Result<(Document, MigrationReport)> {
    let value = fs
        .read_json(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let (document, report) = migrate_document(value, catalog, &SystemThemeComputer)
        .with_context(|| format!("Cannot migrate {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        from_version = report.from_version,
        skipped = report.diagnostics.len(),
        "loaded document"
    );
    Ok((document, report))
}
