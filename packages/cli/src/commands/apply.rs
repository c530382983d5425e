use super::documents::load_document;
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use designkit_common::{FileSystem, RealFileSystem};
use designkit_editor::{BreadcrumbLog, Dispatcher, Mutation, Outcome, TracingSink};
use designkit_model::SchemaCatalog;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Document to edit
    pub document: PathBuf,

    /// JSON array of mutations, applied in order
    pub mutations: PathBuf,

    /// Where to write the edited document (defaults to the config's outDir or in place)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn apply(args: ApplyArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let catalog = config.load_catalog(cwd)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.output_path(cwd, &args.document));

    println!("✏️  {} {}", "Editing".green().bold(), args.document.display());

    let mut fs = RealFileSystem;
    let log = apply_file(&mut fs, &args.document, &args.mutations, &output, catalog, &config)?;

    for (i, crumb) in log.entries().iter().enumerate() {
        match &crumb.outcome {
            Outcome::Applied => println!("  {} #{} {}", "✓".green(), i, crumb.operation),
            Outcome::Noop { reason } => {
                println!("  {} #{} {} ({})", "–".yellow(), i, crumb.operation, reason)
            }
        }
    }

    println!();
    println!("✨ {} Wrote {}", "Done".green().bold(), output.display());
    Ok(())
}

/// Load `document`, dispatch every mutation in `mutations` and save the
/// result to `output`. Nothing is written when a mutation fails.
pub(crate) fn apply_file(
    fs: &mut dyn FileSystem,
    document: &Path,
    mutations: &Path,
    output: &Path,
    catalog: SchemaCatalog,
    config: &Config,
) -> Result<BreadcrumbLog> {
    let (doc, _) = load_document(fs, document, &catalog)?;
    let value = fs
        .read_json(mutations)
        .with_context(|| format!("Cannot read {}", mutations.display()))?;
    let list: Vec<Mutation> = serde_json::from_value(value)
        .with_context(|| format!("Invalid mutation list in {}", mutations.display()))?;

    let log = BreadcrumbLog::new();
    let mut dispatcher = Dispatcher::new(doc, catalog)
        .with_sink(TracingSink)
        .with_sink(log.clone());

    for (i, mutation) in list.into_iter().enumerate() {
        dispatcher
            .dispatch(mutation)
            .with_context(|| format!("Mutation #{i} failed"))?;
    }

    dispatcher.save(fs, output, config.pretty)?;
    Ok(log)
}
