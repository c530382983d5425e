use super::documents::find_documents;
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use designkit_common::{FileSystem, RealFileSystem};
use designkit_migrations::MigrationReport;
use designkit_model::{SchemaCatalog, SystemThemeComputer};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Document file or directory of documents
    pub input: PathBuf,

    /// Output directory (overrides outDir from the config)
    #[arg(short, long)]
    pub out_dir: Option<String>,

    /// Report what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

pub fn migrate(args: MigrateArgs, cwd: &str) -> Result<()> {
    let mut config = Config::load(cwd)?;
    if args.out_dir.is_some() {
        config.out_dir = args.out_dir;
    }
    let catalog = config.load_catalog(cwd)?;

    println!("🔧 {} DesignKit migrations", "Starting".green().bold());
    println!("   Input: {}", args.input.display());
    if args.dry_run {
        println!("   {}", "Dry run: nothing will be written".yellow());
    }
    println!();

    let files = find_documents(&args.input)?;
    let mut fs = RealFileSystem;
    let mut failed = 0;
    let mut diagnostics = 0;

    for file in &files {
        let output = config.output_path(cwd, file);
        match migrate_file(&mut fs, file, &output, &catalog, &config, args.dry_run) {
            Ok(report) => {
                diagnostics += report.diagnostics.len();
                print_report(file, &output, &report);
            }
            Err(e) => {
                failed += 1;
                println!("{} {}: {:#}", "✗".red(), file.display(), e);
            }
        }
    }

    println!();
    println!(
        "✨ {} Migrated {} of {} documents",
        if failed > 0 {
            "Done".red().bold()
        } else {
            "Done".green().bold()
        },
        files.len() - failed,
        files.len()
    );
    if diagnostics > 0 {
        println!("   {} {}", "Skipped entries:".yellow(), diagnostics);
    }

    if failed > 0 {
        return Err(anyhow::anyhow!("{} documents failed to migrate", failed));
    }
    Ok(())
}

pub(crate) fn migrate_file(
    fs: &mut dyn FileSystem,
    input: &Path,
    output: &Path,
    catalog: &SchemaCatalog,
    config: &Config,
    dry_run: bool,
) -> Result<MigrationReport> {
    let value = fs
        .read_json(input)
        .with_context(|| format!("Cannot read {}", input.display()))?;
    let (migrated, report) = designkit_migrations::migrate(value, catalog, &SystemThemeComputer)?;
    if !dry_run {
        fs.write_json(output, &migrated, config.pretty)?;
    }
    Ok(report)
}

fn print_report(input: &Path, output: &Path, report: &MigrationReport) {
    let target = if input == output {
        String::new()
    } else {
        format!(" → {}", output.display())
    };
    println!(
        "{} {} v{} → v{}{}",
        "✓".green(),
        input.display(),
        report.from_version,
        report.to_version,
        target
    );
    for name in &report.applied {
        println!("    {} {}", "applied".bright_blue(), name);
    }
    for diagnostic in &report.diagnostics {
        println!("    {} {}", "skipped".yellow(), diagnostic);
    }
}
