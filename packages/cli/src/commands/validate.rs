use super::documents::{find_documents, load_document};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use designkit_common::{FileSystem, RealFileSystem};
use designkit_linter::{lint_document, Diagnostic, DiagnosticLevel, LintOptions};
use designkit_migrations::MigrationReport;
use designkit_model::SchemaCatalog;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document file or directory of documents to validate
    pub input: PathBuf,

    /// Show all diagnostics including info level
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Fail when any warning is reported
    #[arg(long)]
    pub fail_on_warnings: bool,
}

/// Everything found in one document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileReport {
    pub file: PathBuf,
    pub migration: MigrationReport,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }
}

pub fn validate(args: ValidateArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let catalog = config.load_catalog(cwd)?;
    let fail_on_warnings = args.fail_on_warnings || config.fail_on_warnings;
    let json = args.format == "json";

    if !json {
        println!("🔍 {} DesignKit validation", "Starting".green().bold());
        println!("   Input: {}", args.input.display());
        println!();
    }

    let fs = RealFileSystem;
    let mut reports = Vec::new();
    for file in find_documents(&args.input)? {
        reports.push(validate_file(&fs, &file, &catalog)?);
    }

    let errors: usize = reports.iter().map(|r| r.count(DiagnosticLevel::Error)).sum();
    let warnings: usize = reports.iter().map(|r| r.count(DiagnosticLevel::Warning)).sum();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_file_report(report, args.verbose);
        }
        print_summary(reports.len(), errors, warnings);
    }

    if errors > 0 || (fail_on_warnings && warnings > 0) {
        return Err(anyhow::anyhow!(
            "Validation failed: {} errors, {} warnings",
            errors,
            warnings
        ));
    }
    Ok(())
}

pub(crate) fn validate_file(
    fs: &dyn FileSystem,
    file: &Path,
    catalog: &SchemaCatalog,
) -> Result<FileReport> {
    let (document, migration) = load_document(fs, file, catalog)?;
    let diagnostics = lint_document(&document, LintOptions::default());
    Ok(FileReport {
        file: file.to_path_buf(),
        migration,
        diagnostics,
    })
}

fn print_file_report(report: &FileReport, verbose: bool) {
    let shown: Vec<&Diagnostic> = report
        .diagnostics
        .iter()
        .filter(|d| verbose || d.level != DiagnosticLevel::Info)
        .collect();

    if shown.is_empty() && report.migration.diagnostics.is_empty() {
        if verbose {
            println!("{} {}", "✓".green(), report.file.display());
        }
        return;
    }

    println!("{}", report.file.display());
    for skipped in &report.migration.diagnostics {
        println!("  {}: {}", "skipped".yellow().bold(), skipped);
    }
    for diagnostic in shown {
        let level_str = match diagnostic.level {
            DiagnosticLevel::Error => "error".red().bold(),
            DiagnosticLevel::Warning => "warning".yellow().bold(),
            DiagnosticLevel::Info => "info".blue().bold(),
        };
        println!(
            "  {}: {} [{}] {}",
            level_str,
            diagnostic.message,
            diagnostic.rule.dimmed(),
            diagnostic.subject.bright_white()
        );
        if let Some(suggestion) = &diagnostic.suggestion {
            println!("    {} {}", "help:".cyan(), suggestion);
        }
    }
    println!();
}

fn print_summary(files: usize, errors: usize, warnings: usize) {
    println!(
        "✨ {} Validation complete!",
        if errors > 0 {
            "Done".red().bold()
        } else {
            "Done".green().bold()
        }
    );
    println!("   Files checked: {}", files);
    if errors > 0 {
        println!("   {} {}", "Errors:".red(), errors);
    }
    if warnings > 0 {
        println!("   {} {}", "Warnings:".yellow(), warnings);
    }
    if errors == 0 && warnings == 0 {
        println!("   {} No issues found!", "✓".green());
    }
}
