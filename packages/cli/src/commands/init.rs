use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use designkit_migrations::CURRENT_SCHEMA_VERSION;
use designkit_model::{Document, SchemaCatalog};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Name of the starter document
    #[arg(short, long, default_value = "design.json")]
    pub document: String,

    /// Write the built-in catalog to catalog.json and point the config at it
    #[arg(long)]
    pub export_catalog: bool,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let root = PathBuf::from(cwd);
    let config_path = root.join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!(
        "{}",
        "📝 Initializing DesignKit project...".bright_blue().bold()
    );

    let mut config = Config::default();

    if args.export_catalog {
        let catalog_name = "catalog.json";
        fs::write(root.join(catalog_name), SchemaCatalog::builtin().to_json_pretty()?)?;
        config.catalog = Some(catalog_name.to_string());
        println!("  {} Created {}", "✓".green(), catalog_name);
    }

    let document_path = root.join(&args.document);
    if !document_path.exists() {
        let document = Document::empty(CURRENT_SCHEMA_VERSION);
        fs::write(&document_path, document.to_json_pretty()?)?;
        println!("  {} Created {}", "✓".green(), args.document);
    }

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Write your edits to a mutations file");
    println!("  2. Run: designkit apply {} edits.json", args.document);
    println!("  3. Run: designkit validate {}", args.document);

    Ok(())
}
