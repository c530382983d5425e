mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    apply, init, migrate, validate, ApplyArgs, InitArgs, MigrateArgs, ValidateArgs,
};

/// DesignKit CLI - migrate, validate and edit design-system documents
#[derive(Parser, Debug)]
#[command(name = "designkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new DesignKit project
    Init(InitArgs),

    /// Upgrade documents to the current schema
    Migrate(MigrateArgs),

    /// Migrate in memory and lint documents
    Validate(ValidateArgs),

    /// Apply a list of mutations to a document
    Apply(ApplyArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| {
            let cwd = cwd.display().to_string();
            match cli.command {
                Command::Init(args) => init(args, &cwd),
                Command::Migrate(args) => migrate(args, &cwd),
                Command::Validate(args) => validate(args, &cwd),
                Command::Apply(args) => apply(args, &cwd),
            }
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
