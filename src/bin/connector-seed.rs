//! Connector Seed CLI
//!
//! Command-line interface for generating connector definitions and task schemas.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use connector_seed::{
    generate_definitions, render_tasks, DefinitionsOptions, Layout, TasksOptions,
    DEFAULT_DEFINITIONS_OUTPUT, DEFAULT_REGISTRY_URL, DEFAULT_TASKS_INPUT, DEFAULT_TASKS_OUTPUT,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "connector-seed")]
#[command(about = "Generate connector definitions and task schemas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the registry and write reshaped destination definitions
    Definitions {
        /// Registry source: file path or URL (http:// or https://)
        #[arg(long, default_value = DEFAULT_REGISTRY_URL)]
        registry: String,

        /// Output file, overwritten on success
        #[arg(long, default_value = DEFAULT_DEFINITIONS_OUTPUT)]
        output: PathBuf,

        /// Write a single definition whose spec is a oneOf over all destinations
        #[arg(long)]
        envelope: bool,
    },

    /// Dereference every $ref in a task schema
    Tasks {
        /// Task schema; relative refs resolve against its directory
        #[arg(long, default_value = DEFAULT_TASKS_INPUT)]
        input: PathBuf,

        /// Output file, overwritten on success
        #[arg(long, default_value = DEFAULT_TASKS_OUTPUT)]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Definitions {
            registry,
            output,
            envelope,
        } => {
            let layout = if envelope {
                Layout::Envelope
            } else {
                Layout::PerConnector
            };
            let options = DefinitionsOptions::new()
                .registry(registry)
                .output(output)
                .layout(layout);
            generate_definitions(&options).map(|_| ())
        }

        Commands::Tasks { input, output } => render_tasks(&TasksOptions::new(input, output)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
