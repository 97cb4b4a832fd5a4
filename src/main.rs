//! Command line access to a JSON document.
//!
//! ```bash
//! pathkeeper people.json get 'persons/*/age'
//! pathkeeper people.json --config rules.toml valid
//! pathkeeper people.json set persons/4/name '"Neo Doe"'
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pathkeeper::{Document, DocumentConfig, Node, PathkeeperError, Result};

#[derive(Parser, Debug)]
#[command(name = "pathkeeper")]
#[command(about = "Read, write and validate JSON documents by path", long_about = None)]
struct Cli {
    /// JSON document to open
    document: PathBuf,

    /// Configuration file (toml, json or yaml) with patterns, rules and filters
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the filtered value at PATH
    Get { path: String },
    /// Write a JSON value at PATH and print the updated tree
    Set { path: String, value: String },
    /// Print whether PATH resolves
    Exists { path: String },
    /// Print the validity of PATH, or of the whole document with its failures
    Valid { path: Option<String> },
    /// Print the whole tree
    Tree,
}

fn run(cli: Cli) -> Result<Value> {
    let config = match &cli.config {
        Some(path) => DocumentConfig::load(path)?,
        None => DocumentConfig::new(),
    };
    let json = std::fs::read_to_string(&cli.document)?;
    let mut doc = Document::from_json(&json, config)?;
    debug!(document = %cli.document.display(), command = ?cli.command, "running");

    match cli.command {
        Commands::Get { path } => Ok(match doc.get(&path)? {
            Some(resolved) => Value::from(&resolved.into_node()),
            None => Value::Null,
        }),
        Commands::Set { path, value } => {
            let value: Value = serde_json::from_str(&value)?;
            doc.set(&path, Node::from(value))?;
            Ok(Value::from(doc.root()))
        }
        Commands::Exists { path } => Ok(json!(doc.exists(&path)?)),
        Commands::Valid { path: None } => Ok(json!({
            "valid": doc.is_valid("")?,
            "failures": doc.failures(),
        })),
        Commands::Valid { path: Some(path) } => Ok(json!(doc.is_valid(&path)?)),
        Commands::Tree => Ok(Value::from(doc.root())),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let printed = run(cli).and_then(|output| {
        serde_json::to_string_pretty(&output).map_err(PathkeeperError::from)
    });
    match printed {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
