use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use codeflow::codeflow::{extract_file, Codeflow};
use codeflow::errors::Result;
use codeflow::output::{render, OutputFormat};
use codeflow::types::Method;

/// Flowchart extraction for annotated TypeScript step machines.
#[derive(Parser)]
#[command(
    name = "codeflow",
    about = "Flowchart extraction for annotated TypeScript step machines"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract codeflow methods from a single file
    Extract {
        /// Source file to read
        file: PathBuf,
        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "json")]
        format: OutputFormat,
        /// Also emit the normalized source the spans refer to
        #[arg(short = 's', long)]
        with_source: bool,
    },
    /// Scan a project for codeflow methods
    Scan {
        /// Project path (default: current directory)
        path: Option<String>,
        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "json")]
        format: OutputFormat,
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a default project configuration
    Init {
        /// Project path (default: current directory)
        path: Option<String>,
    },
}

/// Output of `extract --with-source`.
#[derive(Serialize)]
struct ExtractOutput<'a> {
    methods: &'a [Method],
    source: &'a str,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract {
            file,
            pretty,
            format,
            with_source,
        } => {
            let (methods, source) = extract_file(&file)?;
            let text = if with_source {
                render(
                    &ExtractOutput {
                        methods: &methods,
                        source: &source,
                    },
                    format,
                    pretty,
                )?
            } else {
                render(&methods, format, pretty)?
            };
            println!("{}", text);
        }
        Commands::Scan {
            path,
            pretty,
            format,
            output,
        } => {
            let project_path = resolve_path(path);
            let cf = Codeflow::open(&project_path)?;
            let report = cf.scan()?;
            let text = render(&report, format, pretty)?;
            match output {
                Some(out) => {
                    std::fs::write(&out, text)?;
                    eprintln!(
                        "Scanned {} files: {} with codeflow methods, {} errors in {}ms",
                        report.scanned,
                        report.files.len(),
                        report.errors.len(),
                        report.duration_ms
                    );
                }
                None => println!("{}", text),
            }
        }
        Commands::Init { path } => {
            let project_path = resolve_path(path);
            Codeflow::init(&project_path)?;
            println!("Initialized codeflow config at {}", project_path.display());
        }
    }
    Ok(())
}

/// Resolves an optional path argument to a `PathBuf`.
///
/// Defaults to the current working directory if no path is provided.
fn resolve_path(path: Option<String>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
