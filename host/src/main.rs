//! `x12` command-line host
//!
//! Parses, validates and generates X12 documents using the codec and
//! validation libraries. Structured output goes to stdout as JSON; logs go
//! to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use x12_codec::{
    default_envelope, generate, parse, GenerateOptions, ParseOptions, Transaction, TransactionType,
};
use x12_host::{format_bytes, init_logging, read_document, render_report, HostConfig, DEFAULT_MAX_BYTES};

#[derive(Parser)]
#[command(name = "x12")]
#[command(about = "Parse, validate and generate HIPAA X12 transactions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Refuse input documents larger than this many bytes
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_BYTES)]
    max_bytes: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a document and print the transaction as JSON
    Parse {
        file: PathBuf,
        /// Fail on a malformed ISA or a wrong SE count
        #[arg(long)]
        strict: bool,
        /// Print single-line JSON
        #[arg(long)]
        compact: bool,
        /// Include the raw segments and the loop tree
        #[arg(long)]
        raw: bool,
    },
    /// Validate a document; exits with status 1 when it is invalid
    Validate {
        file: PathBuf,
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a default envelope as JSON
    Envelope {
        /// Transaction type tag: 837P, 837I, 835, 270, 271, 276, 277 or 278
        #[arg(long = "type")]
        transaction_type: TransactionType,
        #[arg(long)]
        sender: String,
        #[arg(long)]
        receiver: String,
        #[arg(long, default_value = "1")]
        control: String,
    },
    /// Generate X12 text from a transaction JSON file
    Generate {
        file: PathBuf,
        /// Put each segment on its own line
        #[arg(long)]
        line_breaks: bool,
    },
    /// Print size, segment and timing statistics for a document
    Stats { file: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = HostConfig {
        max_bytes: cli.max_bytes,
    };
    match run(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &HostConfig) -> Result<ExitCode> {
    match command {
        Commands::Parse {
            file,
            strict,
            compact,
            raw,
        } => {
            let text = read(&file, config)?;
            let options = if strict {
                ParseOptions::strict()
            } else {
                ParseOptions::default()
            };
            let mut transaction =
                parse(&text, &options).with_context(|| format!("failed to parse {}", file.display()))?;
            if !raw {
                transaction.raw_segments.clear();
                transaction.loops.clear();
            }
            print_json(&transaction, compact)?;
        }
        Commands::Validate { file, json } => {
            let text = read(&file, config)?;
            let result = x12_validation::validate(&text);
            if json {
                print_json(&result, false)?;
            } else {
                print!("{}", render_report(&result));
            }
            if !result.valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Envelope {
            transaction_type,
            sender,
            receiver,
            control,
        } => {
            let envelope = default_envelope(transaction_type, &sender, &receiver, &control);
            print_json(&envelope, false)?;
        }
        Commands::Generate { file, line_breaks } => {
            let json = read(&file, config)?;
            let transaction: Transaction = serde_json::from_str(&json)
                .with_context(|| format!("{} is not a transaction JSON document", file.display()))?;
            let options = GenerateOptions {
                line_breaks,
                ..Default::default()
            };
            let text = generate(&transaction, &options).context("failed to generate X12")?;
            if line_breaks {
                print!("{text}");
            } else {
                println!("{text}");
            }
        }
        Commands::Stats { file } => {
            let text = read(&file, config)?;
            let start = Instant::now();
            let transaction = parse(&text, &ParseOptions::default())
                .with_context(|| format!("failed to parse {}", file.display()))?;
            let duration = start.elapsed();

            println!("Statistics:");
            println!("  File size:         {}", format_bytes(text.len() as u64));
            println!("  Transaction type:  {}", transaction.transaction_type());
            println!("  Segments:          {}", transaction.raw_segments.len());
            println!("  Top-level loops:   {}", transaction.loops.len());
            println!("  Parse time:        {:.2}ms", duration.as_secs_f64() * 1000.0);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn read(file: &Path, config: &HostConfig) -> Result<String> {
    read_document(file, config).with_context(|| format!("failed to read {}", file.display()))
}

fn print_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{json}");
    Ok(())
}
