//! CLI adapter: one blend request as JSON on stdin (or a file), the
//! optimization result as JSON on stdout.
//!
//! Errors are emitted as a structured failure document on stdout with
//! a nonzero exit code, so callers can distinguish a transport/input
//! failure from a structurally-successful-but-non-converged result
//! (which has `success = false` but exit code 0).

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use blend_core::{optimize_blend_with, Config, Material, SolverSettings};

#[derive(Parser)]
#[command(name = "blendix", version, about = "Soil blend optimization")]
struct Args {
    /// Read the request from a file instead of stdin.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Pretty-print the result JSON.
    #[arg(long)]
    pretty: bool,

    /// Print solver stage progress to stderr.
    #[arg(short, long)]
    verbose: bool,
}

/// The request envelope shared by every adapter.
#[derive(Deserialize)]
struct Request {
    materials: Vec<Material>,
    config: Config,
}

/// Failure document for validation and transport errors.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Failure {
    success: bool,
    error_message: String,
    warnings: Vec<String>,
}

fn main() {
    let args = Args::parse();
    match run(&args) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            let failure = Failure {
                success: false,
                error_message: format!("{e:#}"),
                warnings: Vec::new(),
            };
            let body = serde_json::to_string(&failure)
                .unwrap_or_else(|_| String::from(r#"{"success":false}"#));
            println!("{body}");
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<String> {
    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };

    let request: Request =
        serde_json::from_str(&raw).context("invalid request JSON")?;

    let mut settings = SolverSettings::default();
    if args.verbose {
        settings = settings.with_verbose();
    }

    let result = optimize_blend_with(&request.materials, &request.config, &settings)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    Ok(json)
}
