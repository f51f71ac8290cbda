use clap::Args;
use serde::Deserialize;
use serde_json::Value;
use std::fs;

use solar_proforma_core::assumptions::{FinancingAssumptions, ProjectAssumptions};
use solar_proforma_core::proforma;

use crate::input;
use crate::report;

/// A complete model request: project plus financing assumptions.
#[derive(Debug, Deserialize)]
pub struct ModelRequest {
    pub project: ProjectAssumptions,
    pub financing: FinancingAssumptions,
}

#[derive(Args)]
pub struct RunArgs {
    /// Input file (JSON or YAML). Reads JSON from stdin when omitted.
    #[arg(short, long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct SummarizeArgs {
    /// Input file (JSON or YAML). Reads JSON from stdin when omitted.
    #[arg(short, long)]
    pub input: Option<String>,

    /// Write the Markdown summary to this path instead of stdout
    #[arg(long)]
    pub out: Option<String>,
}

pub fn run_model(args: RunArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = load_request(args.input.as_deref())?;
    let output = proforma::run_proforma(&request.project, &request.financing)?;
    Ok(serde_json::to_value(&output)?)
}

pub fn run_summarize(args: SummarizeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let request = load_request(args.input.as_deref())?;
    let output = proforma::run_proforma(&request.project, &request.financing)?;
    let summary = report::render_summary(&request.project, &request.financing, &output);

    match args.out {
        Some(path) => {
            fs::write(&path, summary)
                .map_err(|e| format!("Failed to write '{}': {}", path, e))?;
            eprintln!("Wrote summary to {}", path);
        }
        None => print!("{}", summary),
    }
    Ok(())
}

pub fn load_request(path: Option<&str>) -> Result<ModelRequest, Box<dyn std::error::Error>> {
    match path {
        Some(p) => input::read_input(p),
        None => {
            let value = input::read_stdin()?
                .ok_or("No input provided. Pass --input <file> or pipe JSON via stdin.")?;
            Ok(serde_json::from_value(value)?)
        }
    }
}
