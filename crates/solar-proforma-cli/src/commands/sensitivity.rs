use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use solar_proforma_core::assumptions::{FinancingAssumptions, ProjectAssumptions};
use solar_proforma_core::sensitivity::{self, Perturbation};

use crate::input;

/// A sensitivity request: base case plus the sweeps to run against it.
#[derive(Debug, Deserialize)]
pub struct SensitivityRequest {
    pub project: ProjectAssumptions,
    pub financing: FinancingAssumptions,
    pub perturbations: Vec<Perturbation>,
}

#[derive(Args)]
pub struct SensitivityArgs {
    /// Input file (JSON or YAML). Reads JSON from stdin when omitted.
    #[arg(short, long)]
    pub input: Option<String>,
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: SensitivityRequest = match args.input.as_deref() {
        Some(p) => input::read_input(p)?,
        None => {
            let value = input::read_stdin()?
                .ok_or("No input provided. Pass --input <file> or pipe JSON via stdin.")?;
            serde_json::from_value(value)?
        }
    };

    let output = sensitivity::run_sensitivity(
        &request.project,
        &request.financing,
        &request.perturbations,
    )?;
    Ok(serde_json::to_value(&output)?)
}
