mod commands;
mod input;
mod output;
mod report;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::proforma::{RunArgs, SummarizeArgs};
use commands::sensitivity::SensitivityArgs;

/// Levered solar project finance proforma
#[derive(Parser)]
#[command(
    name = "solpro",
    version,
    about = "Levered solar project finance proforma",
    long_about = "Runs a levered cash flow model for a utility-scale solar project from \
                  stored assumptions and reports IRR, NPV, DSCR, and payback, plus \
                  one-variable sensitivity sweeps and Markdown investment summaries."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cash flow model for a single project
    Run(RunArgs),
    /// Run one-variable sensitivity sweeps against a base case
    Sensitivity(SensitivityArgs),
    /// Render a Markdown investment summary for a single project
    Summarize(SummarizeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Run(args) => commands::proforma::run_model(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Summarize(args) => {
            if let Err(e) = commands::proforma::run_summarize(args) {
                eprintln!("{}: {}", "error".red().bold(), e);
                process::exit(1);
            }
            return;
        }
        Commands::Version => {
            println!("solpro {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
