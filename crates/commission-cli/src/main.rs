mod commands;
mod config;
mod input;
mod output;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::commission::{ProcessArgs, SummaryArgs};
use commands::factors::{CoverageFactorArgs, FinancialFactorArgs};
use commands::policy::ValidatePolicyArgs;
use commands::schedule::PaymentDateArgs;

/// Deterministic sales commission calculations
#[derive(Parser)]
#[command(
    name = "comm",
    version,
    about = "Deterministic sales commission calculations",
    long_about = "A CLI for computing per-invoice sales commissions with decimal precision. \
                  Applies financial, portfolio and closing factors, flat client bonuses and \
                  the volume bonus, and schedules each payout on the 15th after the credit term."
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
    /// Compute one commission record per invoice
    Process(ProcessArgs),
    /// Period summary: factor impact breakdown and per-line totals
    Summary(SummaryArgs),
    /// Resolve commission payment dates for invoice dates
    PaymentDate(PaymentDateArgs),
    /// Resolve the financial factor for a period's sales
    FinancialFactor(FinancialFactorArgs),
    /// Resolve a portfolio or closing coverage factor
    CoverageFactor(CoverageFactorArgs),
    /// Check a policy document and list its warnings
    ValidatePolicy(ValidatePolicyArgs),
    /// Print the standard compensation policy
    DefaultPolicy,
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

    let config = match config::CliConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    if let Err(e) = telemetry::init(&config.telemetry) {
        eprintln!("{}: {}", "warning".yellow().bold(), e);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Process(args) => commands::commission::run_process(args, &config),
        Commands::Summary(args) => commands::commission::run_summary(args, &config),
        Commands::PaymentDate(args) => commands::schedule::run_payment_date(args),
        Commands::FinancialFactor(args) => commands::factors::run_financial_factor(args, &config),
        Commands::CoverageFactor(args) => commands::factors::run_coverage_factor(args, &config),
        Commands::ValidatePolicy(args) => commands::policy::run_validate_policy(args, &config),
        Commands::DefaultPolicy => commands::policy::run_default_policy(),
        Commands::Version => {
            println!("comm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
