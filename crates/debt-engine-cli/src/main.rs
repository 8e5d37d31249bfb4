mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::refinancing::{ConsolidateArgs, RefinanceArgs};
use commands::scenario::{CurrentArgs, ExtraPaymentArgs, TargetPayoffArgs};
use commands::strategy::StrategyArgs;

/// Debt payoff scenario evaluation with decimal precision
#[derive(Parser)]
#[command(
    name = "dpe",
    version,
    about = "Debt payoff scenario evaluation with decimal precision",
    long_about = "Evaluates debt payoff scenarios (current path, extra payments, \
                  target payoff dates, refinancing, consolidation, and \
                  avalanche/snowball strategies) over one debt or a portfolio, \
                  with an explanation trace for every result."
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
    /// Project each debt on its current payment path
    Current(CurrentArgs),
    /// Add a fixed extra amount to every required payment
    ExtraPayment(ExtraPaymentArgs),
    /// Solve the payment needed to be debt-free by a target month
    TargetPayoff(TargetPayoffArgs),
    /// Refinance a single debt at new terms, with break-even analysis
    Refinance(RefinanceArgs),
    /// Consolidate multiple debts into one new loan
    Consolidate(ConsolidateArgs),
    /// Highest-rate-first payoff strategy across the portfolio
    Avalanche(StrategyArgs),
    /// Smallest-balance-first payoff strategy across the portfolio
    Snowball(StrategyArgs),
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
        Commands::Current(args) => commands::scenario::run_current(args),
        Commands::ExtraPayment(args) => commands::scenario::run_extra_payment(args),
        Commands::TargetPayoff(args) => commands::scenario::run_target_payoff(args),
        Commands::Refinance(args) => commands::refinancing::run_refinance(args),
        Commands::Consolidate(args) => commands::refinancing::run_consolidate(args),
        Commands::Avalanche(args) => commands::strategy::run_avalanche(args),
        Commands::Snowball(args) => commands::strategy::run_snowball(args),
        Commands::Version => {
            println!("dpe {}", env!("CARGO_PKG_VERSION"));
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
