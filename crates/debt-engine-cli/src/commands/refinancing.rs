use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use debt_engine_core::ScenarioRequest;

use super::{evaluate_selection, DebtSelection};

/// Arguments for single-debt refinancing
#[derive(Args)]
pub struct RefinanceArgs {
    #[command(flatten)]
    pub debts: DebtSelection,

    /// New APR as a percentage (e.g. 5.5)
    #[arg(long)]
    pub new_rate: Decimal,

    /// New term in months
    #[arg(long)]
    pub new_term_months: u32,

    /// Refinancing fee (closing costs, points)
    #[arg(long, default_value = "0")]
    pub fee: Decimal,

    /// Credit score for the deterministic rate-band adjustment
    #[arg(long)]
    pub credit_score: Option<u32>,
}

/// Arguments for multi-debt consolidation
#[derive(Args)]
pub struct ConsolidateArgs {
    #[command(flatten)]
    pub debts: DebtSelection,

    /// New APR as a percentage for the consolidation loan
    #[arg(long)]
    pub new_rate: Decimal,

    /// Term of the consolidation loan in months
    #[arg(long)]
    pub new_term_months: u32,

    /// Credit score for the deterministic rate-band adjustment
    #[arg(long)]
    pub credit_score: Option<u32>,
}

pub fn run_refinance(args: RefinanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    evaluate_selection(
        &args.debts,
        ScenarioRequest::Refinance {
            new_rate: args.new_rate,
            new_term_months: args.new_term_months,
            refinancing_fee: args.fee,
            credit_score: args.credit_score,
        },
    )
}

pub fn run_consolidate(args: ConsolidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    evaluate_selection(
        &args.debts,
        ScenarioRequest::Consolidate {
            new_rate: args.new_rate,
            new_term_months: args.new_term_months,
            credit_score: args.credit_score,
        },
    )
}
