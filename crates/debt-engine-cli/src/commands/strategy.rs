use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use debt_engine_core::ScenarioRequest;

use super::{evaluate_selection, DebtSelection};

/// Arguments shared by the avalanche and snowball strategies
#[derive(Args)]
pub struct StrategyArgs {
    #[command(flatten)]
    pub debts: DebtSelection,

    /// Monthly extra-payment pool. Defaults to a disclosed fraction of
    /// total minimum payments when omitted.
    #[arg(long)]
    pub extra: Option<Decimal>,
}

pub fn run_avalanche(args: StrategyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    evaluate_selection(
        &args.debts,
        ScenarioRequest::Avalanche {
            extra_payment: args.extra,
        },
    )
}

pub fn run_snowball(args: StrategyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    evaluate_selection(
        &args.debts,
        ScenarioRequest::Snowball {
            extra_payment: args.extra,
        },
    )
}
