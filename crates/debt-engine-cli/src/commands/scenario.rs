use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use debt_engine_core::ScenarioRequest;

use super::{evaluate_selection, DebtSelection};

/// Arguments for the current-path projection
#[derive(Args)]
pub struct CurrentArgs {
    #[command(flatten)]
    pub debts: DebtSelection,
}

/// Arguments for the extra-payment scenario
#[derive(Args)]
pub struct ExtraPaymentArgs {
    #[command(flatten)]
    pub debts: DebtSelection,

    /// Extra amount added to every required payment each month
    #[arg(long)]
    pub extra: Decimal,
}

/// Arguments for the target-payoff scenario
#[derive(Args)]
pub struct TargetPayoffArgs {
    #[command(flatten)]
    pub debts: DebtSelection,

    /// Months in which every selected debt must reach zero
    #[arg(long)]
    pub months: u32,
}

pub fn run_current(args: CurrentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    evaluate_selection(&args.debts, ScenarioRequest::Current)
}

pub fn run_extra_payment(args: ExtraPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    evaluate_selection(
        &args.debts,
        ScenarioRequest::ExtraPayment {
            extra_payment: args.extra,
        },
    )
}

pub fn run_target_payoff(args: TargetPayoffArgs) -> Result<Value, Box<dyn std::error::Error>> {
    evaluate_selection(
        &args.debts,
        ScenarioRequest::TargetPayoff {
            target_payoff_months: args.months,
        },
    )
}
