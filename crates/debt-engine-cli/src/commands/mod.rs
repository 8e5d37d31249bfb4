pub mod refinancing;
pub mod scenario;
pub mod strategy;

use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use debt_engine_core::normalize::{EvaluationRequest, RawDebt};
use debt_engine_core::{evaluate, DebtTypeFilter, ScenarioRequest};

use crate::input;

/// Shared debt-selection flags: a JSON file or piped array of debts, or an
/// inline single debt described entirely by flags.
#[derive(Args)]
pub struct DebtSelection {
    /// Path to a JSON file containing an array of debts
    #[arg(long)]
    pub input: Option<String>,

    /// Debt type for an inline debt (student, auto, credit_card, personal, mortgage)
    #[arg(long)]
    pub debt_type: Option<String>,

    /// Outstanding balance for an inline debt
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// APR as a percentage for an inline debt (e.g. 6.5)
    #[arg(long)]
    pub apr: Option<Decimal>,

    /// Remaining term in months (required for fixed-term debt types)
    #[arg(long)]
    pub term_months: Option<u32>,

    /// Promotional APR percentage
    #[arg(long)]
    pub promo_apr: Option<Decimal>,

    /// Promotional window in months
    #[arg(long)]
    pub promo_months: Option<u32>,

    /// Restrict evaluation to one debt type, or "all"
    #[arg(long, default_value = "all")]
    pub filter: String,
}

impl DebtSelection {
    fn debts(&self) -> Result<Vec<RawDebt>, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.input {
            return input::file::read_json(path);
        }
        if let Some(data) = input::stdin::read_stdin()? {
            return Ok(serde_json::from_value(data)?);
        }

        let debt_type = self
            .debt_type
            .clone()
            .ok_or("--debt-type is required (or provide --input)")?;
        let principal = self
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let apr = self.apr.ok_or("--apr is required (or provide --input)")?;

        Ok(vec![RawDebt {
            debt_id: None,
            debt_type: Some(debt_type),
            principal: Some(Value::String(principal.to_string())),
            apr: Some(Value::String(apr.to_string())),
            term_months: self.term_months.map(Value::from),
            promo_apr: self.promo_apr.map(|r| Value::String(r.to_string())),
            promo_months: self.promo_months.map(Value::from),
            minimum_payment_floor: None,
            minimum_payment_pct: None,
        }])
    }

    fn filter(&self) -> Result<DebtTypeFilter, Box<dyn std::error::Error>> {
        serde_json::from_value(Value::String(self.filter.clone())).map_err(|_| {
            format!(
                "unknown filter '{}' (expected all, student, auto, credit_card, \
                 personal, or mortgage)",
                self.filter
            )
            .into()
        })
    }
}

/// Build the request, run the engine, return the full output envelope.
pub fn evaluate_selection(
    selection: &DebtSelection,
    scenario: ScenarioRequest,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = EvaluationRequest {
        customer_id: None,
        debts: Some(selection.debts()?),
        debt_type_filter: selection.filter()?,
        scenario,
        as_of: None,
    };
    let output = evaluate(&request, None);
    Ok(serde_json::to_value(output)?)
}
