use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
/// The normalizer converts percent-style input at the boundary.
pub type Rate = Decimal;

/// Round to currency precision. Applied only when building presentation
/// fields, never mid-computation.
pub fn round_currency(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Liability category. Governs term semantics and minimum-payment policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtType {
    Student,
    Auto,
    CreditCard,
    Personal,
    Mortgage,
}

impl DebtType {
    /// Revolving debts have no fixed term; minimum payment is a function
    /// of current balance.
    pub fn is_revolving(&self) -> bool {
        matches!(self, DebtType::CreditCard)
    }
}

impl std::fmt::Display for DebtType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DebtType::Student => "student",
            DebtType::Auto => "auto",
            DebtType::CreditCard => "credit_card",
            DebtType::Personal => "personal",
            DebtType::Mortgage => "mortgage",
        };
        f.write_str(s)
    }
}

/// Which debts a scenario evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtTypeFilter {
    #[default]
    All,
    Student,
    Auto,
    CreditCard,
    Personal,
    Mortgage,
}

impl DebtTypeFilter {
    pub fn matches(&self, debt_type: DebtType) -> bool {
        match self {
            DebtTypeFilter::All => true,
            DebtTypeFilter::Student => debt_type == DebtType::Student,
            DebtTypeFilter::Auto => debt_type == DebtType::Auto,
            DebtTypeFilter::CreditCard => debt_type == DebtType::CreditCard,
            DebtTypeFilter::Personal => debt_type == DebtType::Personal,
            DebtTypeFilter::Mortgage => debt_type == DebtType::Mortgage,
        }
    }
}

/// Minimum payment for revolving debts: the greater of a fixed floor and a
/// percentage of the current balance, clipped to the balance itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimumPaymentRule {
    pub floor: Money,
    pub balance_pct: Rate,
}

impl Default for MinimumPaymentRule {
    fn default() -> Self {
        MinimumPaymentRule {
            floor: dec!(25),
            balance_pct: dec!(0.02),
        }
    }
}

impl MinimumPaymentRule {
    pub fn payment_for(&self, balance: Money) -> Money {
        if balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.floor.max(self.balance_pct * balance).min(balance)
    }
}

/// One liability in canonical form. Produced by the normalizer; immutable
/// for the lifetime of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_id: Option<String>,
    pub debt_type: DebtType,
    pub principal: Money,
    /// Nominal annual rate as a decimal (0.0699 = 6.99% APR).
    pub apr: Rate,
    /// Remaining term for fixed-term debts. None for revolving debts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_apr: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_months: Option<u32>,
    #[serde(default)]
    pub minimum_payment: MinimumPaymentRule,
}

impl Debt {
    pub fn is_revolving(&self) -> bool {
        self.debt_type.is_revolving()
    }

    /// Annual rate in effect during a given (1-based) simulation month,
    /// honouring any promotional window.
    pub fn effective_apr(&self, month: u32) -> Rate {
        match (self.promo_apr, self.promo_months) {
            (Some(promo), Some(window)) if month <= window => promo,
            _ => self.apr,
        }
    }
}

/// Engine-wide policy knobs. All product-policy constants live here so a
/// caller can override them per evaluation; nothing is hard-coded globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard cap on any month-by-month simulation.
    pub max_horizon_months: u32,
    /// Defaults for revolving debts that arrive without an explicit rule.
    pub minimum_payment: MinimumPaymentRule,
    /// Fraction of total minimum payments assumed as the extra-payment pool
    /// when an avalanche/snowball request supplies none. Disclosed in the
    /// result as `assumed_extra_payment`.
    pub default_extra_fraction: Rate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_horizon_months: 600,
            minimum_payment: MinimumPaymentRule::default(),
            default_extra_fraction: dec!(0.15),
        }
    }
}

/// Scenario variants with their required parameters enforced by the type
/// system rather than runtime Option-checking in the logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scenario_type", rename_all = "snake_case")]
pub enum ScenarioRequest {
    Current,
    ExtraPayment {
        extra_payment: Money,
    },
    TargetPayoff {
        target_payoff_months: u32,
    },
    Refinance {
        new_rate: Rate,
        new_term_months: u32,
        #[serde(default)]
        refinancing_fee: Money,
        #[serde(skip_serializing_if = "Option::is_none")]
        credit_score: Option<u32>,
    },
    Consolidate {
        new_rate: Rate,
        new_term_months: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        credit_score: Option<u32>,
    },
    Avalanche {
        #[serde(skip_serializing_if = "Option::is_none")]
        extra_payment: Option<Money>,
    },
    Snowball {
        #[serde(skip_serializing_if = "Option::is_none")]
        extra_payment: Option<Money>,
    },
}

impl ScenarioRequest {
    /// Wire name of the scenario, echoed into results.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioRequest::Current => "current",
            ScenarioRequest::ExtraPayment { .. } => "extra_payment",
            ScenarioRequest::TargetPayoff { .. } => "target_payoff",
            ScenarioRequest::Refinance { .. } => "refinance",
            ScenarioRequest::Consolidate { .. } => "consolidate",
            ScenarioRequest::Avalanche { .. } => "avalanche",
            ScenarioRequest::Snowball { .. } => "snowball",
        }
    }
}

/// Terminal status of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    #[default]
    Success,
    Error,
    Infeasible,
}

/// One labelled calculation step. Built exclusively from intermediates the
/// calculators already produced; never recomputed independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub title: String,
    pub description: String,
    pub formula: String,
    pub substituted: String,
}

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

/// All validation failures for one rejected debt in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtError {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_id: Option<String>,
    pub errors: Vec<FieldError>,
}

/// Per-debt outcome of a scenario. Monetary fields are rounded to currency
/// precision here, at the presentation boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_id: Option<String>,
    pub debt_type: DebtType,
    pub principal: Money,
    pub apr: Rate,
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub months_to_payoff: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoff_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub non_amortizing: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub payoff_indeterminate: bool,
}

/// One retirement event in a strategy simulation's payoff order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_id: Option<String>,
    pub debt_type: DebtType,
    pub month: u32,
}

/// Refinance break-even outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakEven {
    Month(u32),
    Never,
}

/// Flat result of one scenario evaluation. Scenario-specific fields are
/// top-level Options rather than nested per-scenario objects so no caller
/// has to re-invoke to disambiguate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationResult {
    pub status: EvaluationStatus,
    pub scenario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub debt_results: Vec<DebtResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_monthly_payment: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_interest: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months_to_debt_free: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_free_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payoff_sequence: Vec<PayoffEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assumed_extra_payment: Option<Money>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_monthly_payment: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_savings: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even: Option<BreakEven>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consolidated_balance: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends_repayment_term: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_total_interest: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_total_interest: Option<Money>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub infeasible_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected_debts: Vec<DebtError>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_debt_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub explanation_trace: Vec<TraceStep>,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_payment_rule_floor_vs_pct() {
        let rule = MinimumPaymentRule::default();
        // 2% of 5000 = 100 beats the $25 floor
        assert_eq!(rule.payment_for(dec!(5000)), dec!(100));
        // 2% of 500 = 10 loses to the floor
        assert_eq!(rule.payment_for(dec!(500)), dec!(25));
        // Clipped to balance when balance is below the floor
        assert_eq!(rule.payment_for(dec!(10)), dec!(10));
        assert_eq!(rule.payment_for(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_effective_apr_promo_window() {
        let debt = Debt {
            debt_id: None,
            debt_type: DebtType::CreditCard,
            principal: dec!(3000),
            apr: dec!(0.2399),
            term_months: None,
            promo_apr: Some(dec!(0.0)),
            promo_months: Some(12),
            minimum_payment: MinimumPaymentRule::default(),
        };
        assert_eq!(debt.effective_apr(1), dec!(0.0));
        assert_eq!(debt.effective_apr(12), dec!(0.0));
        assert_eq!(debt.effective_apr(13), dec!(0.2399));
    }

    #[test]
    fn test_scenario_request_tagged_deserialization() {
        let req: ScenarioRequest = serde_json::from_str(
            r#"{"scenario_type":"target_payoff","target_payoff_months":24}"#,
        )
        .unwrap();
        assert_eq!(
            req,
            ScenarioRequest::TargetPayoff {
                target_payoff_months: 24
            }
        );
        assert_eq!(req.name(), "target_payoff");
    }

    #[test]
    fn test_debt_type_filter_matches() {
        assert!(DebtTypeFilter::All.matches(DebtType::Mortgage));
        assert!(DebtTypeFilter::CreditCard.matches(DebtType::CreditCard));
        assert!(!DebtTypeFilter::Student.matches(DebtType::Auto));
    }
}
