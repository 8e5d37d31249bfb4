use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::DebtEngineError;
use crate::types::{
    Debt, DebtError, DebtType, DebtTypeFilter, EngineConfig, FieldError, MinimumPaymentRule,
    Money, Rate, ScenarioRequest,
};
use crate::DebtEngineResult;

/// Percent-to-decimal divisor. Rates arrive as percentages on the wire
/// (19.99 = 19.99% APR) and are decimals everywhere past this module.
const PERCENT: Decimal = Decimal::ONE_HUNDRED;

/// One debt as it arrives on the wire. Numeric fields are raw JSON values
/// so a malformed debt is rejected with per-field detail instead of failing
/// the whole request at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDebt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apr: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_months: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_apr: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_months: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_payment_floor: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_payment_pct: Option<Value>,
}

/// One scenario evaluation request. Exactly one of `customer_id` / `debts`
/// must be supplied; customer rows are resolved by the caller and passed
/// alongside the request (the engine never performs lookups).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debts: Option<Vec<RawDebt>>,
    #[serde(default)]
    pub debt_type_filter: DebtTypeFilter,
    #[serde(flatten)]
    pub scenario: ScenarioRequest,
    /// Anchor for payoff calendar dates. Defaults to today when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

/// Outcome of normalizing a batch: valid debts pass through, invalid debts
/// are rejected individually with field-level detail. All-or-nothing per
/// debt, never per batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub debts: Vec<Debt>,
    pub rejected: Vec<DebtError>,
}

/// Select the debt list for a request: the hypothetical `debts` payload, or
/// the externally-resolved rows accompanying a `customer_id`.
pub fn resolve_debts<'a>(
    request: &'a EvaluationRequest,
    customer_debts: Option<&'a [RawDebt]>,
) -> DebtEngineResult<&'a [RawDebt]> {
    match (&request.customer_id, &request.debts) {
        (Some(_), Some(_)) => Err(DebtEngineError::InvalidInput {
            field: "customer_id".into(),
            reason: "supply either customer_id or debts, not both".into(),
        }),
        (None, None) => Err(DebtEngineError::InvalidInput {
            field: "debts".into(),
            reason: "supply either customer_id or debts".into(),
        }),
        (None, Some(debts)) => Ok(debts.as_slice()),
        (Some(_), None) => customer_debts.ok_or_else(|| DebtEngineError::InvalidInput {
            field: "customer_id".into(),
            reason: "customer_id given but no resolved debt rows were supplied".into(),
        }),
    }
}

/// Validate and coerce a batch of raw debts into canonical form.
pub fn normalize_debts(raw: &[RawDebt], config: &EngineConfig) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for (index, entry) in raw.iter().enumerate() {
        match normalize_one(entry, config) {
            Ok(debt) => batch.debts.push(debt),
            Err(errors) => batch.rejected.push(DebtError {
                index,
                debt_id: entry.debt_id.clone(),
                errors,
            }),
        }
    }
    batch
}

/// Validate a single raw debt, collecting every field failure rather than
/// stopping at the first.
fn normalize_one(raw: &RawDebt, config: &EngineConfig) -> Result<Debt, Vec<FieldError>> {
    let mut errors: Vec<FieldError> = Vec::new();

    let debt_type = match raw.debt_type.as_deref() {
        None => {
            errors.push(field_error("debt_type", "required field is missing"));
            None
        }
        Some(s) => match parse_debt_type(s) {
            Some(dt) => Some(dt),
            None => {
                errors.push(field_error(
                    "debt_type",
                    &format!(
                        "unknown debt type '{s}' (expected student, auto, credit_card, \
                         personal, or mortgage)"
                    ),
                ));
                None
            }
        },
    };

    let principal = require_money(&raw.principal, "principal", &mut errors);
    if let Some(p) = principal {
        if p < Decimal::ZERO {
            errors.push(field_error("principal", "must be non-negative"));
        }
    }

    let apr_pct = require_money(&raw.apr, "apr", &mut errors);
    if let Some(a) = apr_pct {
        if a < Decimal::ZERO {
            errors.push(field_error("apr", "must be non-negative"));
        }
    }

    let term_months = optional_u32(&raw.term_months, "term_months", &mut errors);
    if let Some(dt) = debt_type {
        if !dt.is_revolving() {
            match term_months {
                None => errors.push(field_error(
                    "term_months",
                    &format!("required for {dt} debts"),
                )),
                Some(0) => errors.push(field_error("term_months", "must be at least 1")),
                Some(_) => {}
            }
        }
    }

    let promo_apr_pct = optional_money(&raw.promo_apr, "promo_apr", &mut errors);
    let promo_months = optional_u32(&raw.promo_months, "promo_months", &mut errors);
    match (promo_apr_pct, promo_months) {
        (Some(_), None) => errors.push(field_error(
            "promo_months",
            "required when promo_apr is set",
        )),
        (None, Some(_)) => errors.push(field_error(
            "promo_apr",
            "required when promo_months is set",
        )),
        (Some(rate), Some(months)) => {
            if rate < Decimal::ZERO {
                errors.push(field_error("promo_apr", "must be non-negative"));
            }
            if months == 0 {
                errors.push(field_error("promo_months", "must be at least 1"));
            }
        }
        (None, None) => {}
    }

    let floor = optional_money(&raw.minimum_payment_floor, "minimum_payment_floor", &mut errors);
    let pct = optional_money(&raw.minimum_payment_pct, "minimum_payment_pct", &mut errors);

    // A missing value always pushed an error, so Some is guaranteed when
    // errors is empty.
    let (Some(debt_type), Some(principal), Some(apr_pct)) = (debt_type, principal, apr_pct)
    else {
        return Err(errors);
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    let minimum_payment = MinimumPaymentRule {
        floor: floor.unwrap_or(config.minimum_payment.floor),
        balance_pct: pct.unwrap_or(config.minimum_payment.balance_pct),
    };

    Ok(Debt {
        debt_id: raw.debt_id.clone(),
        debt_type,
        principal,
        apr: apr_pct / PERCENT,
        term_months: if debt_type.is_revolving() {
            None
        } else {
            term_months
        },
        promo_apr: promo_apr_pct.map(|r| r / PERCENT),
        promo_months,
        minimum_payment,
    })
}

fn parse_debt_type(s: &str) -> Option<DebtType> {
    match s.trim().to_ascii_lowercase().as_str() {
        "student" => Some(DebtType::Student),
        "auto" => Some(DebtType::Auto),
        "credit_card" | "credit card" => Some(DebtType::CreditCard),
        "personal" => Some(DebtType::Personal),
        "mortgage" => Some(DebtType::Mortgage),
        _ => None,
    }
}

fn field_error(field: &str, reason: &str) -> FieldError {
    FieldError {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Coerce a JSON number or numeric-looking string into a Decimal.
fn coerce_decimal(value: &Value) -> Result<Decimal, String> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .map_err(|_| format!("'{n}' is not representable as a decimal")),
        Value::String(s) => {
            Decimal::from_str(s.trim()).map_err(|_| format!("'{s}' is not a valid number"))
        }
        other => Err(format!("expected a number, got {other}")),
    }
}

fn coerce_u32(value: &Value) -> Result<u32, String> {
    let d = coerce_decimal(value)?;
    if d.fract() != Decimal::ZERO || d < Decimal::ZERO {
        return Err(format!("'{d}' is not a non-negative whole number"));
    }
    d.to_u32().ok_or_else(|| format!("'{d}' is out of range"))
}

fn require_money(
    value: &Option<Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Money> {
    match value {
        None => {
            errors.push(field_error(field, "required field is missing"));
            None
        }
        Some(v) => match coerce_decimal(v) {
            Ok(d) => Some(d),
            Err(reason) => {
                errors.push(field_error(field, &reason));
                None
            }
        },
    }
}

fn optional_money(
    value: &Option<Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Rate> {
    match value {
        None => None,
        Some(v) => match coerce_decimal(v) {
            Ok(d) => Some(d),
            Err(reason) => {
                errors.push(field_error(field, &reason));
                None
            }
        },
    }
}

fn optional_u32(value: &Option<Value>, field: &str, errors: &mut Vec<FieldError>) -> Option<u32> {
    match value {
        None => None,
        Some(v) => match coerce_u32(v) {
            Ok(n) => Some(n),
            Err(reason) => {
                errors.push(field_error(field, &reason));
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn raw_auto() -> RawDebt {
        RawDebt {
            debt_id: Some("auto-1".into()),
            debt_type: Some("auto".into()),
            principal: Some(json!(20000)),
            apr: Some(json!(6.5)),
            term_months: Some(json!(60)),
            ..RawDebt::default()
        }
    }

    #[test]
    fn test_normalize_coerces_numeric_strings() {
        let mut raw = raw_auto();
        raw.principal = Some(json!("20000.50"));
        raw.apr = Some(json!(" 6.5 "));

        let batch = normalize_debts(&[raw], &EngineConfig::default());
        assert!(batch.rejected.is_empty());
        let debt = &batch.debts[0];
        assert_eq!(debt.principal, dec!(20000.50));
        // APR arrives as a percentage, stored as a decimal rate
        assert_eq!(debt.apr, dec!(0.065));
        assert_eq!(debt.term_months, Some(60));
    }

    #[test]
    fn test_normalize_collects_every_field_error() {
        let raw = RawDebt {
            debt_type: Some("boat".into()),
            principal: Some(json!("not-a-number")),
            ..RawDebt::default()
        };
        let batch = normalize_debts(&[raw], &EngineConfig::default());

        assert!(batch.debts.is_empty());
        let rejected = &batch.rejected[0];
        let fields: Vec<&str> = rejected.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"debt_type"));
        assert!(fields.contains(&"principal"));
        assert!(fields.contains(&"apr"));
    }

    #[test]
    fn test_normalize_mixed_batch_rejects_only_invalid() {
        let good = raw_auto();
        let bad = RawDebt {
            debt_id: Some("card-x".into()),
            debt_type: Some("credit_card".into()),
            principal: Some(json!(-100)),
            apr: Some(json!(24)),
            ..RawDebt::default()
        };
        let batch = normalize_debts(&[good, bad], &EngineConfig::default());

        assert_eq!(batch.debts.len(), 1);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].index, 1);
        assert_eq!(batch.rejected[0].debt_id.as_deref(), Some("card-x"));
    }

    #[test]
    fn test_term_required_for_fixed_not_revolving() {
        let fixed = RawDebt {
            debt_type: Some("personal".into()),
            principal: Some(json!(5000)),
            apr: Some(json!(11.99)),
            ..RawDebt::default()
        };
        let card = RawDebt {
            debt_type: Some("credit_card".into()),
            principal: Some(json!(5000)),
            apr: Some(json!(24)),
            ..RawDebt::default()
        };
        let batch = normalize_debts(&[fixed, card], &EngineConfig::default());

        assert_eq!(batch.debts.len(), 1);
        assert!(batch.debts[0].is_revolving());
        assert_eq!(batch.rejected[0].errors[0].field, "term_months");
    }

    #[test]
    fn test_promo_fields_must_be_paired() {
        let raw = RawDebt {
            debt_type: Some("credit_card".into()),
            principal: Some(json!(3000)),
            apr: Some(json!(22.99)),
            promo_apr: Some(json!(0)),
            ..RawDebt::default()
        };
        let batch = normalize_debts(&[raw], &EngineConfig::default());
        assert_eq!(batch.rejected[0].errors[0].field, "promo_months");
    }

    #[test]
    fn test_resolve_debts_exactly_one_source() {
        let scenario = ScenarioRequest::Current;
        let both = EvaluationRequest {
            customer_id: Some("c-1".into()),
            debts: Some(vec![raw_auto()]),
            debt_type_filter: DebtTypeFilter::All,
            scenario: scenario.clone(),
            as_of: None,
        };
        assert!(resolve_debts(&both, None).is_err());

        let neither = EvaluationRequest {
            customer_id: None,
            debts: None,
            debt_type_filter: DebtTypeFilter::All,
            scenario: scenario.clone(),
            as_of: None,
        };
        assert!(resolve_debts(&neither, None).is_err());

        let customer = EvaluationRequest {
            customer_id: Some("c-1".into()),
            debts: None,
            debt_type_filter: DebtTypeFilter::All,
            scenario,
            as_of: None,
        };
        assert!(resolve_debts(&customer, None).is_err());
        let rows = vec![raw_auto()];
        assert!(resolve_debts(&customer, Some(&rows)).is_ok());
    }
}
