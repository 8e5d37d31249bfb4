use chrono::NaiveDate;
use debt_engine_core::normalize::{EvaluationRequest, RawDebt};
use debt_engine_core::{evaluate, DebtTypeFilter, EvaluationStatus, ScenarioRequest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

// ===========================================================================
// Fixtures
// ===========================================================================

fn raw_fixed(id: &str, principal: f64, apr_pct: f64, term: u32) -> RawDebt {
    RawDebt {
        debt_id: Some(id.into()),
        debt_type: Some("personal".into()),
        principal: Some(json!(principal)),
        apr: Some(json!(apr_pct)),
        term_months: Some(json!(term)),
        ..RawDebt::default()
    }
}

fn strategy_request(debts: Vec<RawDebt>, scenario: ScenarioRequest) -> EvaluationRequest {
    EvaluationRequest {
        customer_id: None,
        debts: Some(debts),
        debt_type_filter: DebtTypeFilter::All,
        scenario,
        as_of: NaiveDate::from_ymd_opt(2025, 6, 1),
    }
}

fn spread_portfolio() -> Vec<RawDebt> {
    vec![
        raw_fixed("small-low", 5000.0, 5.0, 60),
        raw_fixed("large-high", 20000.0, 15.0, 60),
    ]
}

// ===========================================================================
// Avalanche vs snowball
// ===========================================================================

#[test]
fn test_avalanche_total_interest_never_exceeds_snowball() {
    let avalanche = evaluate(
        &strategy_request(
            spread_portfolio(),
            ScenarioRequest::Avalanche {
                extra_payment: Some(dec!(200)),
            },
        ),
        None,
    );
    let snowball = evaluate(
        &strategy_request(
            spread_portfolio(),
            ScenarioRequest::Snowball {
                extra_payment: Some(dec!(200)),
            },
        ),
        None,
    );

    let a = &avalanche.result;
    let s = &snowball.result;
    assert_eq!(a.status, EvaluationStatus::Success);
    assert_eq!(s.status, EvaluationStatus::Success);

    // On this portfolio the two orders differ, so avalanche must strictly
    // save interest and finish no later.
    assert!(a.total_interest < s.total_interest);
    assert!(a.months_to_debt_free <= s.months_to_debt_free);

    // Avalanche retires the 15% debt first; snowball the $5k debt first.
    assert_eq!(a.payoff_sequence[0].debt_id.as_deref(), Some("large-high"));
    assert_eq!(s.payoff_sequence[0].debt_id.as_deref(), Some("small-low"));
}

#[test]
fn test_strategies_identical_when_highest_apr_is_smallest_balance() {
    let debts = vec![
        raw_fixed("hot-small", 3000.0, 22.0, 48),
        raw_fixed("cold-large", 15000.0, 6.0, 48),
    ];
    let avalanche = evaluate(
        &strategy_request(
            debts.clone(),
            ScenarioRequest::Avalanche {
                extra_payment: Some(dec!(150)),
            },
        ),
        None,
    );
    let snowball = evaluate(
        &strategy_request(
            debts,
            ScenarioRequest::Snowball {
                extra_payment: Some(dec!(150)),
            },
        ),
        None,
    );

    assert_eq!(
        avalanche.result.total_interest,
        snowball.result.total_interest
    );
    assert_eq!(
        avalanche.result.months_to_debt_free,
        snowball.result.months_to_debt_free
    );
    assert_eq!(
        avalanche.result.payoff_sequence,
        snowball.result.payoff_sequence
    );
}

// ===========================================================================
// Default extra pool
// ===========================================================================

#[test]
fn test_missing_extra_payment_gets_disclosed_default() {
    let output = evaluate(
        &strategy_request(
            spread_portfolio(),
            ScenarioRequest::Avalanche {
                extra_payment: None,
            },
        ),
        None,
    );
    let r = &output.result;

    let assumed = r.assumed_extra_payment.expect("default must be disclosed");
    assert!(assumed > Decimal::ZERO);
    // 15% of total minimums: ~15% of (94.36 + 475.80)
    assert!((assumed - dec!(85.52)).abs() < dec!(0.05), "assumed={assumed}");
    assert!(r
        .explanation_trace
        .iter()
        .any(|s| s.title == "Assumed Extra Payment"));
}

#[test]
fn test_default_pool_separates_the_strategies() {
    // With the default pool the two strategies must not be degenerately
    // identical on a portfolio where the orders differ.
    let avalanche = evaluate(
        &strategy_request(
            spread_portfolio(),
            ScenarioRequest::Avalanche {
                extra_payment: None,
            },
        ),
        None,
    );
    let snowball = evaluate(
        &strategy_request(
            spread_portfolio(),
            ScenarioRequest::Snowball {
                extra_payment: None,
            },
        ),
        None,
    );

    assert!(avalanche.result.total_interest < snowball.result.total_interest);
}

// ===========================================================================
// Payoff sequence and roll-over
// ===========================================================================

#[test]
fn test_payoff_sequence_is_ordered_and_complete() {
    let debts = vec![
        raw_fixed("a", 2000.0, 10.0, 24),
        raw_fixed("b", 8000.0, 18.0, 48),
        raw_fixed("c", 12000.0, 7.0, 60),
    ];
    let output = evaluate(
        &strategy_request(
            debts,
            ScenarioRequest::Snowball {
                extra_payment: Some(dec!(100)),
            },
        ),
        None,
    );
    let r = &output.result;

    assert_eq!(r.payoff_sequence.len(), 3);
    let months: Vec<u32> = r.payoff_sequence.iter().map(|e| e.month).collect();
    assert!(months.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(r.months_to_debt_free, Some(*months.last().unwrap()));
    // Roll-over is explained in the trace
    assert!(r
        .explanation_trace
        .iter()
        .any(|s| s.title == "Payment Roll-over"));
}

#[test]
fn test_snowball_targets_smallest_balance_first() {
    let debts = vec![
        raw_fixed("tiny", 1500.0, 4.0, 36),
        raw_fixed("mid", 6000.0, 9.0, 48),
        raw_fixed("big", 14000.0, 12.0, 60),
    ];
    let output = evaluate(
        &strategy_request(
            debts,
            ScenarioRequest::Snowball {
                extra_payment: Some(dec!(200)),
            },
        ),
        None,
    );
    let r = &output.result;

    assert_eq!(r.payoff_sequence[0].debt_id.as_deref(), Some("tiny"));
}
