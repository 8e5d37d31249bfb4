use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::amortization::{monthly_payment, months_with_payment};
use crate::error::DebtEngineError;
use crate::revolving;
use crate::types::{BreakEven, Debt, Money, Rate};
use crate::DebtEngineResult;

/// Deterministic credit-score rate adjustment, in decimal points added to
/// the quoted rate. Band lookup, not a model.
pub fn credit_score_adjustment(score: u32) -> Rate {
    match score {
        780.. => dec!(-0.0025),
        740..=779 => Decimal::ZERO,
        700..=739 => dec!(0.0010),
        660..=699 => dec!(0.0030),
        620..=659 => dec!(0.0075),
        580..=619 => dec!(0.0125),
        _ => dec!(0.0200),
    }
}

fn adjusted_rate(quoted: Rate, credit_score: Option<u32>) -> (Rate, Rate) {
    let adjustment = credit_score.map(credit_score_adjustment).unwrap_or_default();
    ((quoted + adjustment).max(Decimal::ZERO), adjustment)
}

/// A debt's path if nothing changes: required payment, months to zero, and
/// total interest. Fixed-term debts follow their schedule; revolving debts
/// follow minimum payments.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentPath {
    pub payment: Money,
    pub months: u32,
    pub total_interest: Money,
    pub indeterminate: bool,
}

pub fn current_path(debt: &Debt, horizon_months: u32) -> DebtEngineResult<CurrentPath> {
    if debt.is_revolving() {
        let outcome = revolving::simulate(debt, Decimal::ZERO, horizon_months);
        return Ok(CurrentPath {
            payment: outcome.first_payment,
            months: outcome.months,
            total_interest: outcome.total_interest,
            indeterminate: outcome.indeterminate || outcome.non_amortizing,
        });
    }

    let term = debt.term_months.ok_or_else(|| DebtEngineError::InvalidInput {
        field: "term_months".into(),
        reason: format!("{} debt is missing its remaining term", debt.debt_type),
    })?;
    let payment = monthly_payment(debt.principal, debt.apr, term)?;
    let outcome = months_with_payment(debt.principal, debt.apr, payment, horizon_months)?;
    Ok(CurrentPath {
        payment,
        months: outcome.months,
        total_interest: outcome.total_interest,
        indeterminate: outcome.indeterminate,
    })
}

/// Refinance analysis for a single debt.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinanceOutcome {
    pub old_payment: Money,
    pub new_payment: Money,
    pub monthly_savings: Money,
    pub quoted_rate: Rate,
    pub adjusted_rate: Rate,
    pub rate_adjustment: Rate,
    pub fee: Money,
    pub break_even: BreakEven,
    pub old_total_interest: Money,
    pub new_total_interest: Money,
    pub old_months: u32,
    pub new_term_months: u32,
    /// True when the new term outlasts the current finite payoff path. An
    /// unbounded current path (non-amortizing or past the horizon) counts
    /// as longer than any term, so this is never set for it.
    pub extends_repayment_term: bool,
    /// The current path never retires the balance; `old_months` is not a
    /// payoff month.
    pub old_path_indeterminate: bool,
}

/// Recompute the payment at the new terms and find the break-even month:
/// the smallest t with (old − new)·t ≥ fee, `Never` when the fee is not
/// recovered within the new term or there are no savings at all.
pub fn refinance(
    debt: &Debt,
    new_rate: Rate,
    new_term_months: u32,
    fee: Money,
    credit_score: Option<u32>,
    horizon_months: u32,
) -> DebtEngineResult<RefinanceOutcome> {
    if fee < Decimal::ZERO {
        return Err(DebtEngineError::InvalidInput {
            field: "refinancing_fee".into(),
            reason: "fee must be non-negative".into(),
        });
    }

    let (rate, rate_adjustment) = adjusted_rate(new_rate, credit_score);
    let old = current_path(debt, horizon_months)?;
    let new_payment = monthly_payment(debt.principal, rate, new_term_months)?;
    let new_outcome =
        months_with_payment(debt.principal, rate, new_payment, horizon_months)?;

    let monthly_savings = old.payment - new_payment;
    let break_even = break_even_month(monthly_savings, fee, new_term_months);

    Ok(RefinanceOutcome {
        old_payment: old.payment,
        new_payment,
        monthly_savings,
        quoted_rate: new_rate,
        adjusted_rate: rate,
        rate_adjustment,
        fee,
        break_even,
        old_total_interest: old.total_interest,
        new_total_interest: new_outcome.total_interest,
        old_months: old.months,
        new_term_months,
        extends_repayment_term: !old.indeterminate && new_term_months > old.months,
        old_path_indeterminate: old.indeterminate,
    })
}

fn break_even_month(monthly_savings: Money, fee: Money, new_term_months: u32) -> BreakEven {
    if fee <= Decimal::ZERO {
        return BreakEven::Month(0);
    }
    if monthly_savings <= Decimal::ZERO {
        return BreakEven::Never;
    }
    let months = (fee / monthly_savings).ceil();
    match months.to_u32() {
        Some(t) if t <= new_term_months => BreakEven::Month(t),
        _ => BreakEven::Never,
    }
}

/// Consolidation analysis for N debts rolled into one new loan.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidationOutcome {
    /// Exact sum of the selected principals. No drift.
    pub combined_balance: Money,
    pub new_payment: Money,
    pub old_total_payment: Money,
    pub monthly_savings: Money,
    pub quoted_rate: Rate,
    pub adjusted_rate: Rate,
    pub rate_adjustment: Rate,
    pub old_total_interest: Money,
    pub new_total_interest: Money,
    /// Longest finite current-path payoff among the constituent debts.
    pub old_max_months: u32,
    pub new_term_months: u32,
    /// True when the new term outlasts every current path. Surfaced as a
    /// structured warning: the payment drops but repayment stretches, and
    /// total interest can rise. Never set when any constituent path is
    /// unbounded, since the new term then shortens repayment.
    pub extends_repayment_term: bool,
    /// At least one constituent's current path never retires its balance.
    pub old_path_indeterminate: bool,
}

pub fn consolidate(
    debts: &[Debt],
    new_rate: Rate,
    new_term_months: u32,
    credit_score: Option<u32>,
    horizon_months: u32,
) -> DebtEngineResult<ConsolidationOutcome> {
    if debts.is_empty() {
        return Err(DebtEngineError::InvalidInput {
            field: "debts".into(),
            reason: "consolidation requires at least one debt".into(),
        });
    }

    let (rate, rate_adjustment) = adjusted_rate(new_rate, credit_score);

    let combined_balance: Money = debts.iter().map(|d| d.principal).sum();
    let mut old_total_payment = Decimal::ZERO;
    let mut old_total_interest = Decimal::ZERO;
    let mut old_max_months = 0u32;
    let mut old_path_indeterminate = false;
    for debt in debts {
        let path = current_path(debt, horizon_months)?;
        old_total_payment += path.payment;
        old_total_interest += path.total_interest;
        old_max_months = old_max_months.max(path.months);
        old_path_indeterminate |= path.indeterminate;
    }

    let new_payment = monthly_payment(combined_balance, rate, new_term_months)?;
    let new_outcome =
        months_with_payment(combined_balance, rate, new_payment, horizon_months)?;

    Ok(ConsolidationOutcome {
        combined_balance,
        new_payment,
        old_total_payment,
        monthly_savings: old_total_payment - new_payment,
        quoted_rate: new_rate,
        adjusted_rate: rate,
        rate_adjustment,
        old_total_interest,
        new_total_interest: new_outcome.total_interest,
        old_max_months,
        new_term_months,
        extends_repayment_term: !old_path_indeterminate && new_term_months > old_max_months,
        old_path_indeterminate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DebtType, MinimumPaymentRule};
    use rust_decimal_macros::dec;

    fn loan(principal: Decimal, apr: Decimal, term: u32) -> Debt {
        Debt {
            debt_id: None,
            debt_type: DebtType::Personal,
            principal,
            apr,
            term_months: Some(term),
            promo_apr: None,
            promo_months: None,
            minimum_payment: MinimumPaymentRule::default(),
        }
    }

    /// A card whose fixed $50 floor never covers 24% interest on $5,000.
    fn trap_card() -> Debt {
        Debt {
            debt_id: None,
            debt_type: DebtType::CreditCard,
            principal: dec!(5000),
            apr: dec!(0.24),
            term_months: None,
            promo_apr: None,
            promo_months: None,
            minimum_payment: MinimumPaymentRule {
                floor: dec!(50),
                balance_pct: Decimal::ZERO,
            },
        }
    }

    #[test]
    fn test_refinance_break_even_brackets_fee() {
        let debt = loan(dec!(200000), dec!(0.07), 360);
        let outcome =
            refinance(&debt, dec!(0.055), 360, dec!(4000), None, 600).unwrap();

        assert!(outcome.monthly_savings > Decimal::ZERO);
        let BreakEven::Month(t) = outcome.break_even else {
            panic!("expected a break-even month");
        };
        // cumulative savings at t-1 < fee <= cumulative savings at t
        let t_dec = Decimal::from(t);
        assert!(outcome.monthly_savings * (t_dec - Decimal::ONE) < dec!(4000));
        assert!(outcome.monthly_savings * t_dec >= dec!(4000));
    }

    #[test]
    fn test_refinance_never_recovers_fee() {
        // Rate barely moves: savings too small to cover a huge fee in term
        let debt = loan(dec!(10000), dec!(0.0700), 36);
        let outcome =
            refinance(&debt, dec!(0.0699), 36, dec!(50000), None, 600).unwrap();
        assert_eq!(outcome.break_even, BreakEven::Never);
    }

    #[test]
    fn test_refinance_no_savings_is_never() {
        let debt = loan(dec!(10000), dec!(0.05), 36);
        // Higher rate, same term: new payment exceeds old
        let outcome = refinance(&debt, dec!(0.09), 36, dec!(100), None, 600).unwrap();
        assert!(outcome.monthly_savings < Decimal::ZERO);
        assert_eq!(outcome.break_even, BreakEven::Never);
    }

    #[test]
    fn test_credit_score_bands_are_monotone() {
        let scores = [500u32, 590, 640, 680, 720, 760, 800];
        let adjustments: Vec<Rate> = scores
            .iter()
            .map(|s| credit_score_adjustment(*s))
            .collect();
        assert!(adjustments.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(credit_score_adjustment(760), Decimal::ZERO);
    }

    #[test]
    fn test_consolidation_balance_is_exact_sum() {
        let debts = vec![
            loan(dec!(5000.25), dec!(0.12), 36),
            loan(dec!(7499.75), dec!(0.09), 48),
            loan(dec!(1200.00), dec!(0.18), 24),
        ];
        let outcome = consolidate(&debts, dec!(0.08), 60, None, 600).unwrap();
        assert_eq!(outcome.combined_balance, dec!(13700.00));
    }

    #[test]
    fn test_consolidation_flags_term_extension() {
        let debts = vec![
            loan(dec!(4000), dec!(0.15), 24),
            loan(dec!(6000), dec!(0.12), 36),
        ];
        // 72-month consolidation outlasts both current paths
        let outcome = consolidate(&debts, dec!(0.10), 72, None, 600).unwrap();

        assert!(outcome.extends_repayment_term);
        assert!(outcome.monthly_savings > Decimal::ZERO);
        // The structured warning exists precisely because interest can rise
        assert!(outcome.new_total_interest > Decimal::ZERO);
    }

    #[test]
    fn test_refinance_of_unbounded_path_never_extends_term() {
        // The card's current path never ends, so any finite new term
        // shortens repayment and must not be flagged as an extension.
        let outcome = refinance(&trap_card(), dec!(0.10), 36, Decimal::ZERO, None, 600).unwrap();

        assert!(outcome.old_path_indeterminate);
        assert!(!outcome.extends_repayment_term);
        assert_eq!(outcome.old_months, 0);
    }

    #[test]
    fn test_consolidation_with_unbounded_constituent_not_flagged() {
        // The loan pays off in 24 months but the card never does; a
        // 36-month consolidation bounds repayment rather than stretching it.
        let debts = vec![trap_card(), loan(dec!(4000), dec!(0.12), 24)];
        let outcome = consolidate(&debts, dec!(0.10), 36, None, 600).unwrap();

        assert!(outcome.old_path_indeterminate);
        assert!(!outcome.extends_repayment_term);
        assert_eq!(outcome.old_max_months, 24);
    }

    #[test]
    fn test_consolidation_within_terms_not_flagged() {
        let debts = vec![
            loan(dec!(4000), dec!(0.15), 60),
            loan(dec!(6000), dec!(0.12), 60),
        ];
        let outcome = consolidate(&debts, dec!(0.08), 36, None, 600).unwrap();
        assert!(!outcome.extends_repayment_term);
    }
}
