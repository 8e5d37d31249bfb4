use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::DebtEngineError;
use crate::types::{Money, Rate};
use crate::DebtEngineResult;

/// Months per year as a Decimal, used for APR-to-monthly conversion.
const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Balances below half a cent are treated as retired. Keeps iterative
/// payoff counts aligned with the closed-form term despite Decimal residue.
const BALANCE_EPSILON: Decimal = dec!(0.005);

/// Monthly periodic rate from a decimal APR.
pub fn monthly_rate(apr: Rate) -> Rate {
    apr / MONTHS_PER_YEAR
}

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
pub fn compound(rate: Decimal, n: u32) -> Decimal {
    let mut result = Decimal::ONE;
    let factor = Decimal::ONE + rate;
    for _ in 0..n {
        result *= factor;
    }
    result
}

/// One month of an amortization schedule. Values are unrounded; rounding
/// happens only when results are surfaced.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulePeriod {
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub balance: Money,
}

/// Outcome of paying a balance down with a fixed monthly payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoffOutcome {
    pub months: u32,
    pub total_interest: Money,
    pub total_paid: Money,
    /// Payment never exceeded accrued interest; balance cannot decrease.
    pub non_amortizing: bool,
    /// The horizon cap was hit before the balance reached zero.
    pub indeterminate: bool,
}

/// Level payment for a fixed-term loan:
/// M = P · r(1+r)^n / ((1+r)^n − 1), degenerating to P/n when r = 0.
pub fn monthly_payment(principal: Money, apr: Rate, term_months: u32) -> DebtEngineResult<Money> {
    if term_months == 0 {
        return Err(DebtEngineError::InvalidInput {
            field: "term_months".into(),
            reason: "term must be at least 1 month".into(),
        });
    }
    if principal < Decimal::ZERO {
        return Err(DebtEngineError::InvalidInput {
            field: "principal".into(),
            reason: "principal must be non-negative".into(),
        });
    }

    let r = monthly_rate(apr);
    if r.is_zero() {
        return Ok(principal / Decimal::from(term_months));
    }

    let factor = compound(r, term_months);
    let denom = factor - Decimal::ONE;
    if denom.is_zero() {
        return Err(DebtEngineError::DivisionByZero {
            context: "amortization annuity factor".into(),
        });
    }
    Ok(principal * r * factor / denom)
}

/// Payment required to retire a balance within a target horizon. Same
/// closed form with n = target_months.
pub fn payment_for_target(
    principal: Money,
    apr: Rate,
    target_months: u32,
) -> DebtEngineResult<Money> {
    monthly_payment(principal, apr, target_months)
}

/// Full level-payment schedule with the interest/principal split per month.
/// The final payment is clipped to the remaining balance plus interest.
pub fn schedule(
    principal: Money,
    apr: Rate,
    term_months: u32,
) -> DebtEngineResult<Vec<SchedulePeriod>> {
    let payment = monthly_payment(principal, apr, term_months)?;
    let r = monthly_rate(apr);

    let mut periods = Vec::with_capacity(term_months as usize);
    let mut balance = principal;

    for month in 1..=term_months {
        let interest = balance * r;
        let owed = balance + interest;
        let actual_payment = if month == term_months || payment > owed {
            owed
        } else {
            payment
        };
        let principal_paid = actual_payment - interest;
        balance -= principal_paid;

        periods.push(SchedulePeriod {
            month,
            payment: actual_payment,
            interest,
            principal: principal_paid,
            balance,
        });

        if balance <= Decimal::ZERO {
            break;
        }
    }

    Ok(periods)
}

/// Amortize a balance with an arbitrary fixed payment, iterating because a
/// fixed extra payment has no closed-form payoff-month solution. Bounded by
/// `horizon_months`; never loops unbounded.
pub fn months_with_payment(
    principal: Money,
    apr: Rate,
    payment: Money,
    horizon_months: u32,
) -> DebtEngineResult<PayoffOutcome> {
    if payment <= Decimal::ZERO {
        return Err(DebtEngineError::InvalidInput {
            field: "payment".into(),
            reason: "payment must be positive".into(),
        });
    }

    let r = monthly_rate(apr);
    let mut balance = principal;
    let mut total_interest = Decimal::ZERO;
    let mut total_paid = Decimal::ZERO;

    for month in 1..=horizon_months {
        if balance <= BALANCE_EPSILON {
            return Ok(PayoffOutcome {
                months: month - 1,
                total_interest,
                total_paid,
                non_amortizing: false,
                indeterminate: false,
            });
        }

        let interest = balance * r;
        if payment <= interest {
            // Balance can never decrease at this payment. Terminal condition.
            return Ok(PayoffOutcome {
                months: month - 1,
                total_interest,
                total_paid,
                non_amortizing: true,
                indeterminate: false,
            });
        }

        let owed = balance + interest;
        let actual_payment = payment.min(owed);
        balance = owed - actual_payment;
        total_interest += interest;
        total_paid += actual_payment;

        if balance <= BALANCE_EPSILON {
            return Ok(PayoffOutcome {
                months: month,
                total_interest,
                total_paid,
                non_amortizing: false,
                indeterminate: false,
            });
        }
    }

    Ok(PayoffOutcome {
        months: horizon_months,
        total_interest,
        total_paid,
        non_amortizing: false,
        indeterminate: balance > BALANCE_EPSILON,
    })
}
