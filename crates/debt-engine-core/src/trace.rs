//! Explanation-trace construction. Every step restates numbers the
//! calculators already produced; nothing here recomputes a result, so the
//! trace can never drift from the authoritative output.

use rust_decimal_macros::dec;

use crate::types::{round_currency, BreakEven, Money, Rate, TraceStep};

/// Currency formatting for substituted values.
pub fn fmt_money(amount: Money) -> String {
    format!("${}", round_currency(amount))
}

/// Percent formatting for substituted values (stored rates are decimals).
pub fn fmt_rate(rate: Rate) -> String {
    format!("{}%", (rate * dec!(100)).round_dp(4).normalize())
}

fn step(title: &str, description: &str, formula: &str, substituted: String) -> TraceStep {
    TraceStep {
        title: title.to_string(),
        description: description.to_string(),
        formula: formula.to_string(),
        substituted,
    }
}

/// The level-payment amortization formula with the caller's numbers.
pub fn monthly_payment_step(
    principal: Money,
    apr: Rate,
    term_months: u32,
    payment: Money,
) -> TraceStep {
    step(
        "Monthly Payment Formula",
        "Level payment that retires the balance over the remaining term, \
         covering interest and principal each month.",
        "M = P · r(1+r)^n / ((1+r)^n − 1), r = APR/12",
        format!(
            "M = {} · ({}/12)·(...)^{} / ((...)^{} − 1) = {}",
            fmt_money(principal),
            fmt_rate(apr),
            term_months,
            term_months,
            fmt_money(payment)
        ),
    )
}

/// Zero-rate degenerate case of the payment formula.
pub fn zero_rate_payment_step(principal: Money, term_months: u32, payment: Money) -> TraceStep {
    step(
        "Monthly Payment Formula (0% APR)",
        "With no interest the payment is the balance split evenly over the term.",
        "M = P / n",
        format!(
            "M = {} / {} = {}",
            fmt_money(principal),
            term_months,
            fmt_money(payment)
        ),
    )
}

/// Minimum-payment rule for a revolving debt.
pub fn minimum_payment_step(
    balance: Money,
    floor: Money,
    pct: Rate,
    minimum: Money,
) -> TraceStep {
    step(
        "Minimum Payment Rule",
        "Revolving minimum is the greater of a fixed floor and a percentage \
         of the current balance.",
        "min_payment = max(floor, pct · balance)",
        format!(
            "min_payment = max({}, {} · {}) = {}",
            fmt_money(floor),
            fmt_rate(pct),
            fmt_money(balance),
            fmt_money(minimum)
        ),
    )
}

/// Extra payment stacked on a required payment.
pub fn extra_payment_step(base: Money, extra: Money, total: Money) -> TraceStep {
    step(
        "Extra Payment",
        "The extra amount is added on top of the required payment every month.",
        "payment = required + extra",
        format!(
            "payment = {} + {} = {}",
            fmt_money(base),
            fmt_money(extra),
            fmt_money(total)
        ),
    )
}

/// Payment re-solved for a target payoff horizon.
pub fn target_payment_step(
    principal: Money,
    apr: Rate,
    target_months: u32,
    payment: Money,
) -> TraceStep {
    step(
        "Target Payoff Payment",
        "The amortization formula re-solved with the target horizon as the term.",
        "M = P · r(1+r)^t / ((1+r)^t − 1), t = target months",
        format!(
            "M = {} at {} over {} months = {}",
            fmt_money(principal),
            fmt_rate(apr),
            target_months,
            fmt_money(payment)
        ),
    )
}

/// Projected payoff for one debt.
pub fn payoff_projection_step(months: u32, total_interest: Money) -> TraceStep {
    step(
        "Payoff Projection",
        "Month-by-month amortization of the balance at the stated payment.",
        "months to zero balance; total interest = Σ monthly interest",
        format!(
            "payoff in {} months, {} total interest",
            months,
            fmt_money(total_interest)
        ),
    )
}

/// Ordering rule for a payoff strategy, with the resolved order.
pub fn strategy_order_step(strategy: &str, rule: &str, order: &[String]) -> TraceStep {
    step(
        "Payoff Order",
        &format!("{strategy} pays minimums on every debt and directs the extra pool at one target debt."),
        rule,
        format!("order: {}", order.join(" → ")),
    )
}

/// Disclosed default extra-payment pool for a strategy comparison.
pub fn assumed_extra_step(fraction: Rate, total_minimums: Money, pool: Money) -> TraceStep {
    step(
        "Assumed Extra Payment",
        "No extra payment was supplied; a disclosed default fraction of total \
         minimum payments is applied so strategies are comparable.",
        "extra = fraction · Σ minimum payments",
        format!(
            "extra = {} · {} = {}",
            fmt_rate(fraction),
            fmt_money(total_minimums),
            fmt_money(pool)
        ),
    )
}

/// Payment roll-over as debts retire.
pub fn rollover_step(events: &[String]) -> TraceStep {
    step(
        "Payment Roll-over",
        "Each retired debt's former payment joins the extra pool for all \
         later months, so the pool only grows.",
        "pool(m+1) = pool(m) + retired debt's payment",
        events.join("; "),
    )
}

/// Credit-score band adjustment applied to a quoted rate.
pub fn rate_adjustment_step(quoted: Rate, score: u32, adjustment: Rate, adjusted: Rate) -> TraceStep {
    step(
        "Credit Score Rate Adjustment",
        "Deterministic band lookup on the supplied credit score.",
        "adjusted_rate = quoted_rate + band(score)",
        format!(
            "adjusted_rate = {} + {} (score {}) = {}",
            fmt_rate(quoted),
            fmt_rate(adjustment),
            score,
            fmt_rate(adjusted)
        ),
    )
}

/// Refinance break-even month against the stated fee.
pub fn break_even_step(
    old_payment: Money,
    new_payment: Money,
    fee: Money,
    break_even: BreakEven,
) -> TraceStep {
    let substituted = match break_even {
        BreakEven::Month(t) => format!(
            "({} − {}) · {} ≥ {} at month {}",
            fmt_money(old_payment),
            fmt_money(new_payment),
            t,
            fmt_money(fee),
            t
        ),
        BreakEven::Never => format!(
            "({} − {}) never accumulates to {} within the new term",
            fmt_money(old_payment),
            fmt_money(new_payment),
            fmt_money(fee)
        ),
    };
    step(
        "Break-even Month",
        "Smallest month where cumulative payment savings cover the refinancing fee.",
        "t = min t : (old_payment − new_payment) · t ≥ fee",
        substituted,
    )
}

/// Consolidated balance as the exact sum of constituent principals.
pub fn consolidation_balance_step(principals: &[Money], total: Money) -> TraceStep {
    let parts: Vec<String> = principals.iter().map(|p| fmt_money(*p)).collect();
    step(
        "Consolidated Balance",
        "The new loan's balance is the exact sum of the selected principals.",
        "B = Σ principal_i",
        format!("B = {} = {}", parts.join(" + "), fmt_money(total)),
    )
}

/// Monthly savings from a refinance or consolidation.
pub fn monthly_savings_step(old_total: Money, new_payment: Money, savings: Money) -> TraceStep {
    step(
        "Monthly Savings",
        "Current required payments compared against the new loan's payment.",
        "savings = Σ old payments − new payment",
        format!(
            "savings = {} − {} = {}",
            fmt_money(old_total),
            fmt_money(new_payment),
            fmt_money(savings)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fmt_rate_normalizes_trailing_zeros() {
        assert_eq!(fmt_rate(dec!(0.065)), "6.5%");
        assert_eq!(fmt_rate(dec!(0.24)), "24%");
        assert_eq!(fmt_rate(Decimal::ZERO), "0%");
    }

    #[test]
    fn test_monthly_payment_step_substitutes_computed_value() {
        let s = monthly_payment_step(dec!(20000), dec!(0.06), 60, dec!(386.6560));
        // The substituted line carries the authoritative payment, rounded
        // only for display.
        assert!(s.substituted.contains("$386.66"));
        assert!(s.formula.contains("(1+r)^n"));
    }

    #[test]
    fn test_break_even_never_renders() {
        let s = break_even_step(dec!(500), dec!(520), dec!(3000), BreakEven::Never);
        assert!(s.substituted.contains("never"));
    }
}
