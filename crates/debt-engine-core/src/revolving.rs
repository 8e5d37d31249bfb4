use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::amortization::monthly_rate;
use crate::types::{Debt, Money};

/// Balances below half a cent are treated as retired.
const BALANCE_EPSILON: Decimal = dec!(0.005);

/// Outcome of a month-by-month revolving-credit simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct RevolvingOutcome {
    pub months: u32,
    pub total_interest: Money,
    pub total_paid: Money,
    /// Required payment in the first simulated month. Used as the
    /// representative "monthly payment" for presentation.
    pub first_payment: Money,
    /// The required payment never exceeded accrued interest; the balance
    /// cannot decrease. Terminal, reported, never an unbounded loop.
    pub non_amortizing: bool,
    /// The horizon cap was reached with a positive balance.
    pub indeterminate: bool,
}

/// Simulate a revolving debt month by month. There is no fixed term: each
/// month interest accrues at the effective rate (promotional rate inside the
/// promo window, contract APR after), then the required payment is the
/// greater of the minimum-payment rule and `extra_payment` on top of it.
///
/// Terminates when the balance reaches zero (final payment clipped), when
/// the payment cannot cover interest (`non_amortizing`), or at
/// `horizon_months` (`indeterminate`).
pub fn simulate(debt: &Debt, extra_payment: Money, horizon_months: u32) -> RevolvingOutcome {
    let mut balance = debt.principal;
    let mut total_interest = Decimal::ZERO;
    let mut total_paid = Decimal::ZERO;
    let mut first_payment = Decimal::ZERO;

    if balance <= BALANCE_EPSILON {
        return RevolvingOutcome {
            months: 0,
            total_interest,
            total_paid,
            first_payment,
            non_amortizing: false,
            indeterminate: false,
        };
    }

    for month in 1..=horizon_months {
        let rate = monthly_rate(debt.effective_apr(month));
        let interest = balance * rate;
        let minimum = debt.minimum_payment.payment_for(balance);
        let required = minimum + extra_payment;

        if month == 1 {
            first_payment = required;
        }

        if required <= interest {
            return RevolvingOutcome {
                months: month - 1,
                total_interest,
                total_paid,
                first_payment,
                non_amortizing: true,
                indeterminate: false,
            };
        }

        let owed = balance + interest;
        let actual = required.min(owed);
        balance = owed - actual;
        total_interest += interest;
        total_paid += actual;

        if balance <= BALANCE_EPSILON {
            return RevolvingOutcome {
                months: month,
                total_interest,
                total_paid,
                first_payment,
                non_amortizing: false,
                indeterminate: false,
            };
        }
    }

    RevolvingOutcome {
        months: horizon_months,
        total_interest,
        total_paid,
        first_payment,
        non_amortizing: false,
        indeterminate: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DebtType, MinimumPaymentRule};
    use rust_decimal_macros::dec;

    fn card(principal: Decimal, apr: Decimal) -> Debt {
        Debt {
            debt_id: None,
            debt_type: DebtType::CreditCard,
            principal,
            apr,
            term_months: None,
            promo_apr: None,
            promo_months: None,
            minimum_payment: MinimumPaymentRule::default(),
        }
    }

    #[test]
    fn test_minimum_payments_eventually_clear_balance() {
        let debt = card(dec!(3000), dec!(0.1999));
        let outcome = simulate(&debt, Decimal::ZERO, 600);

        assert!(!outcome.non_amortizing);
        assert!(!outcome.indeterminate);
        assert!(outcome.months > 0);
        // Total paid covers principal plus every cent of interest
        assert!(
            (outcome.total_paid - (dec!(3000) + outcome.total_interest)).abs() < dec!(0.01)
        );
    }

    #[test]
    fn test_extra_payment_accelerates_payoff() {
        let debt = card(dec!(3000), dec!(0.1999));
        let base = simulate(&debt, Decimal::ZERO, 600);
        let faster = simulate(&debt, dec!(100), 600);

        assert!(faster.months < base.months);
        assert!(faster.total_interest < base.total_interest);
    }

    #[test]
    fn test_non_amortizing_fixed_floor() {
        // $5,000 at 24% accrues $100/month. A $50 floor with no percentage
        // component can never cover interest.
        let mut debt = card(dec!(5000), dec!(0.24));
        debt.minimum_payment = MinimumPaymentRule {
            floor: dec!(50),
            balance_pct: Decimal::ZERO,
        };
        let outcome = simulate(&debt, Decimal::ZERO, 600);

        assert!(outcome.non_amortizing);
        assert_eq!(outcome.months, 0);
        assert!(!outcome.indeterminate);
    }

    #[test]
    fn test_promo_rate_window_accrues_less_interest() {
        let mut promo = card(dec!(4000), dec!(0.2399));
        promo.promo_apr = Some(Decimal::ZERO);
        promo.promo_months = Some(12);

        let without = card(dec!(4000), dec!(0.2399));

        let a = simulate(&promo, dec!(150), 600);
        let b = simulate(&without, dec!(150), 600);

        assert!(a.total_interest < b.total_interest);
        assert!(a.months <= b.months);
    }

    #[test]
    fn test_zero_balance_is_immediate() {
        let debt = card(Decimal::ZERO, dec!(0.24));
        let outcome = simulate(&debt, Decimal::ZERO, 600);
        assert_eq!(outcome.months, 0);
        assert_eq!(outcome.total_interest, Decimal::ZERO);
    }
}
