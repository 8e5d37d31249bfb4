use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::amortization::{monthly_payment, monthly_rate};
use crate::types::{Debt, DebtType, Money, PayoffEvent, Rate};
use crate::DebtEngineResult;

/// Balances below half a cent are treated as retired.
const BALANCE_EPSILON: Decimal = dec!(0.005);

/// Payoff ordering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Highest effective APR first; ties broken by larger balance.
    Avalanche,
    /// Smallest balance first; ties broken by higher APR.
    Snowball,
}

impl StrategyKind {
    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::Avalanche => "Avalanche",
            StrategyKind::Snowball => "Snowball",
        }
    }

    pub fn ordering_rule(&self) -> &'static str {
        match self {
            StrategyKind::Avalanche => "order by descending effective APR, ties by larger balance",
            StrategyKind::Snowball => "order by ascending balance, ties by higher APR",
        }
    }
}

/// Per-debt outcome of a joint strategy simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyDebtOutcome {
    pub debt_id: Option<String>,
    pub debt_type: DebtType,
    pub principal: Money,
    pub apr: Rate,
    /// Required payment in month one, before any extra-pool allocation.
    pub initial_payment: Money,
    pub total_interest: Money,
    pub retired_month: Option<u32>,
}

/// Portfolio-level outcome of a joint strategy simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome {
    pub months: u32,
    pub total_interest: Money,
    /// Sum of month-one required payments across the portfolio.
    pub total_minimum_payments: Money,
    /// The shared extra pool applied in month one (before roll-over).
    pub initial_extra: Money,
    pub payoff_sequence: Vec<PayoffEvent>,
    pub per_debt: Vec<StrategyDebtOutcome>,
    /// Initial target order, for the explanation trace.
    pub initial_order: Vec<String>,
    pub rollover_events: Vec<String>,
    /// Horizon cap hit before the portfolio reached zero.
    pub indeterminate: bool,
}

/// Required payment for a debt at its starting balance: the scheduled
/// amortized payment for fixed-term debts, the minimum-payment rule for
/// revolving debts. Also the amount a retired debt rolls into the pool.
pub fn initial_payment_for(debt: &Debt) -> DebtEngineResult<Money> {
    match debt.term_months {
        Some(term) if !debt.is_revolving() => monthly_payment(debt.principal, debt.apr, term),
        _ => Ok(debt.minimum_payment.payment_for(debt.principal)),
    }
}

/// Sum of month-one required payments across a debt set. The base for the
/// disclosed default extra-payment pool.
pub fn initial_minimum_payments(debts: &[Debt]) -> DebtEngineResult<Money> {
    let mut total = Decimal::ZERO;
    for debt in debts {
        total += initial_payment_for(debt)?;
    }
    Ok(total)
}

struct DebtState<'a> {
    debt: &'a Debt,
    balance: Money,
    /// Fixed-term debts keep their scheduled payment; revolving debts
    /// re-derive the minimum from the current balance each month.
    scheduled_payment: Option<Money>,
    initial_payment: Money,
    interest_paid: Money,
    retired_month: Option<u32>,
}

impl DebtState<'_> {
    fn active(&self) -> bool {
        self.retired_month.is_none() && self.balance > BALANCE_EPSILON
    }

    fn required_payment(&self) -> Money {
        match self.scheduled_payment {
            Some(p) => p,
            None => self.debt.minimum_payment.payment_for(self.balance),
        }
    }

    fn label(&self) -> String {
        self.debt
            .debt_id
            .clone()
            .unwrap_or_else(|| self.debt.debt_type.to_string())
    }
}

/// Simulate the whole debt set jointly, month by month, with a single
/// shared extra-payment pool. Every debt receives its required payment;
/// the pool goes to the front of the strategy's current order, cascading
/// to the next debt if the target retires mid-month. A retired debt's
/// month-one payment joins the pool for all later months, so the pool
/// never shrinks.
pub fn simulate(
    debts: &[Debt],
    kind: StrategyKind,
    extra_payment: Money,
    horizon_months: u32,
) -> DebtEngineResult<StrategyOutcome> {
    let mut states: Vec<DebtState<'_>> = Vec::with_capacity(debts.len());
    for debt in debts {
        let scheduled_payment = match debt.term_months {
            Some(term) if !debt.is_revolving() => {
                Some(monthly_payment(debt.principal, debt.apr, term)?)
            }
            _ => None,
        };
        let initial_payment = initial_payment_for(debt)?;
        states.push(DebtState {
            debt,
            balance: debt.principal,
            scheduled_payment,
            initial_payment,
            interest_paid: Decimal::ZERO,
            retired_month: None,
        });
    }

    let total_minimum_payments: Money = states.iter().map(|s| s.initial_payment).sum();
    let initial_order = ordered_labels(&states, kind, 1);

    let mut pool = extra_payment;
    let mut payoff_sequence: Vec<PayoffEvent> = Vec::new();
    let mut rollover_events: Vec<String> = Vec::new();
    let mut months = 0u32;
    let mut indeterminate = false;

    for month in 1..=horizon_months {
        if states.iter().all(|s| !s.active()) {
            break;
        }
        months = month;

        // Interest accrual and required payments on every active debt.
        for state in states.iter_mut().filter(|s| s.active()) {
            let rate = monthly_rate(state.debt.effective_apr(month));
            let interest = state.balance * rate;
            let owed = state.balance + interest;
            let payment = state.required_payment().min(owed);
            state.balance = owed - payment;
            state.interest_paid += interest;
        }

        // Extra pool goes to the front of this month's order, cascading
        // when a target is cleared with pool left over.
        let mut remaining = pool;
        while remaining > Decimal::ZERO {
            let Some(target) = next_target(&mut states, kind, month) else {
                break;
            };
            let applied = remaining.min(target.balance);
            target.balance -= applied;
            remaining -= applied;
        }

        // Retirement bookkeeping and payment roll-over for later months.
        for state in states.iter_mut() {
            if state.retired_month.is_none() && state.balance <= BALANCE_EPSILON {
                state.retired_month = Some(month);
                state.balance = Decimal::ZERO;
                payoff_sequence.push(PayoffEvent {
                    debt_id: state.debt.debt_id.clone(),
                    debt_type: state.debt.debt_type,
                    month,
                });
                pool += state.initial_payment;
                rollover_events.push(format!(
                    "month {}: {} retired, pool grows by {}",
                    month,
                    state.label(),
                    crate::trace::fmt_money(state.initial_payment)
                ));
            }
        }

        if month == horizon_months && states.iter().any(|s| s.active()) {
            indeterminate = true;
        }
    }

    let total_interest: Money = states.iter().map(|s| s.interest_paid).sum();
    let per_debt = states
        .iter()
        .map(|s| StrategyDebtOutcome {
            debt_id: s.debt.debt_id.clone(),
            debt_type: s.debt.debt_type,
            principal: s.debt.principal,
            apr: s.debt.apr,
            initial_payment: s.initial_payment,
            total_interest: s.interest_paid,
            retired_month: s.retired_month,
        })
        .collect();

    Ok(StrategyOutcome {
        months,
        total_interest,
        total_minimum_payments,
        initial_extra: extra_payment,
        payoff_sequence,
        per_debt,
        initial_order,
        rollover_events,
        indeterminate,
    })
}

/// The active debt at the front of the strategy's order for this month.
/// Effective APRs are re-evaluated monthly so an expired promotional rate
/// moves a debt up the avalanche order.
fn next_target<'a, 'b>(
    states: &'a mut [DebtState<'b>],
    kind: StrategyKind,
    month: u32,
) -> Option<&'a mut DebtState<'b>> {
    states
        .iter_mut()
        .filter(|s| s.retired_month.is_none() && s.balance > Decimal::ZERO)
        .min_by(|a, b| compare(a, b, kind, month))
}

fn ordered_labels(states: &[DebtState<'_>], kind: StrategyKind, month: u32) -> Vec<String> {
    let mut indexed: Vec<&DebtState<'_>> = states.iter().collect();
    indexed.sort_by(|a, b| compare(a, b, kind, month));
    indexed.iter().map(|s| s.label()).collect()
}

fn compare(
    a: &DebtState<'_>,
    b: &DebtState<'_>,
    kind: StrategyKind,
    month: u32,
) -> std::cmp::Ordering {
    match kind {
        StrategyKind::Avalanche => b
            .debt
            .effective_apr(month)
            .cmp(&a.debt.effective_apr(month))
            .then(b.balance.cmp(&a.balance)),
        StrategyKind::Snowball => a
            .balance
            .cmp(&b.balance)
            .then(b.debt.effective_apr(month).cmp(&a.debt.effective_apr(month))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MinimumPaymentRule;
    use rust_decimal_macros::dec;

    fn fixed(id: &str, principal: Decimal, apr: Decimal, term: u32) -> Debt {
        Debt {
            debt_id: Some(id.into()),
            debt_type: DebtType::Personal,
            principal,
            apr,
            term_months: Some(term),
            promo_apr: None,
            promo_months: None,
            minimum_payment: MinimumPaymentRule::default(),
        }
    }

    #[test]
    fn test_avalanche_beats_snowball_on_interest() {
        // $5,000 @ 5% and $20,000 @ 15% with $200 extra: the strategies
        // pick different targets, avalanche must pay less interest.
        let debts = vec![
            fixed("small-low", dec!(5000), dec!(0.05), 60),
            fixed("large-high", dec!(20000), dec!(0.15), 60),
        ];

        let avalanche = simulate(&debts, StrategyKind::Avalanche, dec!(200), 600).unwrap();
        let snowball = simulate(&debts, StrategyKind::Snowball, dec!(200), 600).unwrap();

        assert!(avalanche.total_interest < snowball.total_interest);
        assert!(avalanche.months <= snowball.months);
        // Different first targets
        assert_eq!(avalanche.initial_order[0], "large-high");
        assert_eq!(snowball.initial_order[0], "small-low");
    }

    #[test]
    fn test_strategies_identical_when_orders_coincide() {
        // The highest-APR debt is also the smallest balance, so both
        // strategies target the same debt every month.
        let debts = vec![
            fixed("hot-small", dec!(3000), dec!(0.22), 48),
            fixed("cold-large", dec!(15000), dec!(0.06), 48),
        ];

        let avalanche = simulate(&debts, StrategyKind::Avalanche, dec!(150), 600).unwrap();
        let snowball = simulate(&debts, StrategyKind::Snowball, dec!(150), 600).unwrap();

        assert_eq!(avalanche.total_interest, snowball.total_interest);
        assert_eq!(avalanche.months, snowball.months);
        assert_eq!(avalanche.payoff_sequence, snowball.payoff_sequence);
    }

    #[test]
    fn test_rollover_grows_pool_and_orders_sequence() {
        let debts = vec![
            fixed("a", dec!(2000), dec!(0.10), 24),
            fixed("b", dec!(8000), dec!(0.18), 48),
            fixed("c", dec!(12000), dec!(0.07), 60),
        ];
        let outcome = simulate(&debts, StrategyKind::Avalanche, dec!(100), 600).unwrap();

        // Every debt retires, in non-decreasing months
        assert_eq!(outcome.payoff_sequence.len(), 3);
        let months: Vec<u32> = outcome.payoff_sequence.iter().map(|e| e.month).collect();
        assert!(months.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(outcome.rollover_events.len(), 3);
        assert!(!outcome.indeterminate);
        assert_eq!(outcome.months, *months.last().unwrap());
    }

    #[test]
    fn test_extra_pool_shortens_portfolio_payoff() {
        let debts = vec![
            fixed("a", dec!(6000), dec!(0.12), 60),
            fixed("b", dec!(9000), dec!(0.09), 60),
        ];
        let without = simulate(&debts, StrategyKind::Avalanche, Decimal::ZERO, 600).unwrap();
        let with = simulate(&debts, StrategyKind::Avalanche, dec!(250), 600).unwrap();

        assert!(with.months < without.months);
        assert!(with.total_interest < without.total_interest);
    }

    #[test]
    fn test_horizon_cap_marks_indeterminate() {
        let mut card = fixed("card", dec!(10000), dec!(0.29), 1);
        card.debt_type = DebtType::CreditCard;
        card.term_months = None;
        card.minimum_payment = MinimumPaymentRule {
            floor: dec!(10),
            balance_pct: dec!(0.001),
        };
        // Minimum can never outrun 29% APR interest and there is no extra.
        let outcome = simulate(&[card], StrategyKind::Avalanche, Decimal::ZERO, 120).unwrap();

        assert!(outcome.indeterminate);
        assert_eq!(outcome.months, 120);
        assert!(outcome.payoff_sequence.is_empty());
    }
}
