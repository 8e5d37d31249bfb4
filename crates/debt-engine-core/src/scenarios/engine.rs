//! Scenario dispatch and aggregation. `evaluate` is the engine's only
//! entry point: explicit inputs in, a flat structured result out, nothing
//! thrown past the boundary and no shared state between calls.

use chrono::{Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::time::Instant;

use crate::amortization::{monthly_payment, months_with_payment, payment_for_target};
use crate::error::DebtEngineError;
use crate::normalize::{normalize_debts, resolve_debts, EvaluationRequest, RawDebt};
use crate::revolving;
use crate::scenarios::refinance;
use crate::scenarios::strategy::{self, StrategyKind};
use crate::trace;
use crate::types::{
    round_currency, with_metadata, ComputationOutput, Debt, DebtResult, EngineConfig,
    EvaluationStatus, FieldError, Money, Rate, ScenarioRequest, SimulationResult, TraceStep,
};
use crate::DebtEngineResult;

/// Evaluate one scenario request with default engine policy.
pub fn evaluate(
    request: &EvaluationRequest,
    customer_debts: Option<&[RawDebt]>,
) -> ComputationOutput<SimulationResult> {
    evaluate_with_config(request, customer_debts, &EngineConfig::default())
}

/// Evaluate one scenario request. Infallible at this boundary: validation
/// failures and infeasible scenarios come back as structured result fields.
pub fn evaluate_with_config(
    request: &EvaluationRequest,
    customer_debts: Option<&[RawDebt]>,
    config: &EngineConfig,
) -> ComputationOutput<SimulationResult> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let scenario_name = request.scenario.name();
    let as_of = request.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let mut result = SimulationResult {
        scenario: scenario_name.to_string(),
        customer_id: request.customer_id.clone(),
        ..SimulationResult::default()
    };

    match run(request, customer_debts, config, as_of, &mut result, &mut warnings) {
        Ok(()) => {}
        Err(DebtEngineError::InvalidInput { field, reason }) => {
            result.status = EvaluationStatus::Error;
            warnings.push(format!("validation failed: {field}: {reason}"));
            result.rejected_debts.push(crate::types::DebtError {
                index: 0,
                debt_id: None,
                errors: vec![FieldError { field, reason }],
            });
        }
        Err(DebtEngineError::InfeasibleScenario(reason)) => {
            // Dedicated infeasibility result, never a partial approximation.
            result.status = EvaluationStatus::Infeasible;
            result.infeasible_reason = Some(reason);
            result.debt_results.clear();
            result.explanation_trace.clear();
        }
        Err(other) => {
            // Conditions the normalizer should have made impossible.
            result.status = EvaluationStatus::Error;
            warnings.push(format!("internal fault: {other}"));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Debt Payoff Scenario Evaluation (amortization + bounded month-by-month simulation)",
        &serde_json::json!({
            "scenario_type": scenario_name,
            "debt_type_filter": request.debt_type_filter,
            "as_of": as_of,
            "max_horizon_months": config.max_horizon_months,
            "default_extra_fraction": config.default_extra_fraction,
        }),
        warnings,
        elapsed,
        result,
    )
}

fn run(
    request: &EvaluationRequest,
    customer_debts: Option<&[RawDebt]>,
    config: &EngineConfig,
    as_of: NaiveDate,
    result: &mut SimulationResult,
    warnings: &mut Vec<String>,
) -> DebtEngineResult<()> {
    let raw = resolve_debts(request, customer_debts)?;
    let batch = normalize_debts(raw, config);

    for rejected in &batch.rejected {
        warnings.push(format!(
            "debt {} rejected: {} invalid field(s)",
            rejected
                .debt_id
                .clone()
                .unwrap_or_else(|| format!("#{}", rejected.index)),
            rejected.errors.len()
        ));
    }
    result.rejected_debts = batch.rejected.clone();

    if batch.debts.is_empty() {
        result.status = EvaluationStatus::Error;
        warnings.push("no valid debts to evaluate".into());
        return Ok(());
    }

    let selected: Vec<&Debt> = batch
        .debts
        .iter()
        .filter(|d| request.debt_type_filter.matches(d.debt_type))
        .collect();
    if selected.is_empty() {
        result.status = EvaluationStatus::Error;
        warnings.push(format!(
            "no debts match filter {:?}",
            request.debt_type_filter
        ));
        return Ok(());
    }

    match &request.scenario {
        ScenarioRequest::Current => {
            per_debt_scenario(&selected, Decimal::ZERO, config, as_of, result, warnings)
        }
        ScenarioRequest::ExtraPayment { extra_payment } => {
            if *extra_payment < Decimal::ZERO {
                return Err(DebtEngineError::InvalidInput {
                    field: "extra_payment".into(),
                    reason: "must be non-negative".into(),
                });
            }
            per_debt_scenario(&selected, *extra_payment, config, as_of, result, warnings)
        }
        ScenarioRequest::TargetPayoff {
            target_payoff_months,
        } => target_payoff_scenario(&selected, *target_payoff_months, config, as_of, result),
        ScenarioRequest::Refinance {
            new_rate,
            new_term_months,
            refinancing_fee,
            credit_score,
        } => refinance_scenario(
            &selected,
            *new_rate / Decimal::ONE_HUNDRED,
            *new_term_months,
            *refinancing_fee,
            *credit_score,
            config,
            as_of,
            result,
            warnings,
        ),
        ScenarioRequest::Consolidate {
            new_rate,
            new_term_months,
            credit_score,
        } => consolidate_scenario(
            &selected,
            *new_rate / Decimal::ONE_HUNDRED,
            *new_term_months,
            *credit_score,
            config,
            as_of,
            result,
            warnings,
        ),
        ScenarioRequest::Avalanche { extra_payment } => strategy_scenario(
            &selected,
            StrategyKind::Avalanche,
            *extra_payment,
            config,
            as_of,
            result,
            warnings,
        ),
        ScenarioRequest::Snowball { extra_payment } => strategy_scenario(
            &selected,
            StrategyKind::Snowball,
            *extra_payment,
            config,
            as_of,
            result,
            warnings,
        ),
    }
}

/// Calendar date `months` after the anchor. None when the payoff month is
/// unknown or the date arithmetic overflows.
fn payoff_date(as_of: NaiveDate, months: u32) -> Option<NaiveDate> {
    as_of.checked_add_months(Months::new(months))
}

/// Unrounded per-debt evaluation plus the intermediates the trace needs.
struct DebtEvaluation {
    base_payment: Money,
    total_payment: Money,
    months: u32,
    total_interest: Money,
    non_amortizing: bool,
    indeterminate: bool,
}

/// One debt paid at its required payment plus `extra`, to payoff or the
/// horizon cap. Fixed-term debts amortize iteratively (extra payments have
/// no closed-form payoff month); revolving debts run the simulator.
fn evaluate_debt(debt: &Debt, extra: Money, config: &EngineConfig) -> DebtEngineResult<DebtEvaluation> {
    if debt.is_revolving() {
        let outcome = revolving::simulate(debt, extra, config.max_horizon_months);
        return Ok(DebtEvaluation {
            base_payment: debt.minimum_payment.payment_for(debt.principal),
            total_payment: outcome.first_payment,
            months: outcome.months,
            total_interest: outcome.total_interest,
            non_amortizing: outcome.non_amortizing,
            indeterminate: outcome.indeterminate,
        });
    }

    let term = debt.term_months.ok_or_else(|| DebtEngineError::InvalidInput {
        field: "term_months".into(),
        reason: format!("{} debt is missing its remaining term", debt.debt_type),
    })?;
    let base_payment = monthly_payment(debt.principal, debt.apr, term)?;
    let total_payment = base_payment + extra;
    let outcome = months_with_payment(debt.principal, debt.apr, total_payment, config.max_horizon_months)?;
    Ok(DebtEvaluation {
        base_payment,
        total_payment,
        months: outcome.months,
        total_interest: outcome.total_interest,
        non_amortizing: outcome.non_amortizing,
        indeterminate: outcome.indeterminate,
    })
}

fn to_debt_result(debt: &Debt, eval: &DebtEvaluation, as_of: NaiveDate) -> DebtResult {
    let determinate = !eval.non_amortizing && !eval.indeterminate;
    DebtResult {
        debt_id: debt.debt_id.clone(),
        debt_type: debt.debt_type,
        principal: debt.principal,
        apr: debt.apr,
        monthly_payment: round_currency(eval.total_payment),
        total_interest: round_currency(eval.total_interest),
        months_to_payoff: eval.months,
        payoff_date: determinate
            .then(|| payoff_date(as_of, eval.months))
            .flatten(),
        non_amortizing: eval.non_amortizing,
        payoff_indeterminate: eval.indeterminate,
    }
}

/// The debt whose explanation trace is surfaced: the largest balance among
/// the debts actually selected by the filter, so the trace always belongs
/// to the debt type the caller asked about.
fn trace_subject<'a>(selected: &[&'a Debt]) -> &'a Debt {
    selected
        .iter()
        .copied()
        .max_by(|a, b| a.principal.cmp(&b.principal))
        .unwrap_or(selected[0])
}

fn per_debt_trace(debt: &Debt, eval: &DebtEvaluation, extra: Money) -> Vec<TraceStep> {
    let mut steps = Vec::new();
    if debt.is_revolving() {
        steps.push(trace::minimum_payment_step(
            debt.principal,
            debt.minimum_payment.floor,
            debt.minimum_payment.balance_pct,
            eval.base_payment,
        ));
    } else if debt.apr.is_zero() {
        steps.push(trace::zero_rate_payment_step(
            debt.principal,
            debt.term_months.unwrap_or_default(),
            eval.base_payment,
        ));
    } else {
        steps.push(trace::monthly_payment_step(
            debt.principal,
            debt.apr,
            debt.term_months.unwrap_or_default(),
            eval.base_payment,
        ));
    }
    if extra > Decimal::ZERO {
        steps.push(trace::extra_payment_step(
            eval.base_payment,
            extra,
            eval.total_payment,
        ));
    }
    steps.push(trace::payoff_projection_step(eval.months, eval.total_interest));
    steps
}

fn per_debt_scenario(
    selected: &[&Debt],
    extra: Money,
    config: &EngineConfig,
    as_of: NaiveDate,
    result: &mut SimulationResult,
    warnings: &mut Vec<String>,
) -> DebtEngineResult<()> {
    let subject = trace_subject(selected);
    let mut total_payment = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;
    let mut max_months = 0u32;
    let mut all_determinate = true;

    for debt in selected {
        let eval = evaluate_debt(debt, extra, config)?;
        if eval.non_amortizing {
            warnings.push(format!(
                "{}: required payment does not cover monthly interest; balance never decreases",
                label(debt)
            ));
            all_determinate = false;
        }
        if eval.indeterminate {
            warnings.push(format!(
                "{}: balance not retired within {} months; payoff indeterminate",
                label(debt),
                config.max_horizon_months
            ));
            all_determinate = false;
        }

        total_payment += eval.total_payment;
        total_interest += eval.total_interest;
        max_months = max_months.max(eval.months);

        if std::ptr::eq(*debt, subject) {
            result.trace_debt_id = debt.debt_id.clone();
            result.explanation_trace = per_debt_trace(debt, &eval, extra);
        }
        result.debt_results.push(to_debt_result(debt, &eval, as_of));
    }

    result.status = EvaluationStatus::Success;
    result.total_monthly_payment = Some(round_currency(total_payment));
    result.total_interest = Some(round_currency(total_interest));
    if all_determinate {
        result.months_to_debt_free = Some(max_months);
        result.debt_free_date = payoff_date(as_of, max_months);
    }
    Ok(())
}

fn target_payoff_scenario(
    selected: &[&Debt],
    target_months: u32,
    config: &EngineConfig,
    as_of: NaiveDate,
    result: &mut SimulationResult,
) -> DebtEngineResult<()> {
    if target_months == 0 {
        return Err(DebtEngineError::InvalidInput {
            field: "target_payoff_months".into(),
            reason: "must be at least 1".into(),
        });
    }
    if target_months > config.max_horizon_months {
        return Err(DebtEngineError::InvalidInput {
            field: "target_payoff_months".into(),
            reason: format!("exceeds the {}-month horizon", config.max_horizon_months),
        });
    }

    let subject = trace_subject(selected);
    let mut total_payment = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;

    for debt in selected {
        // A fixed-term debt cannot be slowed below its schedule; a target
        // beyond the remaining term is unreachable, not approximated.
        if let Some(term) = debt.term_months {
            if !debt.is_revolving() && target_months > term {
                return Err(DebtEngineError::InfeasibleScenario(format!(
                    "{}: target of {target_months} months exceeds the {term}-month remaining \
                     term; scheduled payments already retire it sooner",
                    label(debt)
                )));
            }
        }

        let payment = payment_for_target(debt.principal, debt.apr, target_months)?;
        let outcome =
            months_with_payment(debt.principal, debt.apr, payment, config.max_horizon_months)?;
        if outcome.non_amortizing || outcome.months > target_months {
            return Err(DebtEngineError::InfeasibleScenario(format!(
                "{}: no positive payment retires the balance within {target_months} months",
                label(debt)
            )));
        }

        let eval = DebtEvaluation {
            base_payment: payment,
            total_payment: payment,
            months: outcome.months,
            total_interest: outcome.total_interest,
            non_amortizing: false,
            indeterminate: false,
        };
        total_payment += payment;
        total_interest += outcome.total_interest;

        if std::ptr::eq(*debt, subject) {
            result.trace_debt_id = debt.debt_id.clone();
            result.explanation_trace = vec![
                trace::target_payment_step(debt.principal, debt.apr, target_months, payment),
                trace::payoff_projection_step(outcome.months, outcome.total_interest),
            ];
        }
        result.debt_results.push(to_debt_result(debt, &eval, as_of));
    }

    result.status = EvaluationStatus::Success;
    result.total_monthly_payment = Some(round_currency(total_payment));
    result.total_interest = Some(round_currency(total_interest));
    result.months_to_debt_free = Some(target_months);
    result.debt_free_date = payoff_date(as_of, target_months);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn refinance_scenario(
    selected: &[&Debt],
    new_rate: Rate,
    new_term_months: u32,
    fee: Money,
    credit_score: Option<u32>,
    config: &EngineConfig,
    as_of: NaiveDate,
    result: &mut SimulationResult,
    warnings: &mut Vec<String>,
) -> DebtEngineResult<()> {
    if selected.len() != 1 {
        return Err(DebtEngineError::InvalidInput {
            field: "debt_type_filter".into(),
            reason: format!(
                "refinance applies to a single debt; {} matched the filter",
                selected.len()
            ),
        });
    }
    let debt = selected[0];
    let outcome = refinance::refinance(
        debt,
        new_rate,
        new_term_months,
        fee,
        credit_score,
        config.max_horizon_months,
    )?;

    if outcome.old_path_indeterminate {
        warnings.push(format!(
            "current payments never retire the balance; the new {}-month term bounds repayment",
            new_term_months
        ));
    } else if outcome.extends_repayment_term {
        warnings.push(format!(
            "new {}-month term outlasts the current {}-month payoff path",
            new_term_months, outcome.old_months
        ));
    }

    let eval = DebtEvaluation {
        base_payment: outcome.new_payment,
        total_payment: outcome.new_payment,
        months: new_term_months,
        total_interest: outcome.new_total_interest,
        non_amortizing: false,
        indeterminate: false,
    };
    result.debt_results.push(to_debt_result(debt, &eval, as_of));

    result.status = EvaluationStatus::Success;
    result.trace_debt_id = debt.debt_id.clone();
    result.new_monthly_payment = Some(round_currency(outcome.new_payment));
    result.total_monthly_payment = Some(round_currency(outcome.new_payment));
    result.monthly_savings = Some(round_currency(outcome.monthly_savings));
    result.break_even = Some(outcome.break_even);
    result.adjusted_rate = Some(outcome.adjusted_rate);
    result.old_total_interest = Some(round_currency(outcome.old_total_interest));
    result.new_total_interest = Some(round_currency(outcome.new_total_interest));
    result.total_interest = Some(round_currency(outcome.new_total_interest));
    result.extends_repayment_term = Some(outcome.extends_repayment_term);
    result.months_to_debt_free = Some(new_term_months);
    result.debt_free_date = payoff_date(as_of, new_term_months);

    let mut steps = Vec::new();
    if let Some(score) = credit_score {
        steps.push(trace::rate_adjustment_step(
            outcome.quoted_rate,
            score,
            outcome.rate_adjustment,
            outcome.adjusted_rate,
        ));
    }
    steps.push(trace::monthly_payment_step(
        debt.principal,
        outcome.adjusted_rate,
        new_term_months,
        outcome.new_payment,
    ));
    steps.push(trace::monthly_savings_step(
        outcome.old_payment,
        outcome.new_payment,
        outcome.monthly_savings,
    ));
    steps.push(trace::break_even_step(
        outcome.old_payment,
        outcome.new_payment,
        fee,
        outcome.break_even,
    ));
    result.explanation_trace = steps;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn consolidate_scenario(
    selected: &[&Debt],
    new_rate: Rate,
    new_term_months: u32,
    credit_score: Option<u32>,
    config: &EngineConfig,
    as_of: NaiveDate,
    result: &mut SimulationResult,
    warnings: &mut Vec<String>,
) -> DebtEngineResult<()> {
    if selected.len() < 2 {
        return Err(DebtEngineError::InvalidInput {
            field: "debts".into(),
            reason: "consolidation requires at least two debts".into(),
        });
    }
    let debts: Vec<Debt> = selected.iter().map(|d| (*d).clone()).collect();
    let outcome = refinance::consolidate(
        &debts,
        new_rate,
        new_term_months,
        credit_score,
        config.max_horizon_months,
    )?;

    if outcome.old_path_indeterminate {
        warnings.push(format!(
            "at least one debt's current payments never retire its balance; the new \
             {}-month term bounds repayment",
            new_term_months
        ));
    } else if outcome.extends_repayment_term {
        warnings.push(format!(
            "consolidation stretches repayment from {} to {} months; total interest can \
             rise even though the monthly payment falls",
            outcome.old_max_months, new_term_months
        ));
    }

    result.status = EvaluationStatus::Success;
    result.consolidated_balance = Some(outcome.combined_balance);
    result.new_monthly_payment = Some(round_currency(outcome.new_payment));
    result.total_monthly_payment = Some(round_currency(outcome.new_payment));
    result.monthly_savings = Some(round_currency(outcome.monthly_savings));
    result.adjusted_rate = Some(outcome.adjusted_rate);
    result.old_total_interest = Some(round_currency(outcome.old_total_interest));
    result.new_total_interest = Some(round_currency(outcome.new_total_interest));
    result.total_interest = Some(round_currency(outcome.new_total_interest));
    result.extends_repayment_term = Some(outcome.extends_repayment_term);
    result.months_to_debt_free = Some(new_term_months);
    result.debt_free_date = payoff_date(as_of, new_term_months);

    let subject = trace_subject(selected);
    result.trace_debt_id = subject.debt_id.clone();
    let principals: Vec<Money> = debts.iter().map(|d| d.principal).collect();
    let mut steps = Vec::new();
    if let Some(score) = credit_score {
        steps.push(trace::rate_adjustment_step(
            outcome.quoted_rate,
            score,
            outcome.rate_adjustment,
            outcome.adjusted_rate,
        ));
    }
    steps.push(trace::consolidation_balance_step(
        &principals,
        outcome.combined_balance,
    ));
    steps.push(trace::monthly_payment_step(
        outcome.combined_balance,
        outcome.adjusted_rate,
        new_term_months,
        outcome.new_payment,
    ));
    steps.push(trace::monthly_savings_step(
        outcome.old_total_payment,
        outcome.new_payment,
        outcome.monthly_savings,
    ));
    result.explanation_trace = steps;
    Ok(())
}

fn strategy_scenario(
    selected: &[&Debt],
    kind: StrategyKind,
    extra_payment: Option<Money>,
    config: &EngineConfig,
    as_of: NaiveDate,
    result: &mut SimulationResult,
    warnings: &mut Vec<String>,
) -> DebtEngineResult<()> {
    let debts: Vec<Debt> = selected.iter().map(|d| (*d).clone()).collect();
    let minimums = strategy::initial_minimum_payments(&debts)?;

    let mut steps: Vec<TraceStep> = Vec::new();
    let extra = match extra_payment {
        Some(e) if e >= Decimal::ZERO => e,
        Some(_) => {
            return Err(DebtEngineError::InvalidInput {
                field: "extra_payment".into(),
                reason: "must be non-negative".into(),
            })
        }
        None => {
            // Disclosed default so the two strategies are comparable; the
            // assumed amount is reported back, never silent.
            let pool = config.default_extra_fraction * minimums;
            steps.push(trace::assumed_extra_step(
                config.default_extra_fraction,
                minimums,
                pool,
            ));
            result.assumed_extra_payment = Some(round_currency(pool));
            pool
        }
    };

    let outcome = strategy::simulate(&debts, kind, extra, config.max_horizon_months)?;
    if outcome.indeterminate {
        warnings.push(format!(
            "portfolio not retired within {} months; payoff indeterminate",
            config.max_horizon_months
        ));
    }

    steps.push(trace::strategy_order_step(
        kind.label(),
        kind.ordering_rule(),
        &outcome.initial_order,
    ));
    if !outcome.rollover_events.is_empty() {
        steps.push(trace::rollover_step(&outcome.rollover_events));
    }
    steps.push(trace::payoff_projection_step(
        outcome.months,
        outcome.total_interest,
    ));

    for per in &outcome.per_debt {
        result.debt_results.push(DebtResult {
            debt_id: per.debt_id.clone(),
            debt_type: per.debt_type,
            principal: per.principal,
            apr: per.apr,
            monthly_payment: round_currency(per.initial_payment),
            total_interest: round_currency(per.total_interest),
            months_to_payoff: per.retired_month.unwrap_or(outcome.months),
            payoff_date: per.retired_month.and_then(|m| payoff_date(as_of, m)),
            non_amortizing: false,
            payoff_indeterminate: per.retired_month.is_none(),
        });
    }

    result.status = EvaluationStatus::Success;
    result.payoff_sequence = outcome.payoff_sequence;
    result.total_monthly_payment = Some(round_currency(minimums + extra));
    result.total_interest = Some(round_currency(outcome.total_interest));
    if !outcome.indeterminate {
        result.months_to_debt_free = Some(outcome.months);
        result.debt_free_date = payoff_date(as_of, outcome.months);
    }
    result.trace_debt_id = trace_subject(selected).debt_id.clone();
    result.explanation_trace = steps;
    Ok(())
}

fn label(debt: &Debt) -> String {
    debt.debt_id
        .clone()
        .unwrap_or_else(|| debt.debt_type.to_string())
}
