use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::time::Instant;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::DebtPayoffError;
use crate::types::{with_metadata, ComputationOutput, Debt, DebtId, Money, Strategy};
use crate::DebtPayoffResult;

use super::cancel::CancelToken;
use super::months::{MonthSnapshot, PayoffMonths};

/// Safety cap on simulated months (50 years).
pub const DEFAULT_MAX_MONTHS: u32 = 600;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Input for one payoff simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    pub debts: Vec<Debt>,
    /// Budget available each month beyond the sum of minimum payments.
    pub extra_budget: Money,
    pub strategy: Strategy,
    /// Simulation start; the first month closes one calendar month later.
    /// Always caller-supplied, never read from a clock.
    pub start_date: NaiveDate,
    /// Cap on simulated months. Defaults to [`DEFAULT_MAX_MONTHS`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_months: Option<u32>,
}

impl SimulationInput {
    pub fn month_cap(&self) -> u32 {
        self.max_months.unwrap_or(DEFAULT_MAX_MONTHS)
    }

    /// Content hash of the canonical JSON encoding. The engine is
    /// referentially transparent, so this key is safe for caller-side
    /// memoization of results until any input changes.
    pub fn cache_key(&self) -> DebtPayoffResult<u64> {
        let encoded = serde_json::to_string(self)?;
        let mut hasher = DefaultHasher::new();
        encoded.hash(&mut hasher);
        Ok(hasher.finish())
    }
}

/// Outcome for a single debt across the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtOutcome {
    pub debt_id: DebtId,
    pub name: String,
    pub starting_balance: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,
    /// Month the balance reached zero; 0 for debts settled before the run.
    pub months_to_payoff: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payoff_date: Option<NaiveDate>,
}

/// Output of one simulation run for one strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub strategy: Strategy,
    pub months_to_payoff: u32,
    pub total_interest_paid: Money,
    pub total_principal_paid: Money,
    /// Simulation start plus [`SimulationResult::months_to_payoff`] months.
    pub projected_payoff_date: NaiveDate,
    /// Debt ids in the priority order fixed at month zero.
    pub payoff_order: Vec<DebtId>,
    /// One outcome per input debt, in input order.
    pub debts: Vec<DebtOutcome>,
    pub monthly_snapshots: Vec<MonthSnapshot>,
}

#[derive(Default)]
struct DebtAccumulator {
    interest: Money,
    principal: Money,
    payoff_month: u32,
    payoff_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Run the month-by-month payoff waterfall for one strategy.
///
/// An empty portfolio, or one where every debt is already settled, is a
/// zero-month no-op rather than an error. Fails with
/// [`DebtPayoffError::SimulationDiverged`] when the month cap is exhausted
/// with balances still open.
pub fn simulate(
    input: &SimulationInput,
) -> DebtPayoffResult<ComputationOutput<SimulationResult>> {
    simulate_with_cancel(input, None)
}

/// [`simulate`] with a cooperative cancellation token, checked once per
/// simulated month.
pub fn simulate_with_cancel(
    input: &SimulationInput,
    cancel: Option<&CancelToken>,
) -> DebtPayoffResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut months = PayoffMonths::new(input)?;
    let payoff_order = months.payoff_order();

    if payoff_order.is_empty() {
        warnings.push("portfolio has no open debts; projection is a no-op".into());
    } else if input.extra_budget == 0 {
        warnings.push("extra budget is zero; only minimum-payment rollover accelerates payoff".into());
    }

    let mut accumulators: BTreeMap<DebtId, DebtAccumulator> = input
        .debts
        .iter()
        .map(|d| (d.id, DebtAccumulator::default()))
        .collect();
    let mut snapshots: Vec<MonthSnapshot> = Vec::new();

    while let Some(snapshot) = months.next() {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(DebtPayoffError::Cancelled);
            }
        }
        for row in &snapshot.rows {
            if let Some(acc) = accumulators.get_mut(&row.debt_id) {
                acc.interest += row.interest_accrued;
                acc.principal += row.principal_paid;
                if row.ending_balance == 0 && acc.payoff_month == 0 {
                    acc.payoff_month = snapshot.month;
                    acc.payoff_date = Some(snapshot.date);
                }
            }
        }
        snapshots.push(snapshot);
    }

    if !months.is_settled() {
        return Err(DebtPayoffError::SimulationDiverged {
            months: input.month_cap(),
            remaining: months.open_balances(),
        });
    }

    let months_to_payoff = months.months_elapsed();
    let projected_payoff_date = input
        .start_date
        .checked_add_months(Months::new(months_to_payoff))
        .ok_or_else(|| {
            DebtPayoffError::DateError(format!(
                "cannot add {months_to_payoff} months to {}",
                input.start_date
            ))
        })?;

    let debts: Vec<DebtOutcome> = input
        .debts
        .iter()
        .map(|d| {
            let acc = accumulators.get(&d.id);
            DebtOutcome {
                debt_id: d.id,
                name: d.name.clone(),
                starting_balance: d.current_balance,
                interest_paid: acc.map_or(0, |a| a.interest),
                principal_paid: acc.map_or(0, |a| a.principal),
                months_to_payoff: acc.map_or(0, |a| a.payoff_month),
                payoff_date: acc.and_then(|a| a.payoff_date),
            }
        })
        .collect();

    let total_interest_paid = debts.iter().map(|d| d.interest_paid).sum();
    let total_principal_paid = debts.iter().map(|d| d.principal_paid).sum();

    let result = SimulationResult {
        strategy: input.strategy,
        months_to_payoff,
        total_interest_paid,
        total_principal_paid,
        projected_payoff_date,
        payoff_order,
        debts,
        monthly_snapshots: snapshots,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Debt payoff waterfall (fixed month-zero ordering, permanent minimum-payment rollover)",
        &serde_json::json!({
            "strategy": input.strategy.to_string(),
            "extra_budget": input.extra_budget,
            "max_months": input.month_cap(),
            "start_date": input.start_date.to_string(),
            "debt_count": input.debts.len(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DebtKind;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn debt(id: i64, balance: i64, apr: rust_decimal::Decimal, minimum: i64) -> Debt {
        Debt {
            id,
            name: format!("debt-{id}"),
            kind: DebtKind::CreditCard,
            original_balance: balance.max(1),
            current_balance: balance,
            apr,
            minimum_payment: minimum,
        }
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn two_debt_input(strategy: Strategy) -> SimulationInput {
        SimulationInput {
            debts: vec![
                debt(1, 500_000, dec!(24), 15_000),
                debt(2, 200_000, dec!(12), 8_000),
            ],
            extra_budget: 10_000,
            strategy,
            start_date: start(),
            max_months: None,
        }
    }

    #[test]
    fn test_avalanche_two_debt_portfolio() {
        let output = simulate(&two_debt_input(Strategy::Avalanche)).unwrap();
        let result = &output.result;

        // Debt 1 carries the higher rate, so it leads despite the larger
        // balance.
        assert_eq!(result.payoff_order, vec![1, 2]);
        assert_eq!(result.months_to_payoff, 27);
        assert_eq!(result.total_interest_paid, 175_960);
        assert_eq!(result.total_principal_paid, 700_000);
        assert_eq!(
            result.projected_payoff_date,
            NaiveDate::from_ymd_opt(2027, 4, 1).unwrap()
        );

        let d1 = &result.debts[0];
        assert_eq!(d1.interest_paid, 144_937);
        assert_eq!(d1.months_to_payoff, 26);
        let d2 = &result.debts[1];
        assert_eq!(d2.interest_paid, 31_023);
        assert_eq!(d2.months_to_payoff, 27);
    }

    #[test]
    fn test_snowball_two_debt_portfolio() {
        let output = simulate(&two_debt_input(Strategy::Snowball)).unwrap();
        let result = &output.result;

        // Debt 2 has the smaller balance, so it leads despite the lower rate.
        assert_eq!(result.payoff_order, vec![2, 1]);
        assert_eq!(result.months_to_payoff, 28);
        assert_eq!(result.total_interest_paid, 199_228);

        let d2 = &result.debts[1];
        assert_eq!(d2.months_to_payoff, 12);
        assert_eq!(d2.interest_paid, 13_079);
    }

    #[test]
    fn test_single_debt_minimum_only() {
        let input = SimulationInput {
            debts: vec![debt(1, 500_000, dec!(24), 15_000)],
            extra_budget: 0,
            strategy: Strategy::Avalanche,
            start_date: start(),
            max_months: None,
        };
        let output = simulate(&input).unwrap();
        assert_eq!(output.result.months_to_payoff, 56);
        assert_eq!(output.result.total_interest_paid, 332_217);
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("extra budget is zero")));
    }

    #[test]
    fn test_empty_portfolio_is_noop() {
        let input = SimulationInput {
            debts: Vec::new(),
            extra_budget: 25_000,
            strategy: Strategy::Snowball,
            start_date: start(),
            max_months: None,
        };
        let output = simulate(&input).unwrap();
        let result = &output.result;
        assert_eq!(result.months_to_payoff, 0);
        assert_eq!(result.total_interest_paid, 0);
        assert_eq!(result.projected_payoff_date, start());
        assert!(result.monthly_snapshots.is_empty());
    }

    #[test]
    fn test_all_settled_portfolio_is_noop() {
        let mut input = two_debt_input(Strategy::Snowball);
        for d in &mut input.debts {
            d.current_balance = 0;
        }
        let output = simulate(&input).unwrap();
        assert_eq!(output.result.months_to_payoff, 0);
        assert_eq!(output.result.total_interest_paid, 0);
        // Settled debts still appear in reporting.
        assert_eq!(output.result.debts.len(), 2);
        assert_eq!(output.result.debts[0].months_to_payoff, 0);
        assert_eq!(output.result.debts[0].payoff_date, None);
    }

    #[test]
    fn test_divergence_reports_remaining_balances() {
        let mut input = two_debt_input(Strategy::Avalanche);
        input.max_months = Some(5);
        match simulate(&input).unwrap_err() {
            DebtPayoffError::SimulationDiverged { months, remaining } => {
                assert_eq!(months, 5);
                assert_eq!(remaining.len(), 2);
                assert!(remaining.iter().all(|(_, bal)| *bal > 0));
            }
            other => panic!("expected SimulationDiverged, got {other:?}"),
        }
    }

    #[test]
    fn test_balances_are_monotonic_month_over_month() {
        let output = simulate(&two_debt_input(Strategy::Avalanche)).unwrap();
        let snaps = &output.result.monthly_snapshots;
        for window in snaps.windows(2) {
            for (prev, cur) in window[0].rows.iter().zip(window[1].rows.iter()) {
                assert!(
                    cur.ending_balance <= prev.ending_balance,
                    "month {}: debt {} balance grew",
                    window[1].month,
                    cur.debt_id
                );
            }
        }
    }

    #[test]
    fn test_interest_matches_accrual_formula_every_month() {
        use crate::amortization::monthly_interest;

        let input = two_debt_input(Strategy::Snowball);
        let output = simulate(&input).unwrap();
        let aprs: BTreeMap<DebtId, rust_decimal::Decimal> =
            input.debts.iter().map(|d| (d.id, d.apr)).collect();

        let mut balances: BTreeMap<DebtId, Money> = input
            .debts
            .iter()
            .map(|d| (d.id, d.current_balance))
            .collect();
        for snap in &output.result.monthly_snapshots {
            for row in &snap.rows {
                let open = balances[&row.debt_id];
                let expected = if open > 0 {
                    monthly_interest(open, aprs[&row.debt_id])
                } else {
                    0
                };
                assert_eq!(row.interest_accrued, expected, "month {}", snap.month);
                balances.insert(row.debt_id, row.ending_balance);
            }
        }
    }

    #[test]
    fn test_conservation_of_principal() {
        for strategy in Strategy::ALL {
            let output = simulate(&two_debt_input(strategy)).unwrap();
            assert_eq!(output.result.total_principal_paid, 700_000, "{strategy}");
            for outcome in &output.result.debts {
                assert_eq!(outcome.principal_paid, outcome.starting_balance);
            }
        }
    }

    #[test]
    fn test_determinism_byte_identical_results() {
        let input = two_debt_input(Strategy::Avalanche);
        let a = simulate(&input).unwrap();
        let b = simulate(&input).unwrap();
        assert_eq!(
            serde_json::to_string(&a.result).unwrap(),
            serde_json::to_string(&b.result).unwrap()
        );
    }

    #[test]
    fn test_cache_key_stable_and_input_sensitive() {
        let input = two_debt_input(Strategy::Avalanche);
        let key_a = input.cache_key().unwrap();
        let key_b = input.cache_key().unwrap();
        assert_eq!(key_a, key_b);

        let mut changed = two_debt_input(Strategy::Avalanche);
        changed.extra_budget += 1;
        assert_ne!(key_a, changed.cache_key().unwrap());
    }

    #[test]
    fn test_pre_cancelled_token_aborts() {
        let token = CancelToken::new();
        token.cancel();
        let err =
            simulate_with_cancel(&two_debt_input(Strategy::Avalanche), Some(&token)).unwrap_err();
        assert!(matches!(err, DebtPayoffError::Cancelled));
    }

    #[test]
    fn test_negative_extra_budget_rejected() {
        let mut input = two_debt_input(Strategy::Avalanche);
        input.extra_budget = -1;
        assert!(matches!(
            simulate(&input),
            Err(DebtPayoffError::InvalidInput { .. })
        ));
    }
}
