use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::amortization::monthly_interest;
use crate::simulation::{simulate, SimulationInput, SimulationResult};
use crate::types::{with_metadata, ComputationOutput, Debt, Money, Strategy};
use crate::DebtPayoffResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Input for a strategy comparison. One shared budget, one start date, both
/// strategies evaluated on identical cloned state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub debts: Vec<Debt>,
    pub extra_budget: Money,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_months: Option<u32>,
}

/// Paired simulation results with derived savings fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub snowball: SimulationResult,
    pub avalanche: SimulationResult,
    /// Snowball total interest minus avalanche total interest. Positive when
    /// avalanche is the cheaper plan.
    pub interest_saved: Money,
    /// Snowball months minus avalanche months. Negative when snowball
    /// finishes first.
    pub months_saved: i64,
    /// Interest accrued under minimum payments alone, with no extra budget
    /// and no rollover. The baseline both strategies are measured against.
    pub minimum_only_interest: Money,
    /// The strategy with the lower total interest; avalanche on ties.
    pub recommended: Strategy,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Run the simulator once per strategy and derive the comparison fields.
///
/// A pure function of its inputs; the two runs are fully independent. An
/// empty portfolio produces a zero report for both strategies.
pub fn compare(
    input: &ComparisonInput,
) -> DebtPayoffResult<ComputationOutput<ComparisonReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let simulation_input = |strategy: Strategy| SimulationInput {
        debts: input.debts.clone(),
        extra_budget: input.extra_budget,
        strategy,
        start_date: input.start_date,
        max_months: input.max_months,
    };

    let snowball_run = simulate(&simulation_input(Strategy::Snowball))?;
    let avalanche_run = simulate(&simulation_input(Strategy::Avalanche))?;
    warnings.extend(snowball_run.warnings);

    let snowball = snowball_run.result;
    let avalanche = avalanche_run.result;

    let (minimum_only_interest, baseline_settled) = minimum_only_interest(
        &input.debts,
        input.max_months.unwrap_or(crate::simulation::DEFAULT_MAX_MONTHS),
    );
    if !baseline_settled {
        warnings.push(
            "minimum-only baseline truncated at the month cap; quoted baseline interest is a floor"
                .into(),
        );
    }

    let interest_saved = snowball.total_interest_paid - avalanche.total_interest_paid;
    let months_saved = i64::from(snowball.months_to_payoff) - i64::from(avalanche.months_to_payoff);
    let recommended = if avalanche.total_interest_paid <= snowball.total_interest_paid {
        Strategy::Avalanche
    } else {
        Strategy::Snowball
    };

    let report = ComparisonReport {
        snowball,
        avalanche,
        interest_saved,
        months_saved,
        minimum_only_interest,
        recommended,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Snowball vs avalanche payoff comparison with minimum-only baseline",
        &serde_json::json!({
            "extra_budget": input.extra_budget,
            "start_date": input.start_date.to_string(),
            "debt_count": input.debts.len(),
        }),
        warnings,
        elapsed,
        report,
    ))
}

/// Total interest under minimum payments only: every debt amortizes in
/// isolation, nothing rolls over. Returns the accumulated interest and
/// whether every balance reached zero within the cap.
fn minimum_only_interest(debts: &[Debt], month_cap: u32) -> (Money, bool) {
    let mut balances: Vec<(Money, &Debt)> = debts
        .iter()
        .filter(|d| !d.is_settled())
        .map(|d| (d.current_balance, d))
        .collect();

    let mut total_interest: Money = 0;
    let mut month: u32 = 0;
    while balances.iter().any(|(bal, _)| *bal > 0) && month < month_cap {
        month += 1;
        for (balance, debt) in &mut balances {
            if *balance == 0 {
                continue;
            }
            let interest = monthly_interest(*balance, debt.apr);
            total_interest += interest;
            *balance -= (debt.minimum_payment - interest).min(*balance);
        }
    }

    let settled = balances.iter().all(|(bal, _)| *bal == 0);
    (total_interest, settled)
}
