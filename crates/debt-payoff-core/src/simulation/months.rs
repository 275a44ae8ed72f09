use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use std::collections::HashSet;

use crate::amortization::monthly_interest;
use crate::error::DebtPayoffError;
use crate::strategy;
use crate::types::{Apr, Debt, DebtId, Money};
use crate::DebtPayoffResult;

use super::simulator::SimulationInput;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// Per-debt activity within one simulated month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtMonthRow {
    pub debt_id: DebtId,
    pub interest_accrued: Money,
    /// Principal retired this month, minimum payment and rollover combined.
    pub principal_paid: Money,
    /// Portion of `principal_paid` funded by the rollover pool.
    pub extra_applied: Money,
    pub ending_balance: Money,
}

/// State of the portfolio after one simulated month. Rows follow the fixed
/// priority order; debts retired in earlier months keep appearing with zero
/// activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthSnapshot {
    /// 1-based month index.
    pub month: u32,
    pub date: NaiveDate,
    /// Pool available this month: extra budget plus the redirected minimum
    /// payments of debts retired in prior months.
    pub rollover_pool: Money,
    pub rows: Vec<DebtMonthRow>,
    pub total_balance: Money,
}

#[derive(Debug, Clone)]
struct WorkingDebt {
    id: DebtId,
    apr: Apr,
    minimum_payment: Money,
    balance: Money,
}

// ---------------------------------------------------------------------------
// The month iterator
// ---------------------------------------------------------------------------

/// Lazily evaluated month-by-month payoff projection.
///
/// The sequence is finite and restartable: constructing it again from the
/// same input replays from month one. Iteration ends when the portfolio
/// settles or the month cap is hit; callers distinguish the two through
/// [`PayoffMonths::is_settled`]. Dropping the iterator early costs nothing,
/// so callers that only want totals can stop at any point.
#[derive(Debug, Clone)]
pub struct PayoffMonths {
    /// Working balances in the priority order fixed at month zero.
    working: Vec<WorkingDebt>,
    extra_budget: Money,
    start_date: NaiveDate,
    month_cap: u32,
    month: u32,
    /// Sum of minimum payments of retired debts, fed into next month's pool.
    rollover: Money,
}

impl PayoffMonths {
    /// Validate the input, run the per-debt never-payoff pre-check, and fix
    /// the payoff ordering.
    pub fn new(input: &SimulationInput) -> DebtPayoffResult<Self> {
        for debt in &input.debts {
            debt.validate()?;
        }
        let mut seen: HashSet<DebtId> = HashSet::with_capacity(input.debts.len());
        for debt in &input.debts {
            if !seen.insert(debt.id) {
                return Err(DebtPayoffError::InvalidInput {
                    field: "debts".into(),
                    reason: format!("duplicate debt id {}", debt.id),
                });
            }
        }
        if input.extra_budget < 0 {
            return Err(DebtPayoffError::InvalidInput {
                field: "extra_budget".into(),
                reason: "must be >= 0".into(),
            });
        }
        let month_cap = input.month_cap();
        if month_cap == 0 {
            return Err(DebtPayoffError::InvalidInput {
                field: "max_months".into(),
                reason: "must be > 0".into(),
            });
        }
        if input
            .start_date
            .checked_add_months(Months::new(month_cap))
            .is_none()
        {
            return Err(DebtPayoffError::DateError(format!(
                "cannot project {month_cap} months past {}",
                input.start_date
            )));
        }

        // A debt whose minimum payment cannot clear its own first-period
        // interest never amortizes, regardless of the extra budget. Checked
        // ascending by id so the reported debt is deterministic.
        let mut open: Vec<&Debt> = input.debts.iter().filter(|d| !d.is_settled()).collect();
        open.sort_by_key(|d| d.id);
        for debt in open {
            let first_interest = monthly_interest(debt.current_balance, debt.apr);
            if debt.minimum_payment <= first_interest {
                return Err(DebtPayoffError::NeverPayoff {
                    debt_id: Some(debt.id),
                    minimum_payment: debt.minimum_payment,
                    first_interest,
                });
            }
        }

        let working = strategy::order(&input.debts, input.strategy)
            .into_iter()
            .map(|d| WorkingDebt {
                id: d.id,
                apr: d.apr,
                minimum_payment: d.minimum_payment,
                balance: d.current_balance,
            })
            .collect();

        Ok(Self {
            working,
            extra_budget: input.extra_budget,
            start_date: input.start_date,
            month_cap,
            month: 0,
            rollover: 0,
        })
    }

    /// Debt ids in the priority order fixed at month zero.
    pub fn payoff_order(&self) -> Vec<DebtId> {
        self.working.iter().map(|d| d.id).collect()
    }

    pub fn is_settled(&self) -> bool {
        self.working.iter().all(|d| d.balance == 0)
    }

    /// Debts still open with their current working balances.
    pub fn open_balances(&self) -> Vec<(DebtId, Money)> {
        self.working
            .iter()
            .filter(|d| d.balance > 0)
            .map(|d| (d.id, d.balance))
            .collect()
    }

    /// Months simulated so far.
    pub fn months_elapsed(&self) -> u32 {
        self.month
    }
}

impl Iterator for PayoffMonths {
    type Item = MonthSnapshot;

    fn next(&mut self) -> Option<MonthSnapshot> {
        if self.is_settled() || self.month >= self.month_cap {
            return None;
        }
        self.month += 1;

        let pool = self.extra_budget + self.rollover;
        let mut rows: Vec<DebtMonthRow> = Vec::with_capacity(self.working.len());

        // Minimum-payment pass: every open debt accrues interest, then its
        // minimum payment lands, capped at what is owed.
        for debt in &mut self.working {
            if debt.balance == 0 {
                rows.push(DebtMonthRow {
                    debt_id: debt.id,
                    interest_accrued: 0,
                    principal_paid: 0,
                    extra_applied: 0,
                    ending_balance: 0,
                });
                continue;
            }
            let interest = monthly_interest(debt.balance, debt.apr);
            let principal = (debt.minimum_payment - interest).min(debt.balance);
            debt.balance -= principal;
            rows.push(DebtMonthRow {
                debt_id: debt.id,
                interest_accrued: interest,
                principal_paid: principal,
                extra_applied: 0,
                ending_balance: debt.balance,
            });
        }

        // Rollover pass: the whole pool targets the highest-priority open
        // debt; surplus cascades down the fixed order within the same month.
        let mut remaining = pool;
        for (debt, row) in self.working.iter_mut().zip(rows.iter_mut()) {
            if remaining == 0 {
                break;
            }
            if debt.balance == 0 {
                continue;
            }
            let applied = remaining.min(debt.balance);
            debt.balance -= applied;
            remaining -= applied;
            row.extra_applied = applied;
            row.principal_paid += applied;
            row.ending_balance = debt.balance;
        }

        // Every retired debt's minimum payment redirects into the pool for
        // all subsequent months, not just the month after retirement.
        self.rollover = self
            .working
            .iter()
            .filter(|d| d.balance == 0)
            .map(|d| d.minimum_payment)
            .sum();

        // Validated in new(); the fallback is unreachable.
        let date = self
            .start_date
            .checked_add_months(Months::new(self.month))
            .unwrap_or(self.start_date);
        let total_balance = self.working.iter().map(|d| d.balance).sum();

        Some(MonthSnapshot {
            month: self.month,
            date,
            rollover_pool: pool,
            rows,
            total_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DebtKind, Strategy};
    use rust_decimal_macros::dec;

    fn debt(id: i64, balance: i64, apr: rust_decimal::Decimal, minimum: i64) -> Debt {
        Debt {
            id,
            name: format!("debt-{id}"),
            kind: DebtKind::Other,
            original_balance: balance.max(1),
            current_balance: balance,
            apr,
            minimum_payment: minimum,
        }
    }

    fn two_debt_input(strategy: Strategy) -> SimulationInput {
        SimulationInput {
            debts: vec![
                debt(1, 500_000, dec!(24), 15_000),
                debt(2, 200_000, dec!(12), 8_000),
            ],
            extra_budget: 10_000,
            strategy,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            max_months: None,
        }
    }

    #[test]
    fn test_first_month_accrual_and_rollover_target() {
        let input = two_debt_input(Strategy::Avalanche);
        let mut months = PayoffMonths::new(&input).unwrap();
        let snap = months.next().unwrap();

        assert_eq!(snap.month, 1);
        assert_eq!(snap.date, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(snap.rollover_pool, 10_000);

        // Debt 1 leads under avalanche: interest 500,000 * 2%/mo = 10,000,
        // minimum retires 5,000 principal, extra adds 10,000 more.
        let a = &snap.rows[0];
        assert_eq!(a.debt_id, 1);
        assert_eq!(a.interest_accrued, 10_000);
        assert_eq!(a.extra_applied, 10_000);
        assert_eq!(a.principal_paid, 15_000);
        assert_eq!(a.ending_balance, 485_000);

        // Debt 2: interest 200,000 * 1%/mo = 2,000, minimum-only.
        let b = &snap.rows[1];
        assert_eq!(b.debt_id, 2);
        assert_eq!(b.interest_accrued, 2_000);
        assert_eq!(b.extra_applied, 0);
        assert_eq!(b.ending_balance, 194_000);
    }

    #[test]
    fn test_retired_minimum_joins_pool_every_following_month() {
        let input = two_debt_input(Strategy::Snowball);
        let months = PayoffMonths::new(&input).unwrap();
        let snaps: Vec<MonthSnapshot> = months.collect();

        // Debt 2 (smaller balance) retires at month 12 under snowball.
        let retired_at = snaps
            .iter()
            .find(|s| s.rows.iter().any(|r| r.debt_id == 2 && r.ending_balance == 0))
            .map(|s| s.month)
            .unwrap();
        assert_eq!(retired_at, 12);

        // From the next month to the end, the pool carries debt 2's minimum.
        for snap in snaps.iter().filter(|s| s.month > retired_at) {
            assert_eq!(snap.rollover_pool, 10_000 + 8_000, "month {}", snap.month);
        }
    }

    #[test]
    fn test_surplus_cascades_within_month() {
        // Pool far larger than the lead debt: the remainder must hit the
        // second debt in the same month.
        let input = SimulationInput {
            debts: vec![
                debt(1, 30_000, dec!(24), 5_000),
                debt(2, 200_000, dec!(12), 8_000),
            ],
            extra_budget: 100_000,
            strategy: Strategy::Snowball,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            max_months: None,
        };
        let mut months = PayoffMonths::new(&input).unwrap();
        let snap = months.next().unwrap();

        let lead = &snap.rows[0];
        assert_eq!(lead.debt_id, 1);
        assert_eq!(lead.ending_balance, 0);

        let second = &snap.rows[1];
        assert!(second.extra_applied > 0, "surplus should cascade");
        assert_eq!(lead.extra_applied + second.extra_applied, 100_000);
    }

    #[test]
    fn test_iterator_is_restartable() {
        let input = two_debt_input(Strategy::Avalanche);
        let first: Vec<Money> = PayoffMonths::new(&input)
            .unwrap()
            .map(|s| s.total_balance)
            .collect();
        let second: Vec<Money> = PayoffMonths::new(&input)
            .unwrap()
            .map(|s| s.total_balance)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_month_cap_stops_iteration_without_settling() {
        let mut input = two_debt_input(Strategy::Avalanche);
        input.max_months = Some(3);
        let mut months = PayoffMonths::new(&input).unwrap();
        assert_eq!(months.by_ref().count(), 3);
        assert!(!months.is_settled());
        assert_eq!(months.open_balances().len(), 2);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut input = two_debt_input(Strategy::Avalanche);
        input.debts[1].id = 1;
        assert!(matches!(
            PayoffMonths::new(&input),
            Err(DebtPayoffError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_never_payoff_precheck_names_the_debt() {
        let mut input = two_debt_input(Strategy::Avalanche);
        input.debts.push(debt(3, 1_000_000, dec!(29.99), 2_000));
        match PayoffMonths::new(&input).unwrap_err() {
            DebtPayoffError::NeverPayoff {
                debt_id,
                first_interest,
                ..
            } => {
                assert_eq!(debt_id, Some(3));
                assert_eq!(first_interest, 24_992);
            }
            other => panic!("expected NeverPayoff, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_portfolio_yields_nothing() {
        let input = SimulationInput {
            debts: Vec::new(),
            extra_budget: 50_000,
            strategy: Strategy::Snowball,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            max_months: None,
        };
        let mut months = PayoffMonths::new(&input).unwrap();
        assert!(months.is_settled());
        assert!(months.next().is_none());
    }
}
