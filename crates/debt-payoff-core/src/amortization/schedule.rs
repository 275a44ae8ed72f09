use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DebtPayoffError;
use crate::types::{Apr, Money};
use crate::DebtPayoffResult;

/// Divisor converting a quoted APR percentage into a monthly decimal rate
/// (100 for the percent, 12 for the months).
const MONTHLY_RATE_DIVISOR: Decimal = dec!(1200);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One period in an amortization schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// 1-based period index.
    pub month: u32,
    /// Amount actually paid this period. Equals the fixed payment except in
    /// the final period, which pays only what is still owed.
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    /// Remaining balance after this payment.
    pub balance: Money,
    pub cumulative_interest: Money,
    pub cumulative_principal: Money,
}

/// Full payoff schedule for a single loan under a fixed monthly payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub entries: Vec<ScheduleEntry>,
    pub months_to_payoff: u32,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_paid: Money,
}

// ---------------------------------------------------------------------------
// Accrual primitives
// ---------------------------------------------------------------------------

/// Monthly periodic rate for a quoted APR: `apr / 100 / 12`.
pub fn monthly_rate(apr: Apr) -> Decimal {
    apr / MONTHLY_RATE_DIVISOR
}

/// Interest accrued on a balance over one month, rounded half-up to the
/// nearest minor unit.
///
/// The rounding direction shifts total interest by a few minor units over a
/// long schedule, so it is fixed here and applied nowhere else.
pub fn monthly_interest(balance: Money, apr: Apr) -> Money {
    round_to_minor(Decimal::from(balance) * monthly_rate(apr))
}

/// Round a Decimal amount half-up to whole minor units. Saturates on
/// overflow, which is unreachable for minor-unit magnitudes.
pub(crate) fn round_to_minor(value: Decimal) -> Money {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(Money::MAX)
}

// ---------------------------------------------------------------------------
// Schedule computation
// ---------------------------------------------------------------------------

/// Compute the full payoff schedule for a loan under a fixed monthly payment.
///
/// Each period accrues interest on the open balance, then applies the payment
/// to interest first and principal second; the final period is trimmed to the
/// remaining balance. Fails with [`DebtPayoffError::NeverPayoff`] when the
/// payment does not exceed first-period interest, producing no schedule at
/// all. A zero principal yields an empty schedule.
pub fn compute_schedule(
    principal: Money,
    apr: Apr,
    monthly_payment: Money,
) -> DebtPayoffResult<Schedule> {
    if principal < 0 {
        return Err(DebtPayoffError::InvalidInput {
            field: "principal".into(),
            reason: "must be >= 0".into(),
        });
    }
    if apr < Decimal::ZERO {
        return Err(DebtPayoffError::InvalidInput {
            field: "apr".into(),
            reason: "must be >= 0".into(),
        });
    }
    if monthly_payment <= 0 {
        return Err(DebtPayoffError::InvalidInput {
            field: "monthly_payment".into(),
            reason: "must be > 0".into(),
        });
    }

    if principal == 0 {
        return Ok(Schedule {
            entries: Vec::new(),
            months_to_payoff: 0,
            total_interest: 0,
            total_principal: 0,
            total_paid: 0,
        });
    }

    let first_interest = monthly_interest(principal, apr);
    if monthly_payment <= first_interest {
        return Err(DebtPayoffError::NeverPayoff {
            debt_id: None,
            minimum_payment: monthly_payment,
            first_interest,
        });
    }

    let mut entries: Vec<ScheduleEntry> = Vec::new();
    let mut balance = principal;
    let mut cumulative_interest: Money = 0;
    let mut cumulative_principal: Money = 0;
    let mut month: u32 = 0;

    // Once the payment clears first-period interest it clears every later
    // one, since the balance only shrinks; the loop always terminates.
    while balance > 0 {
        month += 1;
        let interest = monthly_interest(balance, apr);
        let principal_paid = (monthly_payment - interest).min(balance);
        let payment = interest + principal_paid;

        balance -= principal_paid;
        cumulative_interest += interest;
        cumulative_principal += principal_paid;

        entries.push(ScheduleEntry {
            month,
            payment,
            interest,
            principal: principal_paid,
            balance,
            cumulative_interest,
            cumulative_principal,
        });
    }

    Ok(Schedule {
        months_to_payoff: month,
        total_interest: cumulative_interest,
        total_principal: cumulative_principal,
        total_paid: cumulative_interest + cumulative_principal,
        entries,
    })
}
