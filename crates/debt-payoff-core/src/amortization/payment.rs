use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::schedule::{monthly_rate, round_to_minor};
use crate::error::DebtPayoffError;
use crate::types::{Apr, Money};
use crate::DebtPayoffResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Quoted terms for a fixed-term loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentQuote {
    pub monthly_payment: Money,
    /// `monthly_payment * term_months`, the headline total-cost figure.
    pub total_payment: Money,
    /// `total_payment - principal`. The realized schedule total differs by a
    /// few minor units because the rounded payment rarely lands exactly on
    /// the term boundary.
    pub total_interest: Money,
    pub principal: Money,
    /// Effective annual rate (APY) as a percentage, 2 decimal places.
    pub effective_rate: Decimal,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
fn compound(rate: Decimal, n: u32) -> Decimal {
    let mut result = Decimal::ONE;
    let factor = Decimal::ONE + rate;
    for _ in 0..n {
        result *= factor;
    }
    result
}

fn validate_terms(principal: Money, apr: Apr, term_months: u32) -> DebtPayoffResult<()> {
    if principal <= 0 {
        return Err(DebtPayoffError::InvalidInput {
            field: "principal".into(),
            reason: "must be > 0".into(),
        });
    }
    if apr < Decimal::ZERO {
        return Err(DebtPayoffError::InvalidInput {
            field: "apr".into(),
            reason: "must be >= 0".into(),
        });
    }
    if term_months == 0 {
        return Err(DebtPayoffError::InvalidInput {
            field: "term_months".into(),
            reason: "must be > 0".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Quoting
// ---------------------------------------------------------------------------

/// Monthly payment amortizing `principal` over `term_months` at the quoted
/// APR, using the standard formula `M = P * r(1+r)^n / ((1+r)^n - 1)` and
/// rounding half-up to minor units. A 0% APR degenerates to a straight
/// principal split.
pub fn compute_fixed_payment(
    principal: Money,
    apr: Apr,
    term_months: u32,
) -> DebtPayoffResult<Money> {
    validate_terms(principal, apr, term_months)?;

    let principal_dec = Decimal::from(principal);
    if apr.is_zero() {
        return Ok(round_to_minor(
            principal_dec / Decimal::from(term_months),
        ));
    }

    let rate = monthly_rate(apr);
    let factor = compound(rate, term_months);
    Ok(round_to_minor(
        principal_dec * rate * factor / (factor - Decimal::ONE),
    ))
}

/// Full quote for a fixed-term loan: payment, quoted totals, and effective
/// annual rate.
pub fn payment_quote(
    principal: Money,
    apr: Apr,
    term_months: u32,
) -> DebtPayoffResult<PaymentQuote> {
    let monthly_payment = compute_fixed_payment(principal, apr, term_months)?;
    let total_payment = monthly_payment * Money::from(term_months);

    let effective_rate = if apr.is_zero() {
        Decimal::ZERO
    } else {
        let annual = (compound(monthly_rate(apr), 12) - Decimal::ONE) * dec!(100);
        annual.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    };

    Ok(PaymentQuote {
        monthly_payment,
        total_payment,
        total_interest: total_payment - principal,
        principal,
        effective_rate,
    })
}
