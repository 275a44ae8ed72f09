//! Single-loan extra-payment impact analysis.
//!
//! The standalone loan-calculator counterpart to the portfolio simulator:
//! quote the fixed payment for a term, then compare the realized schedule
//! against one carrying an extra monthly payment.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::amortization::{compute_fixed_payment, compute_schedule, Schedule};
use crate::error::DebtPayoffError;
use crate::types::{with_metadata, Apr, ComputationOutput, Money};
use crate::DebtPayoffResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanImpactInput {
    pub principal: Money,
    pub apr: Apr,
    pub term_months: u32,
    /// Additional amount paid on top of the quoted fixed payment each month.
    pub extra_monthly: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanImpactOutput {
    /// Quoted fixed payment for the term, before the extra.
    pub monthly_payment: Money,
    pub baseline: Schedule,
    pub with_extra: Schedule,
    pub interest_saved: Money,
    pub months_saved: u32,
    /// Total cash saved over the life of the loan.
    pub total_saved: Money,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Quantify the effect of a fixed extra monthly payment on a single loan.
pub fn compare_with_extra_payment(
    input: &LoanImpactInput,
) -> DebtPayoffResult<ComputationOutput<LoanImpactOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.extra_monthly < 0 {
        return Err(DebtPayoffError::InvalidInput {
            field: "extra_monthly".into(),
            reason: "must be >= 0".into(),
        });
    }
    if input.extra_monthly == 0 {
        warnings.push("extra payment is zero; both schedules are identical".into());
    }

    let monthly_payment = compute_fixed_payment(input.principal, input.apr, input.term_months)?;
    let baseline = compute_schedule(input.principal, input.apr, monthly_payment)?;
    let with_extra = compute_schedule(
        input.principal,
        input.apr,
        monthly_payment + input.extra_monthly,
    )?;

    let output = LoanImpactOutput {
        monthly_payment,
        interest_saved: baseline.total_interest - with_extra.total_interest,
        months_saved: baseline.months_to_payoff - with_extra.months_to_payoff,
        total_saved: baseline.total_paid - with_extra.total_paid,
        baseline,
        with_extra,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Extra-payment impact on a fixed-term amortizing loan",
        &serde_json::json!({
            "principal": input.principal,
            "apr": input.apr.to_string(),
            "term_months": input.term_months,
            "extra_monthly": input.extra_monthly,
        }),
        warnings,
        elapsed,
        output,
    ))
}
