use thiserror::Error;

use crate::types::{DebtId, Money};

#[derive(Debug, Error)]
pub enum DebtPayoffError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error(
        "Payment {minimum_payment} cannot outpace first-period interest {first_interest}{}",
        fmt_debt_id(.debt_id)
    )]
    NeverPayoff {
        /// Offending debt, when the failure comes from a portfolio run.
        /// `None` for a standalone schedule computation.
        debt_id: Option<DebtId>,
        minimum_payment: Money,
        first_interest: Money,
    },

    #[error(
        "Simulation did not reach zero balance within {months} months; remaining balances: {remaining:?}"
    )]
    SimulationDiverged {
        months: u32,
        remaining: Vec<(DebtId, Money)>,
    },

    #[error("Simulation cancelled by caller")]
    Cancelled,

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

fn fmt_debt_id(debt_id: &Option<DebtId>) -> String {
    match debt_id {
        Some(id) => format!(" (debt {id})"),
        None => String::new(),
    }
}

impl From<serde_json::Error> for DebtPayoffError {
    fn from(e: serde_json::Error) -> Self {
        DebtPayoffError::SerializationError(e.to_string())
    }
}
