//! Deterministic debt payoff simulation and strategy comparison.
//!
//! The engine is pure and synchronous: it receives a debt portfolio and an
//! extra-payment budget, and returns payoff projections. Identical inputs
//! always produce identical results, so callers are free to memoize on a
//! content hash of the input. Currency values are integer minor units
//! (cents); rate arithmetic goes through `rust_decimal` and rounds half-up
//! back to minor units once per accrual.

pub mod amortization;
pub mod error;
pub mod strategy;
pub mod types;

#[cfg(feature = "simulation")]
pub mod simulation;

#[cfg(feature = "comparison")]
pub mod comparison;

#[cfg(feature = "loan_impact")]
pub mod loan_impact;

pub use error::DebtPayoffError;
pub use types::*;

/// Standard result type for all debt-payoff operations
pub type DebtPayoffResult<T> = Result<T, DebtPayoffError>;
