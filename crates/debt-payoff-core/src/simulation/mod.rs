//! Month-by-month payoff waterfall across a debt portfolio.
//!
//! The ordering is fixed at month zero and never re-ranked mid-run; a retired
//! debt's minimum payment is permanently redirected into the rollover pool
//! for every subsequent month.

pub mod cancel;
pub mod months;
pub mod simulator;

pub use cancel::CancelToken;
pub use months::{DebtMonthRow, MonthSnapshot, PayoffMonths};
pub use simulator::{
    simulate, simulate_with_cancel, DebtOutcome, SimulationInput, SimulationResult,
    DEFAULT_MAX_MONTHS,
};
