//! Single-loan amortization primitives: monthly interest accrual, full
//! payoff schedules under a fixed payment, and fixed-payment quoting.
//!
//! These are the numeric building blocks the portfolio simulator reuses for
//! its per-debt interest step, and the standalone loan calculator consumes
//! directly.

pub mod payment;
pub mod schedule;

pub use payment::{compute_fixed_payment, payment_quote, PaymentQuote};
pub use schedule::{compute_schedule, monthly_interest, monthly_rate, Schedule, ScheduleEntry};
