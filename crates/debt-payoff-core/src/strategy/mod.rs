//! Deterministic portfolio ordering for payoff strategies.

pub mod ordering;

pub use ordering::order;
