//! Side-by-side evaluation of the two payoff strategies over one portfolio.

pub mod comparator;

pub use comparator::{compare, ComparisonInput, ComparisonReport};
