use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DebtPayoffError;
use crate::DebtPayoffResult;

/// All monetary values. Integer minor currency units (cents), pre-normalized
/// to a single currency upstream.
pub type Money = i64;

/// Annual percentage rate as quoted (`18.99` = 18.99% APR). Wraps Decimal to
/// prevent accidental f64 usage.
pub type Apr = Decimal;

/// Stable debt identifier. Ordering ties always break ascending by id.
pub type DebtId = i64;

/// Debt category. Descriptive only; never used in computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtKind {
    CreditCard,
    StudentLoan,
    PersonalLoan,
    AutoLoan,
    Mortgage,
    Medical,
    #[default]
    Other,
}

/// A single liability as supplied by the caller. Treated as immutable input:
/// the simulator clones balances into its own working state and never writes
/// back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debt {
    pub id: DebtId,
    pub name: String,
    pub kind: DebtKind,
    /// Balance at origination, fixed at creation.
    pub original_balance: Money,
    /// Balance entering the simulation. Zero means already settled.
    pub current_balance: Money,
    pub apr: Apr,
    pub minimum_payment: Money,
}

impl Debt {
    /// Already paid off before the simulation starts.
    pub fn is_settled(&self) -> bool {
        self.current_balance == 0
    }

    pub fn validate(&self) -> DebtPayoffResult<()> {
        if self.original_balance <= 0 {
            return Err(DebtPayoffError::InvalidInput {
                field: format!("debt {}: original_balance", self.id),
                reason: "must be > 0".into(),
            });
        }
        if self.current_balance < 0 {
            return Err(DebtPayoffError::InvalidInput {
                field: format!("debt {}: current_balance", self.id),
                reason: "must be >= 0".into(),
            });
        }
        if self.apr < Decimal::ZERO {
            return Err(DebtPayoffError::InvalidInput {
                field: format!("debt {}: apr", self.id),
                reason: "must be >= 0".into(),
            });
        }
        if self.minimum_payment <= 0 {
            return Err(DebtPayoffError::InvalidInput {
                field: format!("debt {}: minimum_payment", self.id),
                reason: "must be > 0".into(),
            });
        }
        Ok(())
    }
}

/// Payoff prioritization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Smallest current balance first.
    Snowball,
    /// Highest interest rate first.
    Avalanche,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Snowball, Strategy::Avalanche];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Snowball => write!(f, "snowball"),
            Strategy::Avalanche => write!(f, "avalanche"),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "integer_minor_units_half_up".to_string(),
        },
    }
}
