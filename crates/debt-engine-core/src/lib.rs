pub mod amortization;
pub mod error;
pub mod normalize;
pub mod revolving;
pub mod scenarios;
pub mod trace;
pub mod types;

pub use error::DebtEngineError;
pub use normalize::{EvaluationRequest, RawDebt};
pub use scenarios::engine::{evaluate, evaluate_with_config};
pub use types::*;

/// Standard result type for all debt-engine operations
pub type DebtEngineResult<T> = Result<T, DebtEngineError>;
