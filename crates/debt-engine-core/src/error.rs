use thiserror::Error;

#[derive(Debug, Error)]
pub enum DebtEngineError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Infeasible scenario: {0}")]
    InfeasibleScenario(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },
}
