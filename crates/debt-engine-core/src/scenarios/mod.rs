pub mod engine;
pub mod refinance;
pub mod strategy;
