//! The pure calculation engine: inputs plus a rate snapshot in, a full
//! result record (or every validation problem at once) out.

pub mod calculator;
pub mod inputs;
pub mod rate_card;
pub mod result;
pub mod validation;

pub use calculator::{calculate, BoppCalculator, MaterialBreakdown};
pub use inputs::CalculatorInputs;
pub use rate_card::RateCard;
pub use result::CalculationResult;
pub use validation::{ResolvedRates, ValidationError};
