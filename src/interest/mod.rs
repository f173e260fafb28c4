pub mod calculator;
pub mod statutory;

use crate::decimal::{Money, Rate};

pub use calculator::{calculate_interest, DayCountConvention, InterestEngine};
pub use statutory::resolve_rate;

/// interest calculation result
#[derive(Debug, Clone, PartialEq)]
pub struct InterestCalculation {
    pub interest_amount: Money,
    pub annual_rate: Rate,
    pub days: u32,
    pub principal_base: Money,
    pub convention: DayCountConvention,
}
