//! Periods, frequencies and settlement rules

mod period;
mod settlement;

pub use period::{Frequency, Period};
pub use settlement::SettlementRule;
