//! Commodity Storage - Intrinsic valuation of physical storage capacity
//!
//! This library provides:
//! - Storage descriptors with inventory bounds, rate ratchets, costs, fuel and losses
//! - Forward price and interest rate curves keyed by delivery period and date
//! - Backward induction over an inventory grid with golden-section decision search
//! - Forward replay of the optimal operating profile and NPV
//! - Batch price scenarios run in parallel

pub mod calendar;
pub mod curves;
pub mod error;
pub mod scenario;
pub mod storage;
pub mod valuation;

// Re-export commonly used types
pub use calendar::{Frequency, Period, SettlementRule};
pub use curves::{ForwardCurve, InterestRateCurve};
pub use error::{Result, ValuationError};
pub use scenario::ScenarioRunner;
pub use storage::{InventoryRange, SimpleStorage, Storage, StorageConfig, TerminalValue};
pub use valuation::{valuate, IntrinsicValuation, ProfileRow, ValuationConfig, ValuationResult};
