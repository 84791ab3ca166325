//! Storage facility descriptors
//!
//! The valuation only ever talks to a storage through the [`Storage`] trait: a
//! pure query interface answering, per period and inventory level, what the
//! facility physically allows and what it costs.
//!
//! # Conventions
//!
//! - Volumes are signed: positive injects into storage, negative withdraws.
//! - Decisions are taken in periods `[start, end)`. The inventory held at
//!   `end` is the terminal inventory and is valued by `terminal_value`.
//! - `inventory_range` must also answer for `end`, giving the allowed
//!   terminal inventory.

mod simple;
pub mod loader;

pub use simple::{RateRatchet, SimpleStorage, TerminalValue};
pub use loader::StorageConfig;

use serde::{Deserialize, Serialize};

use crate::calendar::{Frequency, Period};

/// Closed interval of allowed inventory levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryRange {
    pub min: f64,
    pub max: f64,
}

impl InventoryRange {
    /// Interval `[min, max]`
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `inventory` lies within the bounds, give or take `tolerance`
    pub fn contains(&self, inventory: f64, tolerance: f64) -> bool {
        inventory >= self.min - tolerance && inventory <= self.max + tolerance
    }

    /// `max - min`
    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Signed bounds on the volume injected (positive) or withdrawn (negative)
/// within one period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InjectWithdrawRange {
    pub min: f64,
    pub max: f64,
}

impl InjectWithdrawRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// No throughput possible
    pub fn zero() -> Self {
        Self { min: 0.0, max: 0.0 }
    }
}

/// Query interface over a storage facility's physical and cost constraints
pub trait Storage: Sync {
    /// First period in which decisions can be taken
    fn start(&self) -> Period;

    /// Terminal period; no decision is taken here
    fn end(&self) -> Period;

    fn frequency(&self) -> Frequency {
        self.start().frequency()
    }

    /// Physical inventory bounds at the start of `period`
    fn inventory_range(&self, period: Period) -> InventoryRange;

    /// Feasible injection/withdrawal volumes given the current inventory
    fn inject_withdraw_range(&self, period: Period, inventory: f64) -> InjectWithdrawRange;

    /// Cost of injecting `volume` (> 0)
    fn injection_cost(&self, period: Period, inventory: f64, volume: f64) -> f64;

    /// Cost of withdrawing `volume` (> 0, given as a magnitude)
    fn withdrawal_cost(&self, period: Period, inventory: f64, volume: f64) -> f64;

    /// Commodity consumed as fuel for the signed decision `inject_withdraw`;
    /// bought in the market at the period's price
    fn cmdty_consumed(&self, _period: Period, _inventory: f64, _inject_withdraw: f64) -> f64 {
        0.0
    }

    /// Inventory physically lost over the period (shrinkage)
    fn inventory_loss(&self, _period: Period, _inventory: f64) -> f64 {
        0.0
    }

    /// Inventory levels where `inject_withdraw_range` or `inventory_loss` may
    /// jump
    ///
    /// Between consecutive breakpoints both must be continuous, and the reach
    /// `v - inventory_loss(v) + rate(v)` non-decreasing in `v`. At a
    /// breakpoint the range above it applies.
    fn inventory_breakpoints(&self, _period: Period) -> Vec<f64> {
        Vec::new()
    }

    /// Value of holding `inventory` at the end of the storage contract
    fn terminal_value(&self, inventory: f64) -> f64;
}
