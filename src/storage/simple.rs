//! Storage with constant physical parameters
//!
//! Covers the common case of a facility whose capacity, rates and tariffs do
//! not change over the contract, with optional inventory-dependent rate
//! ratchets and a terminal inventory requirement.

use serde::{Deserialize, Serialize};

use super::{InjectWithdrawRange, InventoryRange, Storage};
use crate::calendar::Period;

/// Value assigned to inventory left in storage at the end
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminalValue {
    /// Leftover inventory is worthless
    #[default]
    Zero,

    /// `value_per_unit * (inventory - reference_inventory)`
    Linear {
        value_per_unit: f64,
        #[serde(default)]
        reference_inventory: f64,
    },
}

impl TerminalValue {
    /// Value of `inventory` left at the end
    pub fn value(&self, inventory: f64) -> f64 {
        match *self {
            TerminalValue::Zero => 0.0,
            TerminalValue::Linear {
                value_per_unit,
                reference_inventory,
            } => value_per_unit * (inventory - reference_inventory),
        }
    }
}

/// Rates applying from an inventory level upwards (until the next ratchet)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateRatchet {
    pub inventory: f64,
    pub max_injection_rate: f64,
    pub max_withdrawal_rate: f64,
}

/// Storage whose parameters are constant across periods
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleStorage {
    start: Period,
    end: Period,

    /// Physical capacity bounds
    inventory: InventoryRange,

    /// Signed throughput bounds when no ratchet applies
    rates: InjectWithdrawRange,

    /// Step function of rates by inventory, sorted ascending
    ratchets: Vec<RateRatchet>,

    /// Cost per unit injected
    injection_cost_per_unit: f64,

    /// Cost per unit withdrawn
    withdrawal_cost_per_unit: f64,

    /// Fraction of injected volume consumed as fuel
    injection_fuel_rate: f64,

    /// Fraction of withdrawn volume consumed as fuel
    withdrawal_fuel_rate: f64,

    /// Fraction of inventory lost per period
    inventory_loss_rate: f64,

    /// Required inventory at `end`, if narrower than capacity
    terminal_inventory: Option<InventoryRange>,

    terminal_value: TerminalValue,
}

impl SimpleStorage {
    /// Costless storage with symmetric capacity and rate limits
    ///
    /// `max_injection_rate` and `max_withdrawal_rate` are positive magnitudes.
    pub fn new(
        start: Period,
        end: Period,
        min_inventory: f64,
        max_inventory: f64,
        max_injection_rate: f64,
        max_withdrawal_rate: f64,
    ) -> Self {
        Self {
            start,
            end,
            inventory: InventoryRange::new(min_inventory, max_inventory),
            rates: InjectWithdrawRange::new(-max_withdrawal_rate, max_injection_rate),
            ratchets: Vec::new(),
            injection_cost_per_unit: 0.0,
            withdrawal_cost_per_unit: 0.0,
            injection_fuel_rate: 0.0,
            withdrawal_fuel_rate: 0.0,
            inventory_loss_rate: 0.0,
            terminal_inventory: None,
            terminal_value: TerminalValue::Zero,
        }
    }

    /// Override the signed rate bounds, e.g. to force a minimum throughput
    pub fn with_rate_bounds(mut self, min: f64, max: f64) -> Self {
        self.rates = InjectWithdrawRange::new(min, max);
        self
    }

    /// Inventory-dependent rate steps, sorted by inventory
    pub fn with_ratchets(mut self, mut ratchets: Vec<RateRatchet>) -> Self {
        ratchets.sort_by(|a, b| a.inventory.total_cmp(&b.inventory));
        self.ratchets = ratchets;
        self
    }

    /// Per-unit injection and withdrawal tariffs
    pub fn with_costs(mut self, injection_cost_per_unit: f64, withdrawal_cost_per_unit: f64) -> Self {
        self.injection_cost_per_unit = injection_cost_per_unit;
        self.withdrawal_cost_per_unit = withdrawal_cost_per_unit;
        self
    }

    /// Fraction of the volume consumed as fuel, per direction
    pub fn with_fuel(mut self, injection_fuel_rate: f64, withdrawal_fuel_rate: f64) -> Self {
        self.injection_fuel_rate = injection_fuel_rate;
        self.withdrawal_fuel_rate = withdrawal_fuel_rate;
        self
    }

    /// Fraction of inventory lost each period
    pub fn with_inventory_loss(mut self, rate: f64) -> Self {
        self.inventory_loss_rate = rate;
        self
    }

    /// Required inventory bounds after the last period
    pub fn with_terminal_inventory(mut self, min: f64, max: f64) -> Self {
        self.terminal_inventory = Some(InventoryRange::new(min, max));
        self
    }

    /// Terminal inventory must be zero
    pub fn must_end_empty(self) -> Self {
        self.with_terminal_inventory(0.0, 0.0)
    }

    /// Valuation of leftover inventory
    pub fn with_terminal_value(mut self, terminal_value: TerminalValue) -> Self {
        self.terminal_value = terminal_value;
        self
    }

    /// Physical inventory bounds
    pub fn capacity(&self) -> InventoryRange {
        self.inventory
    }

    /// Last ratchet at or below `inventory`; the first one applies below all of them
    fn ratchet_for(&self, inventory: f64) -> Option<&RateRatchet> {
        let above = self.ratchets.partition_point(|r| r.inventory <= inventory);
        self.ratchets.get(above.saturating_sub(1))
    }
}

impl Storage for SimpleStorage {
    fn start(&self) -> Period {
        self.start
    }

    fn end(&self) -> Period {
        self.end
    }

    fn inventory_range(&self, period: Period) -> InventoryRange {
        match self.terminal_inventory {
            Some(terminal) if period >= self.end => terminal,
            _ => self.inventory,
        }
    }

    fn inject_withdraw_range(&self, _period: Period, inventory: f64) -> InjectWithdrawRange {
        match self.ratchet_for(inventory) {
            Some(r) => InjectWithdrawRange::new(-r.max_withdrawal_rate, r.max_injection_rate),
            None => self.rates,
        }
    }

    fn inventory_breakpoints(&self, _period: Period) -> Vec<f64> {
        self.ratchets.iter().map(|r| r.inventory).collect()
    }

    fn injection_cost(&self, _period: Period, _inventory: f64, volume: f64) -> f64 {
        self.injection_cost_per_unit * volume
    }

    fn withdrawal_cost(&self, _period: Period, _inventory: f64, volume: f64) -> f64 {
        self.withdrawal_cost_per_unit * volume
    }

    fn cmdty_consumed(&self, _period: Period, _inventory: f64, inject_withdraw: f64) -> f64 {
        if inject_withdraw > 0.0 {
            inject_withdraw * self.injection_fuel_rate
        } else {
            -inject_withdraw * self.withdrawal_fuel_rate
        }
    }

    fn inventory_loss(&self, _period: Period, inventory: f64) -> f64 {
        inventory * self.inventory_loss_rate
    }

    fn terminal_value(&self, inventory: f64) -> f64 {
        self.terminal_value.value(inventory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Frequency;
    use chrono::NaiveDate;

    fn storage() -> SimpleStorage {
        let start = Period::containing(Frequency::Month, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        SimpleStorage::new(start, start.offset(12), 0.0, 1000.0, 100.0, 150.0)
    }

    #[test]
    fn test_rates_and_costs() {
        let s = storage().with_costs(0.1, 0.05).with_fuel(0.01, 0.02);
        let p = s.start();
        assert_eq!(s.inject_withdraw_range(p, 500.0), InjectWithdrawRange::new(-150.0, 100.0));
        assert!((s.injection_cost(p, 0.0, 50.0) - 5.0).abs() < 1e-12);
        assert!((s.withdrawal_cost(p, 0.0, 50.0) - 2.5).abs() < 1e-12);
        assert!((s.cmdty_consumed(p, 0.0, 50.0) - 0.5).abs() < 1e-12);
        assert!((s.cmdty_consumed(p, 0.0, -50.0) - 1.0).abs() < 1e-12);
        assert_eq!(s.cmdty_consumed(p, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_ratchets_step_by_inventory() {
        let s = storage().with_ratchets(vec![
            RateRatchet { inventory: 500.0, max_injection_rate: 40.0, max_withdrawal_rate: 150.0 },
            RateRatchet { inventory: 0.0, max_injection_rate: 100.0, max_withdrawal_rate: 60.0 },
        ]);
        let p = s.start();
        assert_eq!(s.inject_withdraw_range(p, 0.0), InjectWithdrawRange::new(-60.0, 100.0));
        assert_eq!(s.inject_withdraw_range(p, 499.9), InjectWithdrawRange::new(-60.0, 100.0));
        assert_eq!(s.inject_withdraw_range(p, 500.0), InjectWithdrawRange::new(-150.0, 40.0));
        assert_eq!(s.inject_withdraw_range(p, 1000.0), InjectWithdrawRange::new(-150.0, 40.0));
        assert_eq!(s.inventory_breakpoints(p), vec![0.0, 500.0]);
    }

    #[test]
    fn test_terminal_inventory_override_applies_at_end_only() {
        let s = storage().must_end_empty();
        assert_eq!(s.inventory_range(s.start()), InventoryRange::new(0.0, 1000.0));
        assert_eq!(s.inventory_range(s.end()), InventoryRange::new(0.0, 0.0));
    }

    #[test]
    fn test_terminal_value_and_loss() {
        let s = storage()
            .with_inventory_loss(0.001)
            .with_terminal_value(TerminalValue::Linear { value_per_unit: 8.0, reference_inventory: 100.0 });
        assert!((s.terminal_value(150.0) - 400.0).abs() < 1e-12);
        assert!((s.inventory_loss(s.start(), 500.0) - 0.5).abs() < 1e-12);
        assert_eq!(storage().terminal_value(150.0), TerminalValue::default().value(150.0));
    }
}
