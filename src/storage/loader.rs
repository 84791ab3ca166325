//! JSON storage configuration
//!
//! Example:
//!
//! ```json
//! {
//!   "frequency": "month",
//!   "start": "2025-04-01",
//!   "end": "2026-04-01",
//!   "min_inventory": 0.0,
//!   "max_inventory": 1000.0,
//!   "max_injection_rate": 150.0,
//!   "max_withdrawal_rate": 200.0,
//!   "injection_cost": 0.05,
//!   "terminal_inventory": { "min": 0.0, "max": 0.0 }
//! }
//! ```

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use super::{InventoryRange, RateRatchet, SimpleStorage, TerminalValue};
use crate::calendar::{Frequency, Period};

/// File-level description of a [`SimpleStorage`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub frequency: Frequency,

    /// Any date in the first decision period
    pub start: NaiveDate,

    /// Any date in the terminal period
    pub end: NaiveDate,

    pub min_inventory: f64,
    pub max_inventory: f64,
    pub max_injection_rate: f64,
    pub max_withdrawal_rate: f64,

    #[serde(default)]
    pub ratchets: Vec<RateRatchet>,

    #[serde(default)]
    pub injection_cost: f64,

    #[serde(default)]
    pub withdrawal_cost: f64,

    #[serde(default)]
    pub injection_fuel_rate: f64,

    #[serde(default)]
    pub withdrawal_fuel_rate: f64,

    #[serde(default)]
    pub inventory_loss_rate: f64,

    #[serde(default)]
    pub terminal_inventory: Option<InventoryRange>,

    #[serde(default)]
    pub terminal_value: TerminalValue,
}

impl StorageConfig {
    /// Check the physical parameters and build the storage
    pub fn into_storage(self) -> Result<SimpleStorage> {
        if self.max_inventory < self.min_inventory {
            bail!(
                "max_inventory {} is below min_inventory {}",
                self.max_inventory,
                self.min_inventory
            );
        }
        if self.max_injection_rate < 0.0 || self.max_withdrawal_rate < 0.0 {
            bail!("injection and withdrawal rates are magnitudes and must be non-negative");
        }
        if !(0.0..1.0).contains(&self.inventory_loss_rate) {
            bail!("inventory_loss_rate {} must be in [0, 1)", self.inventory_loss_rate);
        }
        if let Some(t) = &self.terminal_inventory {
            if t.max < t.min {
                bail!("terminal inventory max {} is below min {}", t.max, t.min);
            }
        }

        let start = Period::containing(self.frequency, self.start);
        let end = Period::containing(self.frequency, self.end);
        if end < start {
            bail!("storage end {} is before start {}", end, start);
        }

        let mut storage = SimpleStorage::new(
            start,
            end,
            self.min_inventory,
            self.max_inventory,
            self.max_injection_rate,
            self.max_withdrawal_rate,
        )
        .with_ratchets(self.ratchets)
        .with_costs(self.injection_cost, self.withdrawal_cost)
        .with_fuel(self.injection_fuel_rate, self.withdrawal_fuel_rate)
        .with_inventory_loss(self.inventory_loss_rate)
        .with_terminal_value(self.terminal_value);

        if let Some(t) = self.terminal_inventory {
            storage = storage.with_terminal_inventory(t.min, t.max);
        }

        Ok(storage)
    }
}

/// Load a storage from a JSON file
pub fn load_storage(path: &Path) -> Result<SimpleStorage> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let config: StorageConfig =
        serde_json::from_reader(file).with_context(|| format!("parsing {}", path.display()))?;
    config.into_storage()
}
