//! Scenario runner for batch valuations
//!
//! Pre-loads the storage, rates and settlement convention once, then values
//! many forward curves against them without re-reading input files.

use chrono::NaiveDate;
use rayon::prelude::*;
use std::path::Path;

use crate::calendar::SettlementRule;
use crate::curves::{loader, ForwardCurve, InterestRateCurve};
use crate::error::Result;
use crate::storage::{loader::load_storage, SimpleStorage};
use crate::valuation::{IntrinsicValuation, ValuationConfig, ValuationResult};

/// Pre-loaded scenario runner for price scenarios on one storage
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_dir(Path::new("data/sample"), valuation_date, 0.0)?;
/// let base = load_forward_curve(&path, Frequency::Month)?;
///
/// for (shock, result) in runner.run_price_scenarios(&base, &[0.8, 1.0, 1.2])? {
///     println!("{:>5.2} {:>14.2}", shock, result.npv);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    storage: SimpleStorage,
    valuation_date: NaiveDate,
    starting_inventory: f64,
    interest_rates: InterestRateCurve,
    settlement: SettlementRule,
    engine: IntrinsicValuation,
}

impl ScenarioRunner {
    /// Runner for `storage` with period-start settlement and default settings
    pub fn new(
        storage: SimpleStorage,
        valuation_date: NaiveDate,
        starting_inventory: f64,
        interest_rates: InterestRateCurve,
    ) -> Self {
        Self {
            storage,
            valuation_date,
            starting_inventory,
            interest_rates,
            settlement: SettlementRule::default(),
            engine: IntrinsicValuation::default(),
        }
    }

    /// Load `storage.json` and `interest_rates.csv` from a directory
    pub fn from_dir(dir: &Path, valuation_date: NaiveDate, starting_inventory: f64) -> anyhow::Result<Self> {
        let storage = load_storage(&dir.join("storage.json"))?;
        let interest_rates = loader::load_interest_rates(&dir.join("interest_rates.csv"))?;
        Ok(Self::new(storage, valuation_date, starting_inventory, interest_rates))
    }

    /// Replace the settlement convention
    pub fn with_settlement(mut self, settlement: SettlementRule) -> Self {
        self.settlement = settlement;
        self
    }

    /// Replace the valuation settings
    pub fn with_config(mut self, config: ValuationConfig) -> Self {
        self.engine = IntrinsicValuation::new(config);
        self
    }

    /// Storage being valued
    pub fn storage(&self) -> &SimpleStorage {
        &self.storage
    }

    /// Value the storage against one forward curve
    pub fn run(&self, forward_curve: &ForwardCurve) -> Result<ValuationResult> {
        self.engine.valuate(
            &self.storage,
            self.valuation_date,
            self.starting_inventory,
            forward_curve,
            &self.interest_rates,
            |p| self.settlement.settlement_date(p),
        )
    }

    /// Value every curve in parallel, results in input order
    pub fn run_batch(&self, curves: &[ForwardCurve]) -> Vec<Result<ValuationResult>> {
        curves.par_iter().map(|curve| self.run(curve)).collect()
    }

    /// Value `base` scaled by each multiplier; fails on the first error
    pub fn run_price_scenarios(&self, base: &ForwardCurve, multipliers: &[f64]) -> Result<Vec<(f64, ValuationResult)>> {
        log::info!("Running {} price scenarios", multipliers.len());
        multipliers
            .par_iter()
            .map(|&m| self.run(&base.scaled(m)).map(|result| (m, result)))
            .collect()
    }
}
