//! Valuation settings

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValuationError};

/// How the per-period decision is searched for
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DecisionSearch {
    /// Golden-section search; relies on the objective being unimodal in the
    /// decision volume, which holds for linear or convex costs
    #[default]
    GoldenSection,

    /// Evaluate `samples` evenly spaced decisions, then refine around the best
    /// with golden-section search. Use for non-convex cost curves.
    SampledGoldenSection { samples: usize },
}

/// Configuration for an intrinsic valuation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// Inventory levels per period grid (at least 2)
    pub num_inventory_grid_points: usize,

    /// Target width of the decision search bracket
    pub numerical_tolerance: f64,

    /// Iteration budget per decision search before failing
    pub max_search_iterations: usize,

    /// Decision search algorithm
    pub search: DecisionSearch,

    /// Evaluate the grid points of a period on the rayon pool
    pub parallel: bool,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            num_inventory_grid_points: 100,
            numerical_tolerance: 1e-12,
            max_search_iterations: 500,
            search: DecisionSearch::GoldenSection,
            parallel: true,
        }
    }
}

impl ValuationConfig {
    /// Coarse grid for quick indications
    pub fn quick() -> Self {
        Self {
            num_inventory_grid_points: 25,
            numerical_tolerance: 1e-8,
            ..Default::default()
        }
    }

    /// Fine grid for final numbers
    pub fn precise() -> Self {
        Self {
            num_inventory_grid_points: 500,
            ..Default::default()
        }
    }

    /// Set the inventory grid size
    pub fn with_grid_points(mut self, points: usize) -> Self {
        self.num_inventory_grid_points = points;
        self
    }

    /// Set the decision search tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.numerical_tolerance = tolerance;
        self
    }

    /// Select the decision search algorithm
    pub fn with_search(mut self, search: DecisionSearch) -> Self {
        self.search = search;
        self
    }

    /// Evaluate grid points on the calling thread
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.num_inventory_grid_points < 2 {
            return Err(ValuationError::invalid(format!(
                "num_inventory_grid_points must be at least 2, got {}",
                self.num_inventory_grid_points
            )));
        }
        if !(self.numerical_tolerance > 0.0) {
            return Err(ValuationError::invalid(format!(
                "numerical_tolerance must be positive, got {}",
                self.numerical_tolerance
            )));
        }
        if self.max_search_iterations == 0 {
            return Err(ValuationError::invalid("max_search_iterations must be positive"));
        }
        if let DecisionSearch::SampledGoldenSection { samples } = self.search {
            if samples < 3 {
                return Err(ValuationError::invalid(format!(
                    "sampled search needs at least 3 samples, got {}",
                    samples
                )));
            }
        }
        Ok(())
    }
}
