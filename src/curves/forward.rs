//! Forward price curve indexed by delivery period

use serde::{Deserialize, Serialize};

use crate::calendar::{Frequency, Period};
use crate::error::{Result, ValuationError};

/// Contiguous forward prices starting at `start`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardCurve {
    start: Period,
    prices: Vec<f64>,
}

impl ForwardCurve {
    /// Curve from consecutive prices starting at `start`
    pub fn new(start: Period, prices: Vec<f64>) -> Self {
        Self { start, prices }
    }

    /// Same price for `num_periods` periods from `start`
    pub fn flat(start: Period, num_periods: usize, price: f64) -> Self {
        Self::new(start, vec![price; num_periods])
    }

    /// Period frequency of the curve
    pub fn frequency(&self) -> Frequency {
        self.start.frequency()
    }

    /// First covered period
    pub fn start(&self) -> Period {
        self.start
    }

    /// One past the last covered period
    pub fn end(&self) -> Period {
        self.start.offset(self.prices.len() as i64)
    }

    /// Number of covered periods
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// True when the curve covers no periods
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Raw prices in period order
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Price for a period, if covered and finite
    pub fn get(&self, period: Period) -> Option<f64> {
        if period.frequency() != self.frequency() {
            return None;
        }
        let offset = period.periods_since(self.start);
        if offset < 0 {
            return None;
        }
        self.prices.get(offset as usize).copied().filter(|p| p.is_finite())
    }

    /// Price for a period, or `MissingCurveData` naming the period
    pub fn price(&self, period: Period) -> Result<f64> {
        self.get(period).ok_or_else(|| ValuationError::MissingCurveData {
            curve: "forward curve",
            key: period.to_string(),
        })
    }

    /// Curve with every price multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.start, self.prices.iter().map(|p| p * factor).collect())
    }

    /// Curve with `shift` added to every price
    pub fn shifted(&self, shift: f64) -> Self {
        Self::new(self.start, self.prices.iter().map(|p| p + shift).collect())
    }
}
