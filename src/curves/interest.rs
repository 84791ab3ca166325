//! Interest rate curve and discount factors
//!
//! Rates are annualised, continuously compounded, Act/365:
//! `df = exp(-r(settle) * days(settle - valuation) / 365)`

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, ValuationError};

const DAYS_PER_YEAR: f64 = 365.0;

/// Daily interest rate curve keyed by date
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterestRateCurve {
    /// Annual continuously compounded rate applying to cash settled on the date
    rates: BTreeMap<NaiveDate, f64>,
}

impl InterestRateCurve {
    /// Create a curve from explicit (date, rate) points
    pub fn from_points(points: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        Self {
            rates: points.into_iter().collect(),
        }
    }

    /// Same rate for every day in `[from, to]` inclusive
    pub fn flat(from: NaiveDate, to: NaiveDate, annual_rate: f64) -> Self {
        Self::from_points(from.iter_days().take_while(|d| *d <= to).map(|d| (d, annual_rate)))
    }

    /// Rate for `date`, if present and finite
    pub fn rate(&self, date: NaiveDate) -> Option<f64> {
        self.rates.get(&date).copied().filter(|r| r.is_finite())
    }

    /// Number of dated rates
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// True when no rates are loaded
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Discount factor from `settlement_date` back to `valuation_date`
    ///
    /// Cash settled on or before the valuation date is not discounted and
    /// needs no rate.
    pub fn discount_factor(&self, valuation_date: NaiveDate, settlement_date: NaiveDate) -> Result<f64> {
        if settlement_date <= valuation_date {
            return Ok(1.0);
        }
        let rate = self.rate(settlement_date).ok_or_else(|| ValuationError::MissingCurveData {
            curve: "interest rate curve",
            key: settlement_date.format("%Y-%m-%d").to_string(),
        })?;
        let years = (settlement_date - valuation_date).num_days() as f64 / DAYS_PER_YEAR;
        Ok((-rate * years).exp())
    }
}
