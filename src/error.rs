//! Error types for storage valuation
//!
//! Every failure is surfaced whole: the valuation is a deterministic single
//! pass, so nothing is retried or partially recovered.

use thiserror::Error;

use crate::calendar::{Frequency, Period};

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, ValuationError>;

/// Errors raised while validating inputs or running the valuation
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValuationError {
    /// Storage and forward curve use different period granularities
    #[error("storage has {storage} periods but forward curve has {forward_curve} periods")]
    ConfigurationMismatch {
        storage: Frequency,
        forward_curve: Frequency,
    },

    /// A price or rate needed by the valuation is absent
    #[error("{curve} has no data for {key}")]
    MissingCurveData {
        /// Which curve was queried ("forward curve", "interest rate curve")
        curve: &'static str,
        /// The period or date that was missing
        key: String,
    },

    /// Storage constraints or valuation settings are internally inconsistent
    #[error("invalid configuration: {message}{}", location(.period, .inventory))]
    InvalidConfiguration {
        message: String,
        period: Option<Period>,
        inventory: Option<f64>,
    },

    /// Bounded decision search exhausted its iteration budget
    #[error(
        "decision search did not converge at {period} (inventory {inventory}) after {iterations} iterations, bracket width {bracket_width:e}"
    )]
    NumericalNonConvergence {
        period: Period,
        inventory: f64,
        iterations: usize,
        bracket_width: f64,
    },

    /// Valuation was cancelled between periods
    #[error("valuation cancelled before {period} was computed")]
    Cancelled { period: Period },
}

impl ValuationError {
    /// Configuration error without a location
    pub fn invalid(message: impl Into<String>) -> Self {
        ValuationError::InvalidConfiguration {
            message: message.into(),
            period: None,
            inventory: None,
        }
    }

    /// Configuration error pinned to a period and optionally an inventory level
    pub fn invalid_at(message: impl Into<String>, period: Period, inventory: Option<f64>) -> Self {
        ValuationError::InvalidConfiguration {
            message: message.into(),
            period: Some(period),
            inventory,
        }
    }
}

fn location(period: &Option<Period>, inventory: &Option<f64>) -> String {
    match (period, inventory) {
        (Some(p), Some(v)) => format!(" (period {}, inventory {})", p, v),
        (Some(p), None) => format!(" (period {})", p),
        (None, Some(v)) => format!(" (inventory {})", v),
        (None, None) => String::new(),
    }
}
