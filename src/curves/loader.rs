//! CSV-based curve loader
//!
//! Forward curves: `period,price` rows where `period` is any date inside the
//! delivery period. Interest rates: `date,rate` rows.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::{ForwardCurve, InterestRateCurve};
use crate::calendar::{Frequency, Period};

/// Default location of the bundled sample inputs
pub const DEFAULT_SAMPLE_PATH: &str = "data/sample";

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").with_context(|| format!("invalid date '{}'", text))
}

/// Load a forward curve from any reader
pub fn load_forward_curve_from_reader<R: Read>(reader: R, frequency: Frequency) -> Result<ForwardCurve> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut start: Option<Period> = None;
    let mut prices = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let period = Period::containing(frequency, parse_date(&record[0])?);
        let price: f64 = record[1]
            .trim()
            .parse()
            .with_context(|| format!("invalid price on row {}", row + 1))?;

        match start {
            None => start = Some(period),
            Some(first) => {
                let expected = first.offset(prices.len() as i64);
                if period != expected {
                    bail!("forward curve is not contiguous: expected {} but found {}", expected, period);
                }
            }
        }
        prices.push(price);
    }

    match start {
        Some(first) => Ok(ForwardCurve::new(first, prices)),
        None => bail!("forward curve file contains no prices"),
    }
}

/// Load a forward curve CSV file
pub fn load_forward_curve(path: &Path, frequency: Frequency) -> Result<ForwardCurve> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    load_forward_curve_from_reader(file, frequency)
}

/// Load interest rates from any reader
pub fn load_interest_rates_from_reader<R: Read>(reader: R) -> Result<InterestRateCurve> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut points = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let date = parse_date(&record[0])?;
        let rate: f64 = record[1]
            .trim()
            .parse()
            .with_context(|| format!("invalid rate on row {}", row + 1))?;
        points.push((date, rate));
    }

    Ok(InterestRateCurve::from_points(points))
}

/// Load an interest rate CSV file
pub fn load_interest_rates(path: &Path) -> Result<InterestRateCurve> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    load_interest_rates_from_reader(file)
}
