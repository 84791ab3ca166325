//! Delivery periods as opaque ordinals
//!
//! A `Period` is a frequency tag plus an index counted from 1970-01-01
//! (days, months or quarters). Calendar dates are derived on demand, so
//! periods are `Copy` and can be used freely as keys.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Period granularity shared by a storage and its forward curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Day,
    Month,
    Quarter,
}

impl Frequency {
    /// Parse the short codes used in input files ("D", "M", "Q")
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "D" | "DAY" | "DAILY" => Some(Frequency::Day),
            "M" | "MONTH" | "MONTHLY" => Some(Frequency::Month),
            "Q" | "QUARTER" | "QUARTERLY" => Some(Frequency::Quarter),
            _ => None,
        }
    }

    fn months_per_period(self) -> i64 {
        match self {
            Frequency::Day => 0,
            Frequency::Month => 1,
            Frequency::Quarter => 3,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Day => "daily",
            Frequency::Month => "monthly",
            Frequency::Quarter => "quarterly",
        };
        f.write_str(name)
    }
}

/// A single delivery period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    frequency: Frequency,
    index: i64,
}

const EPOCH_YEAR: i64 = 1970;

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(EPOCH_YEAR as i32, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl Period {
    /// The period of the given frequency that contains `date`
    pub fn containing(frequency: Frequency, date: NaiveDate) -> Self {
        let index = match frequency {
            Frequency::Day => (date - epoch()).num_days(),
            Frequency::Month | Frequency::Quarter => {
                let months = (date.year() as i64 - EPOCH_YEAR) * 12 + date.month0() as i64;
                months.div_euclid(frequency.months_per_period())
            }
        };
        Self { frequency, index }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Ordinal index relative to the 1970 epoch
    pub fn index(&self) -> i64 {
        self.index
    }

    /// The period `n` steps later (or earlier for negative `n`)
    pub fn offset(&self, n: i64) -> Self {
        Self {
            frequency: self.frequency,
            index: self.index + n,
        }
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    /// Number of periods from `other` to `self`
    pub fn periods_since(&self, other: Period) -> i64 {
        self.index - other.index
    }

    /// First calendar day of the period
    ///
    /// Indices outside chrono's representable range saturate.
    pub fn start_date(&self) -> NaiveDate {
        match self.frequency {
            Frequency::Day => epoch()
                .checked_add_signed(Duration::days(self.index))
                .unwrap_or(if self.index < 0 { NaiveDate::MIN } else { NaiveDate::MAX }),
            Frequency::Month | Frequency::Quarter => {
                let months = self.index * self.frequency.months_per_period();
                let year = EPOCH_YEAR + months.div_euclid(12);
                let month = months.rem_euclid(12) as u32 + 1;
                i32::try_from(year)
                    .ok()
                    .and_then(|y| NaiveDate::from_ymd_opt(y, month, 1))
                    .unwrap_or(if year < EPOCH_YEAR { NaiveDate::MIN } else { NaiveDate::MAX })
            }
        }
    }

    /// Last calendar day of the period
    pub fn end_date(&self) -> NaiveDate {
        self.next().start_date().pred_opt().unwrap_or(NaiveDate::MIN)
    }

    /// Iterate `[self, end)` in order
    pub fn range_to(self, end: Period) -> impl Iterator<Item = Period> {
        let frequency = self.frequency;
        (self.index..end.index.max(self.index)).map(move |index| Period { frequency, index })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.start_date();
        match self.frequency {
            Frequency::Day => write!(f, "{}", start.format("%Y-%m-%d")),
            Frequency::Month => write!(f, "{}", start.format("%Y-%m")),
            Frequency::Quarter => write!(f, "{}-Q{}", start.year(), start.month0() / 3 + 1),
        }
    }
}
