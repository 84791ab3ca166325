//! Settlement rules mapping delivery periods to cash settlement dates

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Period;

/// Common commodity settlement conventions
///
/// Any `Fn(Period) -> NaiveDate` can be passed to the valuation; this enum
/// covers the rules that need to be configurable from input files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SettlementRule {
    /// Cash settles on the first day of the delivery period
    #[default]
    PeriodStart,

    /// Every period settles on the same date
    FixedDate { date: NaiveDate },

    /// Settles on a given day of the month following the end of delivery
    /// (day is capped at the month's length)
    FollowingMonth { day: u32 },

    /// Settles a number of calendar days after the last day of delivery
    DaysAfterPeriodEnd { days: u32 },
}

impl SettlementRule {
    /// Date on which cash for `period` settles
    pub fn settlement_date(&self, period: Period) -> NaiveDate {
        match *self {
            SettlementRule::PeriodStart => period.start_date(),
            SettlementRule::FixedDate { date } => date,
            SettlementRule::FollowingMonth { day } => {
                let end = period.end_date();
                let first_of_next = end
                    .with_day(1)
                    .and_then(|d| d.checked_add_months(chrono::Months::new(1)))
                    .unwrap_or(end);
                let last_of_next = first_of_next
                    .checked_add_months(chrono::Months::new(1))
                    .and_then(|d| d.pred_opt())
                    .unwrap_or(first_of_next);
                first_of_next
                    .with_day(day.clamp(1, last_of_next.day()))
                    .unwrap_or(last_of_next)
            }
            SettlementRule::DaysAfterPeriodEnd { days } => period.end_date() + Duration::days(days as i64),
        }
    }

    /// Parse CLI shorthand: `period-start`, `fixed:2025-12-31`,
    /// `following-month:20`, `days-after:5`
    pub fn parse(text: &str) -> Option<Self> {
        let (name, arg) = match text.split_once(':') {
            Some((n, a)) => (n.trim(), Some(a.trim())),
            None => (text.trim(), None),
        };
        match (name, arg) {
            ("period-start", None) => Some(SettlementRule::PeriodStart),
            ("fixed", Some(a)) => NaiveDate::parse_from_str(a, "%Y-%m-%d")
                .ok()
                .map(|date| SettlementRule::FixedDate { date }),
            ("following-month", Some(a)) => a.parse().ok().map(|day| SettlementRule::FollowingMonth { day }),
            ("days-after", Some(a)) => a.parse().ok().map(|days| SettlementRule::DaysAfterPeriodEnd { days }),
            _ => None,
        }
    }
}
