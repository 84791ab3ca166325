//! Valuation output structures

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::calendar::Period;
use crate::storage::InventoryRange;

/// One period of the optimal operating profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub period: Period,

    /// Inventory at the start of the period, before the decision
    pub inventory: f64,

    /// Signed volume: positive injected, negative withdrawn
    pub inject_withdraw_volume: f64,

    /// Commodity burnt as fuel, bought in the market
    pub cmdty_consumed: f64,

    /// Inventory physically lost over the period
    pub inventory_loss: f64,

    /// Market position: positive sold, negative bought
    pub net_position: f64,

    /// Undiscounted cash flow
    pub cash_flow: f64,

    /// Discount factor of the period's settlement date
    pub discount_factor: f64,
}

impl ProfileRow {
    pub fn pv_cash_flow(&self) -> f64 {
        self.cash_flow * self.discount_factor
    }

    /// Inventory carried into the next period
    pub fn closing_inventory(&self) -> f64 {
        self.inventory + self.inject_withdraw_volume - self.inventory_loss
    }
}

/// Complete valuation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResult {
    pub valuation_date: NaiveDate,

    /// Discounted cash flows plus discounted terminal value
    pub npv: f64,

    /// One row per decision period
    pub profile: Vec<ProfileRow>,

    /// Inventory held at the storage end
    pub terminal_inventory: f64,

    /// Discounted value of the terminal inventory (included in `npv`)
    pub terminal_value_pv: f64,

    /// Feasible inventory intervals per period, terminal period last
    pub inventory_space: Vec<Vec<InventoryRange>>,
}

impl ValuationResult {
    /// Result for a storage whose contract has already ended
    pub fn expired(valuation_date: NaiveDate, inventory: f64) -> Self {
        Self {
            valuation_date,
            npv: 0.0,
            profile: Vec::new(),
            terminal_inventory: inventory,
            terminal_value_pv: 0.0,
            inventory_space: Vec::new(),
        }
    }

    /// Get summary statistics
    pub fn summary(&self) -> ValuationSummary {
        let total_injected: f64 = self.profile.iter().map(|r| r.inject_withdraw_volume.max(0.0)).sum();
        let total_withdrawn: f64 = self.profile.iter().map(|r| (-r.inject_withdraw_volume).max(0.0)).sum();
        let total_cmdty_consumed: f64 = self.profile.iter().map(|r| r.cmdty_consumed).sum();
        let total_inventory_loss: f64 = self.profile.iter().map(|r| r.inventory_loss).sum();
        let undiscounted_cash_flow: f64 = self.profile.iter().map(|r| r.cash_flow).sum();
        let max_inventory = self
            .profile
            .iter()
            .map(|r| r.inventory)
            .chain(std::iter::once(self.terminal_inventory))
            .fold(f64::NEG_INFINITY, f64::max);

        ValuationSummary {
            num_periods: self.profile.len(),
            npv: self.npv,
            total_injected,
            total_withdrawn,
            total_cmdty_consumed,
            total_inventory_loss,
            undiscounted_cash_flow,
            max_inventory,
            terminal_inventory: self.terminal_inventory,
        }
    }

    /// Write the profile as CSV
    pub fn write_profile_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record([
            "period",
            "inventory",
            "inject_withdraw_volume",
            "cmdty_consumed",
            "inventory_loss",
            "net_position",
            "cash_flow",
            "discount_factor",
        ])?;
        for row in &self.profile {
            csv.write_record([
                row.period.to_string(),
                format!("{:.8}", row.inventory),
                format!("{:.8}", row.inject_withdraw_volume),
                format!("{:.8}", row.cmdty_consumed),
                format!("{:.8}", row.inventory_loss),
                format!("{:.8}", row.net_position),
                format!("{:.8}", row.cash_flow),
                format!("{:.10}", row.discount_factor),
            ])?;
        }
        csv.flush()?;
        Ok(())
    }
}

/// Summary statistics for a valuation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationSummary {
    pub num_periods: usize,
    pub npv: f64,
    pub total_injected: f64,
    pub total_withdrawn: f64,
    pub total_cmdty_consumed: f64,
    pub total_inventory_loss: f64,
    pub undiscounted_cash_flow: f64,
    pub max_inventory: f64,
    pub terminal_inventory: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Frequency;

    fn row(period: Period, inventory: f64, volume: f64, cash_flow: f64) -> ProfileRow {
        ProfileRow {
            period,
            inventory,
            inject_withdraw_volume: volume,
            cmdty_consumed: 0.0,
            inventory_loss: 0.0,
            net_position: -volume,
            cash_flow,
            discount_factor: 0.5,
        }
    }

    fn result() -> ValuationResult {
        let p = Period::containing(Frequency::Month, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        ValuationResult {
            valuation_date: p.start_date(),
            npv: 50.0,
            profile: vec![row(p, 0.0, 10.0, -100.0), row(p.next(), 10.0, -10.0, 200.0)],
            terminal_inventory: 0.0,
            terminal_value_pv: 0.0,
            inventory_space: Vec::new(),
        }
    }

    #[test]
    fn test_summary_totals() {
        let summary = result().summary();
        assert_eq!(summary.num_periods, 2);
        assert_eq!(summary.total_injected, 10.0);
        assert_eq!(summary.total_withdrawn, 10.0);
        assert_eq!(summary.undiscounted_cash_flow, 100.0);
        assert_eq!(summary.max_inventory, 10.0);
    }

    #[test]
    fn test_profile_csv() {
        let mut buffer = Vec::new();
        result().write_profile_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("period,inventory"));
        assert!(lines[1].starts_with("2025-01,0.00000000,10.00000000"));
    }

    #[test]
    fn test_row_helpers() {
        let r = result();
        assert_eq!(r.profile[0].pv_cash_flow(), -50.0);
        assert_eq!(r.profile[0].closing_inventory(), 10.0);
    }

    #[test]
    fn test_expired_result_is_empty() {
        let r = ValuationResult::expired(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(), 25.0);
        assert!(r.profile.is_empty());
        assert_eq!(r.npv, 0.0);
        assert_eq!(r.summary().max_inventory, 25.0);
    }
}
