//! Backward induction and forward replay for intrinsic storage value

use chrono::NaiveDate;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::config::ValuationConfig;
use super::grid::inventory_grid;
use super::interp::ValueFunction;
use super::optimizer::{DecisionOptimizer, PeriodContext};
use super::results::{ProfileRow, ValuationResult};
use super::space::inventory_space;
use crate::calendar::Period;
use crate::curves::{ForwardCurve, InterestRateCurve};
use crate::error::{Result, ValuationError};
use crate::storage::{InventoryRange, Storage};

/// Intrinsic valuation engine
///
/// Holds only settings; every call to [`valuate`](Self::valuate) builds its
/// grids and value functions from scratch.
#[derive(Debug, Clone, Default)]
pub struct IntrinsicValuation {
    config: ValuationConfig,
    cancel: Option<Arc<AtomicBool>>,
}

/// Inputs resolved before induction starts
struct Horizon {
    first: Period,
    prices: Vec<f64>,
    /// One per decision period plus the terminal period
    discount_factors: Vec<f64>,
}

impl IntrinsicValuation {
    /// Engine running with `config`
    pub fn new(config: ValuationConfig) -> Self {
        Self { config, cancel: None }
    }

    /// Check `flag` between periods and stop with `Cancelled` once it is set
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Settings this engine runs with
    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Value `storage` holding `starting_inventory` on `valuation_date`
    pub fn valuate<S, F>(
        &self,
        storage: &S,
        valuation_date: NaiveDate,
        starting_inventory: f64,
        forward_curve: &ForwardCurve,
        interest_rates: &InterestRateCurve,
        settlement_rule: F,
    ) -> Result<ValuationResult>
    where
        S: Storage + ?Sized,
        F: Fn(Period) -> NaiveDate,
    {
        self.config.validate()?;
        if storage.frequency() != forward_curve.frequency() {
            return Err(ValuationError::ConfigurationMismatch {
                storage: storage.frequency(),
                forward_curve: forward_curve.frequency(),
            });
        }
        if !starting_inventory.is_finite() {
            return Err(ValuationError::invalid(format!(
                "starting inventory must be finite, got {}",
                starting_inventory
            )));
        }

        let current = Period::containing(storage.frequency(), valuation_date);
        let first = current.max(storage.start());
        let end = storage.end();
        if first >= end {
            log::info!("Storage ended at {} on or before valuation period {}", end, current);
            return Ok(ValuationResult::expired(valuation_date, starting_inventory));
        }

        let horizon = self.resolve_horizon(storage, first, valuation_date, forward_curve, interest_rates, &settlement_rule)?;
        let space = inventory_space(storage, first, starting_inventory)?;
        if space.iter().flatten().all(|range| range.width() <= 0.0) {
            log::warn!("Inventory path from {} is fully determined; storage has no optionality", first);
        }

        log::info!(
            "Valuing storage {} to {} from inventory {} with {} grid points",
            first,
            end,
            starting_inventory,
            self.config.num_inventory_grid_points
        );

        let optimizer = DecisionOptimizer::from_config(&self.config);
        let value_functions = self.backward_induction(storage, &horizon, &space, &optimizer)?;
        let result = self.forward_replay(storage, &horizon, valuation_date, starting_inventory, &value_functions, &optimizer, space)?;

        log::info!(
            "NPV {:.6} (backward induction estimate {:.6}), terminal inventory {}",
            result.npv,
            value_functions[0].value_at(starting_inventory),
            result.terminal_inventory
        );
        Ok(result)
    }

    /// Prices and settlement discount factors for every period in range
    fn resolve_horizon<S, F>(
        &self,
        storage: &S,
        first: Period,
        valuation_date: NaiveDate,
        forward_curve: &ForwardCurve,
        interest_rates: &InterestRateCurve,
        settlement_rule: &F,
    ) -> Result<Horizon>
    where
        S: Storage + ?Sized,
        F: Fn(Period) -> NaiveDate,
    {
        let end = storage.end();
        let prices = first
            .range_to(end)
            .map(|p| forward_curve.price(p))
            .collect::<Result<Vec<_>>>()?;

        let discount_factors = first
            .range_to(end.next())
            .map(|p| {
                let settlement_date = settlement_rule(p);
                if settlement_date < p.start_date() {
                    return Err(ValuationError::invalid_at(
                        format!("settlement date {} precedes the delivery period", settlement_date),
                        p,
                        None,
                    ));
                }
                interest_rates.discount_factor(valuation_date, settlement_date)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Horizon {
            first,
            prices,
            discount_factors,
        })
    }

    fn check_cancelled(&self, period: Period) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(ValuationError::Cancelled { period }),
            _ => Ok(()),
        }
    }

    /// Sample `value` on a grid over each interval of one period's space
    fn sample<F>(&self, space: &[InventoryRange], value: F) -> Result<ValueFunction>
    where
        F: Fn(f64) -> Result<f64> + Sync,
    {
        let grid_points = self.config.num_inventory_grid_points;
        let segments = space
            .iter()
            .map(|range| {
                let grid = inventory_grid(range.min, range.max, grid_points)?;
                let values = if self.config.parallel {
                    grid.par_iter().map(|&v| value(v)).collect::<Result<Vec<_>>>()?
                } else {
                    grid.iter().map(|&v| value(v)).collect::<Result<Vec<_>>>()?
                };
                Ok((grid, values))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ValueFunction::from_segments(segments))
    }

    /// Value functions for every period from `first` to the terminal period
    fn backward_induction<S: Storage + ?Sized>(
        &self,
        storage: &S,
        horizon: &Horizon,
        space: &[Vec<InventoryRange>],
        optimizer: &DecisionOptimizer,
    ) -> Result<Vec<ValueFunction>> {
        let num_periods = horizon.prices.len();
        let terminal_df = horizon.discount_factors[num_periods];

        // built back to front, reversed at the end
        let mut value_functions = Vec::with_capacity(num_periods + 1);
        value_functions.push(self.sample(&space[num_periods], |v| Ok(terminal_df * storage.terminal_value(v)))?);

        for i in (0..num_periods).rev() {
            let period = horizon.first.offset(i as i64);
            self.check_cancelled(period)?;

            let next_values = value_functions.last().ok_or_else(|| ValuationError::invalid("missing terminal value function"))?;
            let ctx = PeriodContext {
                storage,
                period,
                price: horizon.prices[i],
                discount_factor: horizon.discount_factors[i],
                next_values,
            };
            let values = self.sample(&space[i], |v| optimizer.optimize(&ctx, v).map(|d| d.value))?;

            log::debug!(
                "{}: {} interval(s) over [{}, {}], value [{:.6}, {:.6}]",
                period,
                space[i].len(),
                values.min_inventory(),
                values.max_inventory(),
                values.value_at(values.min_inventory()),
                values.value_at(values.max_inventory())
            );
            value_functions.push(values);
        }

        value_functions.reverse();
        Ok(value_functions)
    }

    /// Re-derive decisions along the realised inventory path
    #[allow(clippy::too_many_arguments)]
    fn forward_replay<S: Storage + ?Sized>(
        &self,
        storage: &S,
        horizon: &Horizon,
        valuation_date: NaiveDate,
        starting_inventory: f64,
        value_functions: &[ValueFunction],
        optimizer: &DecisionOptimizer,
        inventory_space: Vec<Vec<InventoryRange>>,
    ) -> Result<ValuationResult> {
        let num_periods = horizon.prices.len();
        let mut inventory = starting_inventory;
        let mut npv = 0.0;
        let mut profile = Vec::with_capacity(num_periods);

        for i in 0..num_periods {
            let period = horizon.first.offset(i as i64);
            let ctx = PeriodContext {
                storage,
                period,
                price: horizon.prices[i],
                discount_factor: horizon.discount_factors[i],
                next_values: &value_functions[i + 1],
            };
            let decision = optimizer.optimize(&ctx, inventory)?;

            npv += ctx.discount_factor * decision.cash_flow;
            profile.push(ProfileRow {
                period,
                inventory,
                inject_withdraw_volume: decision.inject_withdraw,
                cmdty_consumed: decision.cmdty_consumed,
                inventory_loss: decision.inventory_loss,
                net_position: decision.net_position,
                cash_flow: decision.cash_flow,
                discount_factor: ctx.discount_factor,
            });
            inventory = decision.next_inventory;
        }

        let terminal_value_pv = horizon.discount_factors[num_periods] * storage.terminal_value(inventory);
        npv += terminal_value_pv;

        Ok(ValuationResult {
            valuation_date,
            npv,
            profile,
            terminal_inventory: inventory,
            terminal_value_pv,
            inventory_space,
        })
    }
}

/// Value a storage with default settings
pub fn valuate<S, F>(
    storage: &S,
    valuation_date: NaiveDate,
    starting_inventory: f64,
    forward_curve: &ForwardCurve,
    interest_rates: &InterestRateCurve,
    settlement_rule: F,
) -> Result<ValuationResult>
where
    S: Storage + ?Sized,
    F: Fn(Period) -> NaiveDate,
{
    IntrinsicValuation::default().valuate(
        storage,
        valuation_date,
        starting_inventory,
        forward_curve,
        interest_rates,
        settlement_rule,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{Frequency, SettlementRule};
    use crate::storage::{RateRatchet, SimpleStorage, TerminalValue};
    use crate::valuation::config::DecisionSearch;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn apr_2025() -> Period {
        Period::containing(Frequency::Month, date(2025, 4, 1))
    }

    fn zero_rates() -> InterestRateCurve {
        InterestRateCurve::flat(date(2025, 1, 1), date(2027, 12, 31), 0.0)
    }

    fn period_start(p: Period) -> NaiveDate {
        SettlementRule::PeriodStart.settlement_date(p)
    }

    /// Summer-cheap, winter-dear monthly curve from April
    fn seasonal_curve() -> ForwardCurve {
        ForwardCurve::new(
            apr_2025(),
            vec![10.0, 9.5, 9.0, 9.2, 9.8, 10.5, 11.5, 12.5, 13.0, 12.8, 11.6, 10.4],
        )
    }

    fn seasonal_storage() -> SimpleStorage {
        SimpleStorage::new(apr_2025(), apr_2025().offset(12), 0.0, 100.0, 20.0, 25.0).must_end_empty()
    }

    fn assert_profile_feasible(storage: &SimpleStorage, result: &ValuationResult) {
        for (i, row) in result.profile.iter().enumerate() {
            let bounds = storage.inventory_range(row.period);
            assert!(bounds.contains(row.inventory, 1e-8), "inventory {} out of bounds at {}", row.inventory, row.period);
            let rates = storage.inject_withdraw_range(row.period, row.inventory);
            assert!(
                row.inject_withdraw_volume >= rates.min - 1e-6 && row.inject_withdraw_volume <= rates.max + 1e-6,
                "volume {} outside [{}, {}] at {}",
                row.inject_withdraw_volume,
                rates.min,
                rates.max,
                row.period
            );
            let next = result.profile.get(i + 1).map(|r| r.inventory).unwrap_or(result.terminal_inventory);
            assert_relative_eq!(
                next,
                row.inventory + row.inject_withdraw_volume - row.inventory_loss,
                epsilon = 1e-9
            );
        }
        assert!(storage.inventory_range(storage.end()).contains(result.terminal_inventory, 1e-8));
    }

    #[test]
    fn test_flat_costless_curve_has_no_value() {
        let storage = SimpleStorage::new(apr_2025(), apr_2025().offset(3), 0.0, 100.0, 10.0, 10.0)
            .with_terminal_value(TerminalValue::Linear { value_per_unit: 10.0, reference_inventory: 50.0 });
        let curve = ForwardCurve::flat(apr_2025(), 3, 10.0);

        let result = valuate(&storage, date(2025, 4, 1), 50.0, &curve, &zero_rates(), period_start).unwrap();

        assert_relative_eq!(result.npv, 0.0, epsilon = 1e-9);
        let inventories: Vec<f64> = result.profile.iter().map(|r| r.inventory).collect();
        assert_eq!(inventories.len(), 3);
        for v in inventories {
            assert_relative_eq!(v, 50.0, epsilon = 1e-9);
        }
        assert!(result.profile.iter().all(|r| r.inject_withdraw_volume == 0.0));
    }

    #[test]
    fn test_worthless_leftover_is_sold_down() {
        let storage = SimpleStorage::new(apr_2025(), apr_2025().offset(3), 0.0, 100.0, 10.0, 10.0);
        let curve = ForwardCurve::flat(apr_2025(), 3, 10.0);

        let result = valuate(&storage, date(2025, 4, 1), 50.0, &curve, &zero_rates(), period_start).unwrap();

        assert_relative_eq!(result.npv, 300.0, epsilon = 1e-8);
        assert_relative_eq!(result.terminal_inventory, 20.0, epsilon = 1e-8);
        assert_profile_feasible(&storage, &result);
    }

    #[test]
    fn test_two_period_spread() {
        let storage = SimpleStorage::new(apr_2025(), apr_2025().offset(2), 0.0, 100.0, 10.0, 10.0);
        let curve = ForwardCurve::new(apr_2025(), vec![10.0, 20.0]);

        let result = valuate(&storage, date(2025, 4, 1), 0.0, &curve, &zero_rates(), period_start).unwrap();

        assert_relative_eq!(result.npv, 100.0, epsilon = 1e-8);
        assert_relative_eq!(result.profile[0].inject_withdraw_volume, 10.0, epsilon = 1e-9);
        assert_relative_eq!(result.profile[1].inject_withdraw_volume, -10.0, epsilon = 1e-9);
        assert_relative_eq!(result.profile[1].net_position, 10.0, epsilon = 1e-9);
        assert_relative_eq!(result.terminal_inventory, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_throughput_has_zero_value() {
        let storage = SimpleStorage::new(apr_2025(), apr_2025().offset(12), 0.0, 100.0, 0.0, 0.0);
        for curve in [seasonal_curve(), seasonal_curve().scaled(-1.0), ForwardCurve::flat(apr_2025(), 12, 7.0)] {
            let result = valuate(&storage, date(2025, 4, 1), 50.0, &curve, &zero_rates(), period_start).unwrap();
            assert_eq!(result.npv, 0.0);
            assert_eq!(result.profile.len(), 12);
            assert!(result.profile.iter().all(|r| r.inject_withdraw_volume == 0.0 && r.cash_flow == 0.0));
        }
    }

    #[test]
    fn test_fixed_settlement_date_discounts_uniformly() {
        let storage = SimpleStorage::new(apr_2025(), apr_2025().offset(2), 0.0, 100.0, 10.0, 10.0);
        let curve = ForwardCurve::new(apr_2025(), vec![10.0, 20.0]);
        let rate = 0.05;
        let rates = InterestRateCurve::flat(date(2025, 1, 1), date(2026, 12, 31), rate);
        let settle = date(2025, 12, 31);
        let valuation_date = date(2025, 4, 1);

        let result = valuate(&storage, valuation_date, 0.0, &curve, &rates, |_| settle).unwrap();

        let df = (-rate * (settle - valuation_date).num_days() as f64 / 365.0).exp();
        assert!(result.profile.iter().all(|r| (r.discount_factor - df).abs() < 1e-14));
        assert_relative_eq!(result.npv, 100.0 * df, epsilon = 1e-8);
    }

    #[test]
    fn test_higher_prices_never_lower_value() {
        let storage = seasonal_storage();
        let base = valuate(&storage, date(2025, 4, 1), 0.0, &seasonal_curve(), &zero_rates(), period_start).unwrap();
        let scaled =
            valuate(&storage, date(2025, 4, 1), 0.0, &seasonal_curve().scaled(1.5), &zero_rates(), period_start)
                .unwrap();
        assert!(base.npv > 0.0);
        assert!(scaled.npv >= base.npv);
    }

    #[test]
    fn test_grid_refinement_converges() {
        let storage = seasonal_storage();
        let npv = |points: usize| {
            IntrinsicValuation::new(ValuationConfig::default().with_grid_points(points))
                .valuate(&storage, date(2025, 4, 1), 0.0, &seasonal_curve(), &zero_rates(), period_start)
                .unwrap()
                .npv
        };
        let coarse = npv(50);
        let fine = npv(500);
        assert!(fine > 0.0);
        assert!((coarse - fine).abs() <= 1e-3 * fine, "coarse {} fine {}", coarse, fine);
    }

    #[test]
    fn test_long_daily_horizon_must_end_empty() {
        let start = Period::containing(Frequency::Day, date(2025, 4, 1));
        for days in [120, 365] {
            let storage = SimpleStorage::new(start, start.offset(days), 0.0, 100.0, 1.0, 1.5).must_end_empty();
            let curve = ForwardCurve::new(
                start,
                (0..days).map(|i| 10.0 + 2.0 * (i as f64 * std::f64::consts::TAU / 60.0).sin()).collect(),
            );

            let result = valuate(&storage, date(2025, 4, 1), 0.0, &curve, &zero_rates(), period_start).unwrap();

            assert_eq!(result.profile.len(), days as usize);
            assert!(result.npv > 0.0);
            assert_relative_eq!(result.terminal_inventory, 0.0, epsilon = 1e-8);
            assert_profile_feasible(&storage, &result);
        }
    }

    #[test]
    fn test_ratcheted_storage_valuation() {
        let storage = SimpleStorage::new(apr_2025(), apr_2025().offset(12), 0.0, 100.0, 30.0, 30.0)
            .with_ratchets(vec![
                RateRatchet { inventory: 0.0, max_injection_rate: 30.0, max_withdrawal_rate: 8.0 },
                RateRatchet { inventory: 50.0, max_injection_rate: 5.0, max_withdrawal_rate: 30.0 },
            ])
            .must_end_empty();

        for search in [DecisionSearch::GoldenSection, DecisionSearch::SampledGoldenSection { samples: 201 }] {
            let result = IntrinsicValuation::new(ValuationConfig::default().with_search(search))
                .valuate(&storage, date(2025, 4, 1), 0.0, &seasonal_curve(), &zero_rates(), period_start)
                .unwrap();
            assert_eq!(result.profile.len(), 12);
            assert!(result.inventory_space.iter().any(|intervals| intervals.len() > 1));
            assert!(result.npv > 0.0);
            assert_relative_eq!(result.terminal_inventory, 0.0, epsilon = 1e-8);
            assert_profile_feasible(&storage, &result);
        }
    }

    #[test]
    fn test_profile_respects_bounds_with_losses_and_fuel() {
        let storage = seasonal_storage()
            .with_costs(0.02, 0.01)
            .with_fuel(0.01, 0.005)
            .with_inventory_loss(0.002);
        let rates = InterestRateCurve::flat(date(2025, 1, 1), date(2026, 12, 31), 0.03);
        let result = valuate(&storage, date(2025, 4, 1), 0.0, &seasonal_curve(), &rates, period_start).unwrap();

        assert_eq!(result.profile.len(), 12);
        assert_profile_feasible(&storage, &result);
        let pv: f64 = result.profile.iter().map(|r| r.pv_cash_flow()).sum::<f64>() + result.terminal_value_pv;
        assert_relative_eq!(pv, result.npv, epsilon = 1e-9);
        for row in &result.profile {
            assert_relative_eq!(row.net_position, -row.inject_withdraw_volume - row.cmdty_consumed, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let storage = seasonal_storage().with_costs(0.05, 0.05);
        let run = |config: ValuationConfig| {
            IntrinsicValuation::new(config)
                .valuate(&storage, date(2025, 4, 1), 0.0, &seasonal_curve(), &zero_rates(), period_start)
                .unwrap()
        };
        let parallel = run(ValuationConfig::default());
        let sequential = run(ValuationConfig::default().sequential());
        assert_eq!(parallel.npv, sequential.npv);
    }

    #[test]
    fn test_valuation_after_storage_end_is_empty() {
        let storage = SimpleStorage::new(apr_2025(), apr_2025().offset(3), 0.0, 100.0, 10.0, 10.0);
        let curve = ForwardCurve::flat(apr_2025(), 3, 10.0);
        for valuation_date in [date(2025, 7, 1), date(2026, 1, 15)] {
            let result = valuate(&storage, valuation_date, 0.0, &curve, &zero_rates(), period_start).unwrap();
            assert!(result.profile.is_empty());
            assert_eq!(result.npv, 0.0);
        }
    }

    #[test]
    fn test_mid_contract_valuation_starts_at_current_period() {
        let storage = seasonal_storage();
        let result =
            valuate(&storage, date(2025, 10, 15), 60.0, &seasonal_curve(), &zero_rates(), period_start).unwrap();
        assert_eq!(result.profile.len(), 6);
        assert_eq!(result.profile[0].period, apr_2025().offset(6));
        assert_relative_eq!(result.profile[0].inventory, 60.0);
        assert_relative_eq!(result.terminal_inventory, 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_valuation_before_storage_start_begins_at_start() {
        let storage = SimpleStorage::new(apr_2025(), apr_2025().offset(2), 0.0, 100.0, 10.0, 10.0);
        let curve = ForwardCurve::new(apr_2025(), vec![10.0, 20.0]);
        let result = valuate(&storage, date(2025, 1, 10), 0.0, &curve, &zero_rates(), period_start).unwrap();
        assert_eq!(result.profile[0].period, apr_2025());
        assert_relative_eq!(result.npv, 100.0, epsilon = 1e-8);
    }

    #[test]
    fn test_frequency_mismatch() {
        let storage = seasonal_storage();
        let daily = ForwardCurve::flat(Period::containing(Frequency::Day, date(2025, 4, 1)), 400, 10.0);
        let err = valuate(&storage, date(2025, 4, 1), 0.0, &daily, &zero_rates(), period_start).unwrap_err();
        assert!(matches!(
            err,
            ValuationError::ConfigurationMismatch { storage: Frequency::Month, forward_curve: Frequency::Day }
        ));
    }

    #[test]
    fn test_short_forward_curve_names_missing_period() {
        let storage = seasonal_storage();
        let curve = ForwardCurve::flat(apr_2025(), 6, 10.0);
        let err = valuate(&storage, date(2025, 4, 1), 0.0, &curve, &zero_rates(), period_start).unwrap_err();
        match err {
            ValuationError::MissingCurveData { curve, key } => {
                assert_eq!(curve, "forward curve");
                assert_eq!(key, "2025-10");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_interest_rate() {
        let storage = seasonal_storage();
        let rates = InterestRateCurve::flat(date(2025, 1, 1), date(2025, 6, 30), 0.02);
        let err = valuate(&storage, date(2025, 4, 1), 0.0, &seasonal_curve(), &rates, period_start).unwrap_err();
        assert!(matches!(err, ValuationError::MissingCurveData { curve: "interest rate curve", .. }));
    }

    #[test]
    fn test_settlement_before_delivery_rejected() {
        let storage = seasonal_storage();
        let err = valuate(&storage, date(2025, 4, 1), 0.0, &seasonal_curve(), &zero_rates(), |_| date(2025, 4, 1))
            .unwrap_err();
        assert!(matches!(err, ValuationError::InvalidConfiguration { period: Some(_), .. }));
    }

    #[test]
    fn test_invalid_settings_fail_before_computation() {
        let storage = seasonal_storage();
        for config in [
            ValuationConfig::default().with_grid_points(1),
            ValuationConfig::default().with_tolerance(-1.0),
        ] {
            let err = IntrinsicValuation::new(config)
                .valuate(&storage, date(2025, 4, 1), 0.0, &seasonal_curve(), &zero_rates(), period_start)
                .unwrap_err();
            assert!(matches!(err, ValuationError::InvalidConfiguration { .. }));
        }
    }

    #[test]
    fn test_cancellation_between_periods() {
        let flag = Arc::new(AtomicBool::new(true));
        let engine = IntrinsicValuation::default().with_cancellation(flag.clone());
        let err = engine
            .valuate(&seasonal_storage(), date(2025, 4, 1), 0.0, &seasonal_curve(), &zero_rates(), period_start)
            .unwrap_err();
        assert!(matches!(err, ValuationError::Cancelled { .. }));

        flag.store(false, Ordering::Relaxed);
        assert!(engine
            .valuate(&seasonal_storage(), date(2025, 4, 1), 0.0, &seasonal_curve(), &zero_rates(), period_start)
            .is_ok());
    }
}
